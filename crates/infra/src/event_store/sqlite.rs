//! SQLite-backed event store implementation.
//!
//! Two tables: `user(id, name)` and `counter(id, user_id, timestamp)`, where
//! `counter.user_id` references `user.id`. Foreign keys are switched on for
//! every pooled connection, so the referential invariant is enforced by SQLite
//! rather than by application code.
//!
//! ## Timestamps
//!
//! Timestamps are stored as UTC text in the `CURRENT_TIMESTAMP` layout
//! (`YYYY-MM-DD HH:MM:SS`, optionally followed by a fractional part). Rows
//! written by the column default and rows written by this module therefore
//! order and compare correctly as plain strings.
//!
//! ## Error Mapping
//!
//! | SQLx Error | EventStoreError |
//! |------------|-----------------|
//! | Database (foreign key violation) on insert | `UnknownUser` |
//! | Anything else | `Storage` |

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::instrument;

use tally_core::{Elapsed, User, UserId};

use super::r#trait::{EventStore, EventStoreError, StoredEvent, UserEventCount};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// SQLite-backed append-only event store.
///
/// Cheap to clone: clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    /// Wrap an existing pool. The pool's connections must have foreign keys
    /// enabled for unknown users to be rejected.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url`.
    #[instrument(skip_all, fields(database_url = %database_url), err)]
    pub async fn connect(database_url: &str) -> Result<Self, EventStoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| map_sqlx_error("connect", e))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        Ok(Self::new(pool))
    }

    /// Private in-memory database.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// pinned to a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self, EventStoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| map_sqlx_error("connect", e))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the tables if they do not exist yet. Safe to run on every start.
    #[instrument(skip(self), err)]
    pub async fn create_schema(&self) -> Result<(), EventStoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS user (
                id   INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS counter (
                id        INTEGER PRIMARY KEY,
                user_id   INTEGER REFERENCES user (id),
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            "CREATE INDEX IF NOT EXISTS counter_timestamp ON counter (timestamp)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("create_schema", e))?;
        }

        Ok(())
    }

    async fn count(
        &self,
        operation: &'static str,
        since: Option<DateTime<Utc>>,
    ) -> Result<u64, EventStoreError> {
        let count = match since {
            Some(since) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM counter WHERE timestamp > ?1")
                    .bind(format_timestamp(since))
                    .fetch_one(&self.pool)
                    .await
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM counter")
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(|e| map_sqlx_error(operation, e))?;

        Ok(count as u64)
    }
}

#[async_trait::async_trait]
impl EventStore for SqliteEventStore {
    #[instrument(skip(self), fields(user_id = %user.id), err)]
    async fn register_user(&self, user: &User) -> Result<bool, EventStoreError> {
        let result = sqlx::query("INSERT OR IGNORE INTO user (id, name) VALUES (?1, ?2)")
            .bind(user.id.get())
            .bind(&user.name)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("register_user", e))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), err)]
    async fn list_users(&self) -> Result<Vec<UserEventCount>, EventStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                user.id AS id,
                user.name AS name,
                COUNT(counter.id) AS event_count
            FROM user
            LEFT OUTER JOIN counter ON counter.user_id = user.id
            GROUP BY user.id
            ORDER BY user.name ASC, user.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;

        rows.iter().map(user_event_count_from_row).collect()
    }

    #[instrument(skip(self), fields(user_id = %user_id), err)]
    async fn append_event(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<StoredEvent, EventStoreError> {
        let result = sqlx::query("INSERT INTO counter (user_id, timestamp) VALUES (?1, ?2)")
            .bind(user_id.get())
            .bind(format_timestamp(at))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    EventStoreError::UnknownUser(user_id)
                } else {
                    map_sqlx_error("append_event", e)
                }
            })?;

        Ok(StoredEvent {
            id: result.last_insert_rowid(),
            user_id,
            timestamp: at,
        })
    }

    async fn count_total(&self) -> Result<u64, EventStoreError> {
        self.count("count_total", None).await
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, EventStoreError> {
        self.count("count_since", Some(since)).await
    }

    #[instrument(skip(self), err)]
    async fn time_since_last_event(&self, now: DateTime<Utc>) -> Result<Elapsed, EventStoreError> {
        let last: Option<String> = sqlx::query_scalar("SELECT MAX(timestamp) FROM counter")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("time_since_last_event", e))?;

        let last = last.as_deref().map(parse_timestamp).transpose()?;
        Ok(Elapsed::since(last, now))
    }
}

fn user_event_count_from_row(row: &SqliteRow) -> Result<UserEventCount, EventStoreError> {
    let decode = |e: sqlx::Error| map_sqlx_error("list_users", e);

    let id: i64 = row.try_get("id").map_err(decode)?;
    let name: String = row.try_get("name").map_err(decode)?;
    let event_count: i64 = row.try_get("event_count").map_err(decode)?;

    let id = UserId::new(id)
        .map_err(|e| EventStoreError::storage("list_users", format!("corrupt user row: {e}")))?;

    Ok(UserEventCount {
        user: User::new(id, name),
        event_count: event_count as u64,
    })
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.naive_utc().format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, EventStoreError> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| EventStoreError::storage("parse_timestamp", format!("{raw:?}: {e}")))
}

/// Map SQLx errors to EventStoreError.
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> EventStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            EventStoreError::storage(operation, format!("database error: {}", db_err.message()))
        }
        sqlx::Error::PoolClosed => EventStoreError::storage(operation, "connection pool closed"),
        other => EventStoreError::storage(operation, other.to_string()),
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn store() -> SqliteEventStore {
        let store = SqliteEventStore::in_memory().await.unwrap();
        store.create_schema().await.unwrap();
        store
    }

    fn user(id: i64, name: &str) -> User {
        User::new(UserId::new(id).unwrap(), name)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 14, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn create_schema_is_idempotent() {
        let store = store().await;
        store.create_schema().await.unwrap();
        store.register_user(&user(1, "ada")).await.unwrap();
        store.create_schema().await.unwrap();

        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn register_user_ignores_existing_ids() {
        let store = store().await;
        assert!(store.register_user(&user(1, "ada")).await.unwrap());
        assert!(!store.register_user(&user(1, "grace")).await.unwrap());

        let users = store.list_users().await.unwrap();
        assert_eq!(users[0].user.name, "ada");
    }

    #[tokio::test]
    async fn list_users_left_joins_and_orders_by_name() {
        let store = store().await;
        store.register_user(&user(1, "zoe")).await.unwrap();
        store.register_user(&user(2, "ada")).await.unwrap();
        store.register_user(&user(3, "max")).await.unwrap();

        store.append_event(UserId::new(1).unwrap(), t0()).await.unwrap();
        store.append_event(UserId::new(1).unwrap(), t0()).await.unwrap();
        store.append_event(UserId::new(3).unwrap(), t0()).await.unwrap();

        let users = store.list_users().await.unwrap();
        let listed: Vec<(&str, u64)> = users
            .iter()
            .map(|u| (u.user.name.as_str(), u.event_count))
            .collect();
        assert_eq!(listed, vec![("ada", 0), ("max", 1), ("zoe", 2)]);
    }

    #[tokio::test]
    async fn append_for_unknown_user_is_rejected_without_writing() {
        let store = store().await;
        store.register_user(&user(1, "ada")).await.unwrap();

        let err = store
            .append_event(UserId::new(999).unwrap(), t0())
            .await
            .unwrap_err();
        assert!(matches!(err, EventStoreError::UnknownUser(id) if id.get() == 999));
        assert_eq!(store.count_total().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn append_assigns_increasing_ids() {
        let store = store().await;
        store.register_user(&user(1, "ada")).await.unwrap();

        let first = store.append_event(UserId::new(1).unwrap(), t0()).await.unwrap();
        let second = store.append_event(UserId::new(1).unwrap(), t0()).await.unwrap();
        assert!(second.id > first.id);
        assert_eq!(first.timestamp, t0());
    }

    #[tokio::test]
    async fn count_since_is_strictly_after() {
        let store = store().await;
        store.register_user(&user(1, "ada")).await.unwrap();
        let id = UserId::new(1).unwrap();

        store.append_event(id, t0()).await.unwrap();
        store.append_event(id, t0() + Duration::milliseconds(250)).await.unwrap();
        store.append_event(id, t0() + Duration::hours(1)).await.unwrap();

        assert_eq!(store.count_total().await.unwrap(), 3);
        assert_eq!(store.count_since(t0() - Duration::seconds(1)).await.unwrap(), 3);
        assert_eq!(store.count_since(t0()).await.unwrap(), 2);
        assert_eq!(store.count_since(t0() + Duration::minutes(1)).await.unwrap(), 1);
        assert_eq!(store.count_since(t0() + Duration::hours(1)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn time_since_last_event_uses_newest_event_of_any_user() {
        let store = store().await;
        assert_eq!(store.time_since_last_event(t0()).await.unwrap(), Elapsed::Infinite);

        store.register_user(&user(1, "ada")).await.unwrap();
        store.register_user(&user(2, "bob")).await.unwrap();
        store.append_event(UserId::new(2).unwrap(), t0() + Duration::minutes(10)).await.unwrap();
        store.append_event(UserId::new(1).unwrap(), t0()).await.unwrap();

        let elapsed = store
            .time_since_last_event(t0() + Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(elapsed, Elapsed::Finite(Duration::minutes(20)));
    }

    #[tokio::test]
    async fn rows_stamped_by_column_default_are_readable() {
        let store = store().await;
        store.register_user(&user(1, "ada")).await.unwrap();
        sqlx::query("INSERT INTO counter (user_id) VALUES (1)")
            .execute(store.pool())
            .await
            .unwrap();

        let elapsed = store.time_since_last_event(Utc::now()).await.unwrap();
        let minutes = elapsed.as_minutes().unwrap();
        assert!((-1.0..1.0).contains(&minutes), "unexpected elapsed {minutes}");
    }

    #[test]
    fn timestamp_text_matches_current_timestamp_layout() {
        assert_eq!(format_timestamp(t0()), "2024-02-14 12:00:00");
        assert_eq!(
            format_timestamp(t0() + Duration::milliseconds(5)),
            "2024-02-14 12:00:00.005"
        );
        assert_eq!(parse_timestamp("2024-02-14 12:00:00").unwrap(), t0());
        assert_eq!(
            parse_timestamp("2024-02-14 12:00:00.005").unwrap(),
            t0() + Duration::milliseconds(5)
        );
        assert!(parse_timestamp("yesterday").is_err());
    }
}
