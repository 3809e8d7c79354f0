use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use tally_core::{Elapsed, User, UserId};

/// A persisted increment event.
///
/// Events are facts: once stored they are never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    /// Store-assigned, monotonically increasing row id.
    pub id: i64,
    pub user_id: UserId,
    pub timestamp: DateTime<Utc>,
}

/// A registered user together with the number of events referencing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEventCount {
    pub user: User,
    pub event_count: u64,
}

/// Event store operation error.
///
/// ## Error Categories
///
/// - **UnknownUser**: the appended event references a user that does not
///   exist (referential constraint, enforced by the store itself)
/// - **Storage**: anything else the backend reports (I/O, pool closed,
///   corrupt rows). Callers treat these as unexpected.
#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("unknown user: {0}")]
    UnknownUser(UserId),

    #[error("storage failure in {operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },
}

impl EventStoreError {
    pub fn storage(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Storage {
            operation,
            message: message.into(),
        }
    }
}

/// Append-only increment log with a user registry.
///
/// ## Semantics
///
/// - Every event references an existing user; implementations reject the
///   append with [`EventStoreError::UnknownUser`] otherwise.
/// - Each method is one atomic unit. No method spans several statements that
///   a concurrent caller could interleave with.
/// - Nothing is cached: every read reflects all appends committed before it.
#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    /// Register a user out-of-band. Returns `false` if the id already exists
    /// (the existing user is left untouched).
    async fn register_user(&self, user: &User) -> Result<bool, EventStoreError>;

    /// Every registered user with its event count, ordered by name ascending.
    ///
    /// Users without events are included with a count of 0.
    async fn list_users(&self) -> Result<Vec<UserEventCount>, EventStoreError>;

    /// Append one event for `user_id` stamped with `at`.
    async fn append_event(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<StoredEvent, EventStoreError>;

    /// Number of events ever recorded.
    async fn count_total(&self) -> Result<u64, EventStoreError>;

    /// Number of events with a timestamp strictly after `since`.
    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, EventStoreError>;

    /// Time between the most recent event (any user) and `now`.
    async fn time_since_last_event(&self, now: DateTime<Utc>) -> Result<Elapsed, EventStoreError>;
}

#[async_trait::async_trait]
impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    async fn register_user(&self, user: &User) -> Result<bool, EventStoreError> {
        (**self).register_user(user).await
    }

    async fn list_users(&self) -> Result<Vec<UserEventCount>, EventStoreError> {
        (**self).list_users().await
    }

    async fn append_event(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<StoredEvent, EventStoreError> {
        (**self).append_event(user_id, at).await
    }

    async fn count_total(&self) -> Result<u64, EventStoreError> {
        (**self).count_total().await
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, EventStoreError> {
        (**self).count_since(since).await
    }

    async fn time_since_last_event(&self, now: DateTime<Utc>) -> Result<Elapsed, EventStoreError> {
        (**self).time_since_last_event(now).await
    }
}
