use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use tally_core::{Elapsed, User, UserId};

use super::r#trait::{EventStore, EventStoreError, StoredEvent, UserEventCount};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    events: Vec<StoredEvent>,
}

/// In-memory append-only event store.
///
/// Intended for tests/dev. Mirrors the SQLite store's semantics, including
/// the rejection of events for unknown users. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    state: RwLock<State>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> Result<T, EventStoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| EventStoreError::storage("read", "lock poisoned"))?;
        Ok(f(&state))
    }
}

#[async_trait::async_trait]
impl EventStore for InMemoryEventStore {
    async fn register_user(&self, user: &User) -> Result<bool, EventStoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| EventStoreError::storage("register_user", "lock poisoned"))?;

        if state.users.contains_key(&user.id) {
            return Ok(false);
        }
        state.users.insert(user.id, user.clone());
        Ok(true)
    }

    async fn list_users(&self) -> Result<Vec<UserEventCount>, EventStoreError> {
        self.read(|state| {
            let mut users: Vec<UserEventCount> = state
                .users
                .values()
                .map(|user| UserEventCount {
                    user: user.clone(),
                    event_count: state.events.iter().filter(|e| e.user_id == user.id).count() as u64,
                })
                .collect();
            // BTreeMap iteration already orders by id, so the stable sort keeps
            // id order among equal names.
            users.sort_by(|a, b| a.user.name.cmp(&b.user.name));
            users
        })
    }

    async fn append_event(
        &self,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<StoredEvent, EventStoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| EventStoreError::storage("append_event", "lock poisoned"))?;

        if !state.users.contains_key(&user_id) {
            return Err(EventStoreError::UnknownUser(user_id));
        }

        let event = StoredEvent {
            id: state.events.last().map(|e| e.id).unwrap_or(0) + 1,
            user_id,
            timestamp: at,
        };
        state.events.push(event.clone());
        Ok(event)
    }

    async fn count_total(&self) -> Result<u64, EventStoreError> {
        self.read(|state| state.events.len() as u64)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<u64, EventStoreError> {
        self.read(|state| state.events.iter().filter(|e| e.timestamp > since).count() as u64)
    }

    async fn time_since_last_event(&self, now: DateTime<Utc>) -> Result<Elapsed, EventStoreError> {
        self.read(|state| {
            let last = state.events.iter().map(|e| e.timestamp).max();
            Elapsed::since(last, now)
        })
    }
}
