//! Append-only increment log plus the user registry it references.
//!
//! [`EventStore`] is the storage boundary the counter service talks to. Two
//! implementations exist: [`SqliteEventStore`] for the running service and
//! [`InMemoryEventStore`] for tests and local experiments.

pub mod in_memory;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UserEventCount};
pub use sqlite::SqliteEventStore;
