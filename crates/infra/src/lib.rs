//! Infrastructure layer: the event store and the counter service built on it.

pub mod counter_service;
pub mod event_store;

pub use counter_service::{CounterError, CounterService, IncrementOutcome, RejectReason};
pub use event_store::{
    EventStore, EventStoreError, InMemoryEventStore, SqliteEventStore, StoredEvent, UserEventCount,
};
