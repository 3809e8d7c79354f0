//! Counter business rules over the event store.
//!
//! The `CounterService` answers the aggregate queries and guards appends with
//! the cooldown:
//!
//! ```text
//! increment(user values)
//!   ↓
//! 1. Validate: exactly one value, positive integer   → Rejected(MalformedId)
//!   ↓
//! 2. Elapsed since the newest event of ANY user (read from the store)
//!   ↓
//! 3. elapsed < cooldown                              → RateLimited
//!   ↓
//! 4. Append event (store enforces user existence)    → Rejected(UnknownUser)
//!   ↓
//! Accepted
//! ```
//!
//! ## Concurrency
//!
//! Steps 2 and 4 are two separate store calls. Two increments racing through
//! the same gap can both observe the old elapsed value and both be accepted.
//! Closing the window would make rate limiting stricter under concurrency,
//! which is an observable behavior change, so the window is left as is.
//!
//! The service holds no state between calls: the last-event time is re-read
//! from the store every time, which keeps several processes sharing one
//! database consistent without extra coordination.

use chrono::Duration;
use thiserror::Error;
use tracing::{info, warn};

use tally_core::{calendar, Clock, Elapsed, Totals, UserId, UserSummary};

use crate::event_store::{EventStore, EventStoreError, StoredEvent};

/// Why an increment was refused without touching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MalformedId,
    UnknownUser,
}

impl core::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RejectReason::MalformedId => f.write_str("malformed id"),
            RejectReason::UnknownUser => f.write_str("unknown user"),
        }
    }
}

/// Result of an increment attempt. Every variant is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncrementOutcome {
    Accepted(StoredEvent),
    /// The previous event is too recent. Callers must not retry immediately.
    RateLimited { elapsed: Elapsed },
    Rejected(RejectReason),
}

/// Unexpected failure while serving a counter operation.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error(transparent)]
    Storage(#[from] EventStoreError),
}

/// Business rules layered over an [`EventStore`].
///
/// ## Generic Parameters
///
/// - `S`: event store implementation
/// - `C`: clock used for "now" (cooldown checks, calendar cutoffs, event stamps)
#[derive(Debug, Clone)]
pub struct CounterService<S, C> {
    store: S,
    clock: C,
    cooldown: Duration,
}

impl<S, C> CounterService<S, C>
where
    S: EventStore,
    C: Clock,
{
    pub fn new(store: S, clock: C, cooldown: Duration) -> Self {
        Self {
            store,
            clock,
            cooldown,
        }
    }

    /// Every user with its increment count, ordered by name.
    pub async fn user_summary(&self) -> Result<Vec<UserSummary>, CounterError> {
        let users = self.store.list_users().await?;
        Ok(users
            .into_iter()
            .map(|u| UserSummary {
                id: u.user.id,
                name: u.user.name,
                counter: u.event_count,
            })
            .collect())
    }

    /// Total count plus the two calendar-window counts.
    ///
    /// `today` receives the weekday-0 anchor window and `this_week` the
    /// start-of-day window, matching what existing clients read (see
    /// [`Totals`]).
    pub async fn totals(&self) -> Result<Totals, CounterError> {
        let now = self.clock.now();

        let total = self.store.count_total().await?;
        let today = self.store.count_since(calendar::weekday_anchor(now)).await?;
        let this_week = self.store.count_since(calendar::start_of_day(now)).await?;

        Ok(Totals {
            total,
            today,
            this_week,
        })
    }

    /// Elapsed time since the newest event of any user.
    pub async fn elapsed(&self) -> Result<Elapsed, CounterError> {
        Ok(self.store.time_since_last_event(self.clock.now()).await?)
    }

    /// Minutes since the newest event, `-1` if there is none.
    pub async fn elapsed_minutes(&self) -> Result<f64, CounterError> {
        Ok(self.elapsed().await?.wire_minutes())
    }

    /// Increment from the raw values of a `user` form field.
    pub async fn increment<V: AsRef<str>>(
        &self,
        user_values: &[V],
    ) -> Result<IncrementOutcome, CounterError> {
        match UserId::from_form_values(user_values) {
            Ok(user_id) => self.increment_user(user_id).await,
            Err(e) => {
                let raw: Vec<&str> = user_values.iter().map(|v| v.as_ref()).collect();
                warn!(error = %e, user = ?raw, "increment rejected: malformed user id");
                Ok(IncrementOutcome::Rejected(RejectReason::MalformedId))
            }
        }
    }

    /// Increment for an already validated user id.
    pub async fn increment_user(&self, user_id: UserId) -> Result<IncrementOutcome, CounterError> {
        let now = self.clock.now();

        let elapsed = self.store.time_since_last_event(now).await?;
        if elapsed.is_within(self.cooldown) {
            info!(
                user_id = %user_id,
                elapsed_minutes = elapsed.wire_minutes(),
                "too many requests, increment rate limited"
            );
            return Ok(IncrementOutcome::RateLimited { elapsed });
        }

        match self.store.append_event(user_id, now).await {
            Ok(event) => {
                info!(user_id = %user_id, event_id = event.id, "counter incremented");
                Ok(IncrementOutcome::Accepted(event))
            }
            Err(EventStoreError::UnknownUser(_)) => {
                warn!(user_id = %user_id, "increment rejected: unknown user");
                Ok(IncrementOutcome::Rejected(RejectReason::UnknownUser))
            }
            Err(e) => Err(e.into()),
        }
    }
}
