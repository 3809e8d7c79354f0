//! `tally-core` — domain building blocks for the habit counter.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the user entity, elapsed-time arithmetic and the calendar
//! cutoffs used by the totals queries.

pub mod calendar;
pub mod clock;
pub mod elapsed;
pub mod error;
pub mod id;
pub mod user;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-helpers"))]
pub use clock::ManualClock;
pub use elapsed::Elapsed;
pub use error::{DomainError, DomainResult};
pub use id::UserId;
pub use user::{Totals, User, UserSummary};

/// Minimum time between two accepted increments, unless configured otherwise.
pub const DEFAULT_COOLDOWN_MINUTES: u32 = 45;
