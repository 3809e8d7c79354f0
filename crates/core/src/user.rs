//! Users and the aggregate views computed over their increments.

use crate::id::UserId;

/// A registered user.
///
/// Users are registered out-of-band and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// One row of the user listing: a user and how many increments it has logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub counter: u64,
}

/// Event counts over the whole log and the two calendar windows.
///
/// `today` and `this_week` keep the wiring of the service this one replaces:
/// `today` counts events after the weekday-0 anchor
/// ([`crate::calendar::weekday_anchor`]), `this_week` counts events after the
/// start of the current day ([`crate::calendar::start_of_day`]). The names do
/// not describe the windows; clients depend on the existing values.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Totals {
    pub total: u64,
    pub today: u64,
    pub this_week: u64,
}
