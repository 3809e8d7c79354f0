//! JSON bodies of the counter endpoints.
//!
//! Field names are part of the public contract of the web page and must not
//! change.

use serde::{Deserialize, Serialize};

use tally_core::{Totals, UserId, UserSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub counter: u64,
}

impl From<UserSummary> for UserResponse {
    fn from(value: UserSummary) -> Self {
        Self {
            id: value.id,
            name: value.name,
            counter: value.counter,
        }
    }
}

/// `today` and `this_week` are passed through from [`Totals`] unchanged; see
/// its docs for which calendar window each label carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalsResponse {
    pub total: u64,
    pub today: u64,
    pub this_week: u64,
}

impl From<Totals> for TotalsResponse {
    fn from(value: Totals) -> Self {
        Self {
            total: value.total,
            today: value.today,
            this_week: value.this_week,
        }
    }
}

/// Minutes since the last increment, `-1` when there has been none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastResponse {
    pub elapsed: f64,
}
