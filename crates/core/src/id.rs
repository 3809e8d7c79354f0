//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Identifier of a registered user.
///
/// Always strictly positive. Deserialization goes through the same check as
/// [`UserId::new`], so an invalid id can never be constructed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct UserId(i64);

impl UserId {
    pub fn new(value: i64) -> DomainResult<Self> {
        if value <= 0 {
            return Err(DomainError::invalid_id(format!(
                "UserId: must be positive, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Parse the raw values of a `user` form field.
    ///
    /// Exactly one value must be present and it must parse as a positive
    /// integer.
    pub fn from_form_values<S: AsRef<str>>(values: &[S]) -> DomainResult<Self> {
        match values {
            [single] => single.as_ref().parse(),
            [] => Err(DomainError::validation("user: missing")),
            _ => Err(DomainError::validation(format!(
                "user: expected exactly one value, got {}",
                values.len()
            ))),
        }
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<i64> for UserId {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for i64 {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl FromStr for UserId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .parse::<i64>()
            .map_err(|e| DomainError::invalid_id(format!("UserId: {e}")))?;
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_integers() {
        assert_eq!("7".parse::<UserId>().unwrap().get(), 7);
        assert_eq!("+12".parse::<UserId>().unwrap().get(), 12);
    }

    #[test]
    fn rejects_non_numeric_and_non_positive() {
        for raw in ["", "abc", "1.5", " 3", "0", "-4", "99999999999999999999"] {
            assert!(
                matches!(raw.parse::<UserId>(), Err(DomainError::InvalidId(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn form_values_require_exactly_one_entry() {
        assert_eq!(UserId::from_form_values(&["3"]).unwrap().get(), 3);

        let empty: [&str; 0] = [];
        assert!(matches!(
            UserId::from_form_values(&empty),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            UserId::from_form_values(&["1", "1"]),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            UserId::from_form_values(&["x"]),
            Err(DomainError::InvalidId(_))
        ));
    }

    #[test]
    fn serde_rejects_invalid_ids() {
        let id: UserId = serde_json::from_str("5").unwrap();
        assert_eq!(id.get(), 5);
        assert_eq!(serde_json::to_string(&id).unwrap(), "5");
        assert!(serde_json::from_str::<UserId>("0").is_err());
    }
}
