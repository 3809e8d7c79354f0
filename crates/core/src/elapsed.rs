//! Time elapsed since the most recent increment.

use chrono::{DateTime, Duration, Utc};

/// Elapsed time since the last recorded event.
///
/// `Infinite` means no event has ever been recorded. It is an explicit variant
/// rather than a float infinity so it survives every serialization format; the
/// `-1` wire sentinel is applied only by [`Elapsed::wire_minutes`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Elapsed {
    Finite(Duration),
    Infinite,
}

impl Elapsed {
    /// Value reported when no event exists.
    pub const WIRE_SENTINEL: f64 = -1.0;

    /// Elapsed time between `last` (if any) and `now`.
    pub fn since(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match last {
            Some(last) => Elapsed::Finite(now - last),
            None => Elapsed::Infinite,
        }
    }

    /// Fractional minutes, `None` when infinite.
    pub fn as_minutes(&self) -> Option<f64> {
        match self {
            Elapsed::Finite(d) => Some(d.num_milliseconds() as f64 / 60_000.0),
            Elapsed::Infinite => None,
        }
    }

    /// Fractional minutes, or `-1` when no event exists.
    pub fn wire_minutes(&self) -> f64 {
        self.as_minutes().unwrap_or(Self::WIRE_SENTINEL)
    }

    /// Whether less than `cooldown` has passed.
    pub fn is_within(&self, cooldown: Duration) -> bool {
        match self {
            Elapsed::Finite(d) => *d < cooldown,
            Elapsed::Infinite => false,
        }
    }
}
