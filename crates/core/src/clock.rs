//! Wall-clock access.
//!
//! The counter service reads "now" through [`Clock`] so cooldown and window
//! logic can be driven deterministically in tests with [`ManualClock`]
//! (available in test builds or with the `test-helpers` feature).

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<C> Clock for Arc<C>
where
    C: Clock + ?Sized,
{
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// System clock implementation using `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use manual::ManualClock;

#[cfg(any(test, feature = "test-helpers"))]
mod manual {
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Duration, Utc};

    use super::Clock;

    /// Clock whose time only moves when told to.
    ///
    /// Clones share the same underlying instant, so advancing one clone
    /// advances all of them.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        current: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                current: Arc::new(Mutex::new(start)),
            }
        }

        pub fn advance(&self, by: Duration) {
            let mut current = self.current.lock().unwrap();
            *current += by;
        }

        pub fn set(&self, to: DateTime<Utc>) {
            *self.current.lock().unwrap() = to;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.current.lock().unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock::new();
        let t1 = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(clock.now() > t1);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let shared = clock.clone();

        shared.advance(Duration::minutes(10));
        assert_eq!(clock.now(), start + Duration::minutes(10));

        clock.set(start);
        assert_eq!(shared.now(), start);

        let dyn_clock: Arc<dyn Clock> = Arc::new(shared);
        assert_eq!(dyn_clock.now(), start);
    }
}
