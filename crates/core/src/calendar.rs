//! Calendar cutoffs for the windowed totals.
//!
//! All cutoffs are computed in UTC, the time base of the stored timestamps.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};

/// Midnight at the start of `now`'s day.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

/// `now` moved forward to the next Sunday (or kept, if already Sunday), then
/// moved back seven days. The time of day is kept.
///
/// The result is always a Sunday between one and seven days before `now`.
pub fn weekday_anchor(now: DateTime<Utc>) -> DateTime<Utc> {
    let ahead = (7 - now.weekday().num_days_from_sunday()) % 7;
    now + Duration::days(i64::from(ahead)) - Duration::days(7)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use proptest::prelude::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn start_of_day_truncates_time() {
        assert_eq!(start_of_day(utc(2024, 1, 3, 17, 42)), utc(2024, 1, 3, 0, 0));
        assert_eq!(start_of_day(utc(2024, 1, 3, 0, 0)), utc(2024, 1, 3, 0, 0));
    }

    #[test]
    fn weekday_anchor_on_monday_is_previous_day() {
        // 2024-01-01 is a Monday.
        assert_eq!(weekday_anchor(utc(2024, 1, 1, 10, 0)), utc(2023, 12, 31, 10, 0));
    }

    #[test]
    fn weekday_anchor_on_saturday_is_six_days_back() {
        assert_eq!(weekday_anchor(utc(2024, 1, 6, 8, 30)), utc(2023, 12, 31, 8, 30));
    }

    #[test]
    fn weekday_anchor_on_sunday_is_a_full_week_back() {
        assert_eq!(weekday_anchor(utc(2024, 1, 7, 23, 59)), utc(2023, 12, 31, 23, 59));
    }

    proptest! {
        #[test]
        fn weekday_anchor_is_a_sunday_within_a_week(secs in 0i64..4_000_000_000) {
            let now = DateTime::from_timestamp(secs, 0).unwrap();
            let anchor = weekday_anchor(now);

            prop_assert_eq!(anchor.weekday(), Weekday::Sun);
            prop_assert_eq!(anchor.time(), now.time());
            prop_assert!(now - anchor >= Duration::days(1));
            prop_assert!(now - anchor <= Duration::days(7));
        }

        #[test]
        fn start_of_day_is_within_the_last_day(secs in 0i64..4_000_000_000) {
            let now = DateTime::from_timestamp(secs, 0).unwrap();
            let start = start_of_day(now);

            prop_assert!(start <= now);
            prop_assert!(now - start < Duration::days(1));
            prop_assert_eq!(start.date_naive(), now.date_naive());
        }
    }
}
