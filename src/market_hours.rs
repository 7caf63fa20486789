//! US equity market-hours predicate.
//!
//! The trading window is 09:30-16:00 America/New_York, Monday through
//! Friday. The predicate is a pure function of the supplied instant, so
//! DST transitions are handled by the timezone conversion itself.

use crate::config::MonitorConfig;
use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::America::New_York;
use std::time::Duration;

/// Whether the regular US trading session is open at `now`.
pub fn market_open_at(now: DateTime<Utc>) -> bool {
    let local = now.with_timezone(&New_York);
    if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }
    let open = NaiveTime::from_hms_opt(9, 30, 0).expect("valid open time");
    let close = NaiveTime::from_hms_opt(16, 0, 0).expect("valid close time");
    let time = local.time();
    time >= open && time <= close
}

pub fn market_open_now() -> bool {
    market_open_at(Utc::now())
}

/// Cycle sleep interval for the given instant: the fast cadence during
/// trading hours, the slow one otherwise.
pub fn poll_interval(config: &MonitorConfig, now: DateTime<Utc>) -> Duration {
    if market_open_at(now) {
        Duration::from_secs(config.open_poll_secs)
    } else {
        Duration::from_secs(config.closed_poll_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // 2024-01-10 is a Wednesday; New York is on EST (UTC-5) in January.
    fn wednesday_at_utc(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, hour, 0, 0).unwrap()
    }

    #[test]
    fn open_midmorning_on_a_weekday() {
        // 15:00 UTC == 10:00 New York
        assert!(market_open_at(wednesday_at_utc(15)));
    }

    #[test]
    fn closed_in_the_evening() {
        // 2024-01-11 01:00 UTC == Wednesday 20:00 New York
        let evening = Utc.with_ymd_and_hms(2024, 1, 11, 1, 0, 0).unwrap();
        assert!(!market_open_at(evening));
    }

    #[test]
    fn closed_on_saturday() {
        // 2024-01-13 is a Saturday; 15:00 UTC == 10:00 New York
        let saturday = Utc.with_ymd_and_hms(2024, 1, 13, 15, 0, 0).unwrap();
        assert!(!market_open_at(saturday));
    }

    #[test]
    fn dst_is_handled_by_the_timezone() {
        // 2024-07-10 is a Wednesday; New York is on EDT (UTC-4) in July,
        // so 14:00 UTC == 10:00 New York.
        let summer = Utc.with_ymd_and_hms(2024, 7, 10, 14, 0, 0).unwrap();
        assert!(market_open_at(summer));
        // 13:00 UTC == 09:00 New York, before the open.
        let early = Utc.with_ymd_and_hms(2024, 7, 10, 13, 0, 0).unwrap();
        assert!(!market_open_at(early));
    }

    #[test]
    fn boundaries_are_inclusive() {
        // 14:30 UTC == 09:30 New York, 21:00 UTC == 16:00 New York.
        let open_edge = Utc.with_ymd_and_hms(2024, 1, 10, 14, 30, 0).unwrap();
        let close_edge = Utc.with_ymd_and_hms(2024, 1, 10, 21, 0, 0).unwrap();
        assert!(market_open_at(open_edge));
        assert!(market_open_at(close_edge));
        let after_close = Utc.with_ymd_and_hms(2024, 1, 10, 21, 0, 1).unwrap();
        assert!(!market_open_at(after_close));
    }

    #[test]
    fn interval_follows_the_predicate() {
        let config = MonitorConfig::default();
        assert_eq!(
            poll_interval(&config, wednesday_at_utc(15)),
            Duration::from_secs(45)
        );
        let saturday = Utc.with_ymd_and_hms(2024, 1, 13, 15, 0, 0).unwrap();
        assert_eq!(
            poll_interval(&config, saturday),
            Duration::from_secs(300)
        );
    }
}
