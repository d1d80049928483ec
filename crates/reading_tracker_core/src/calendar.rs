//! crates/reading_tracker_core/src/calendar.rs
//!
//! UTC calendar-day normalization shared by the allocator and the streak tracker.
//! No timezone offset is applied anywhere: every instant is bucketed by its UTC date.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use std::fmt;

use crate::error::DateRejection;

/// Truncates an instant to its UTC calendar day.
pub fn utc_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.date_naive()
}

/// The instant at which a UTC calendar day begins (00:00:00Z).
pub fn day_start(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::default()))
}

/// The first UTC day boundary strictly after `instant`.
pub fn next_day_start(instant: DateTime<Utc>) -> DateTime<Utc> {
    day_start(utc_day(instant)) + Duration::days(1)
}

/// Whole days from `earlier` to `later` (negative if `later` precedes `earlier`).
pub fn days_between(later: NaiveDate, earlier: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Every UTC day from `from` to `to`, inclusive, in chronological order.
/// Empty when `to` precedes `from`.
pub fn days_inclusive(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let count = if to < from { 0 } else { days_between(to, from) + 1 };
    from.iter_days().take(count as usize)
}

/// The half-open window `[first day of month, first day of next month)`.
pub fn month_window(year: i32, month: u32) -> Result<(DateTime<Utc>, DateTime<Utc>), DateRejection> {
    if year < 1970 || !(1..=12).contains(&month) {
        return Err(DateRejection::InvalidMonth { year, month });
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or(DateRejection::InvalidMonth { year, month })?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or(DateRejection::InvalidMonth { year, month })?;
    Ok((day_start(first), day_start(next)))
}

/// A UTC calendar date used as the bucketing unit for analytics and streaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn of(instant: DateTime<Utc>) -> Self {
        Self(utc_day(instant))
    }

    pub fn start(&self) -> DateTime<Utc> {
        day_start(self.0)
    }
}

impl From<NaiveDate> for DayKey {
    fn from(day: NaiveDate) -> Self {
        Self(day)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.0.year(), self.0.month(), self.0.day())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn truncates_to_utc_day() {
        assert_eq!(
            utc_day(at("2023-10-31T23:59:59Z")),
            NaiveDate::from_ymd_opt(2023, 10, 31).unwrap()
        );
        assert_eq!(next_day_start(at("2023-10-31T23:59:59Z")), at("2023-11-01T00:00:00Z"));
        assert_eq!(next_day_start(at("2023-11-01T00:00:00Z")), at("2023-11-02T00:00:00Z"));
    }

    #[test]
    fn day_key_formats_zero_padded() {
        assert_eq!(DayKey::of(at("2023-02-03T10:00:00Z")).to_string(), "2023-02-03");
    }

    #[test]
    fn inclusive_day_range() {
        let from = NaiveDate::from_ymd_opt(2023, 12, 30).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let days: Vec<_> = days_inclusive(from, to).map(|d| DayKey::from(d).to_string()).collect();
        assert_eq!(days, vec!["2023-12-30", "2023-12-31", "2024-01-01", "2024-01-02"]);
        assert_eq!(days_inclusive(to, from).count(), 0);
    }

    #[test]
    fn december_window_rolls_into_next_year() {
        let (start, end) = month_window(2023, 12).unwrap();
        assert_eq!(start, at("2023-12-01T00:00:00Z"));
        assert_eq!(end, at("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn rejects_out_of_range_month() {
        assert!(month_window(2023, 13).is_err());
        assert!(month_window(2023, 0).is_err());
        assert!(month_window(1969, 5).is_err());
    }
}
