//! crates/reading_tracker_core/src/streak.rs
//!
//! Day-granularity reading streaks as an explicit fold over a prior state.
//!
//! The result depends on the order in which sessions are applied, not on their
//! calendar order: a day older than the recorded last-read day never changes the
//! run length. Callers pass `now` and the prior record into every call.

use chrono::{DateTime, NaiveDate, Utc};

use crate::calendar::{days_between, days_inclusive, utc_day};
use crate::domain::ReadingStreak;
use crate::error::DateRejection;

/// Rejects a date whose UTC day lies after the UTC day of `now`.
pub fn validate_effective_date(date: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), DateRejection> {
    if utc_day(date) > utc_day(now) {
        return Err(DateRejection::FutureDate);
    }
    Ok(())
}

/// The run-length part of a streak, keyed by day rather than instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_read_day: Option<NaiveDate>,
}

impl StreakState {
    pub fn of(streak: &ReadingStreak) -> Self {
        Self {
            current_streak: streak.current_streak,
            longest_streak: streak.longest_streak,
            last_read_day: streak.last_read_date.map(utc_day),
        }
    }

    /// Folds one reading day into the state.
    pub fn fold_day(self, day: NaiveDate) -> Self {
        let Some(last_day) = self.last_read_day else {
            return self.restart(day);
        };

        match days_between(day, last_day) {
            // Backfilled day: accepted data, no streak effect.
            gap if gap < 0 => self,
            0 => self,
            1 => {
                let current_streak = self.current_streak + 1;
                Self {
                    current_streak,
                    longest_streak: self.longest_streak.max(current_streak),
                    last_read_day: Some(day),
                }
            }
            _ => self.restart(day),
        }
    }

    fn restart(self, day: NaiveDate) -> Self {
        Self {
            current_streak: 1,
            longest_streak: self.longest_streak.max(1),
            last_read_day: Some(day),
        }
    }
}

/// Folds every UTC day in `days` into `prior`, in the order given.
pub fn fold_days(prior: StreakState, days: impl IntoIterator<Item = NaiveDate>) -> StreakState {
    days.into_iter().fold(prior, StreakState::fold_day)
}

/// Applies one session to a user's streak and returns the updated record.
///
/// The session covers every UTC day from `started_at` to `ended_at` (or just the
/// start day for an open session). `last_read_date` only ever moves forward.
/// An inverted range covers no days and returns `prior` unchanged.
pub fn apply_session(
    prior: &ReadingStreak,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<ReadingStreak, DateRejection> {
    validate_effective_date(started_at, now)?;
    let end = ended_at.unwrap_or(started_at);
    validate_effective_date(end, now)?;
    if end < started_at {
        return Ok(prior.clone());
    }

    let end_day = utc_day(end);
    let state = fold_days(StreakState::of(prior), days_inclusive(utc_day(started_at), end_day));

    let last_read_date = match state.last_read_day {
        Some(last_day) if end_day >= last_day => {
            Some(prior.last_read_date.map_or(end, |previous| previous.max(end)))
        }
        _ => prior.last_read_date,
    };

    Ok(ReadingStreak {
        user_id: prior.user_id,
        current_streak: state.current_streak,
        longest_streak: state.longest_streak,
        last_read_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn now() -> DateTime<Utc> {
        at("2024-03-20T12:00:00Z")
    }

    fn read(streak: &ReadingStreak, start: &str, end: Option<&str>) -> ReadingStreak {
        apply_session(streak, at(start), end.map(at), now()).unwrap()
    }

    fn fresh() -> ReadingStreak {
        ReadingStreak::empty(Uuid::new_v4())
    }

    #[test]
    fn first_session_starts_a_streak() {
        let streak = read(&fresh(), "2024-03-18T08:00:00Z", Some("2024-03-18T08:30:00Z"));

        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 1);
        assert_eq!(streak.last_read_date, Some(at("2024-03-18T08:30:00Z")));
    }

    #[test]
    fn same_day_sessions_are_idempotent_in_any_order() {
        let morning = ("2024-03-18T08:00:00Z", Some("2024-03-18T08:30:00Z"));
        let evening = ("2024-03-18T20:00:00Z", Some("2024-03-18T21:00:00Z"));

        let base = read(&fresh(), "2024-03-17T10:00:00Z", None);
        let forward = read(&read(&base, morning.0, morning.1), evening.0, evening.1);
        let backward = read(&read(&base, evening.0, evening.1), morning.0, morning.1);
        let once = read(&base, morning.0, morning.1);

        assert_eq!(forward.current_streak, once.current_streak);
        assert_eq!(backward.current_streak, once.current_streak);
        assert_eq!(forward, backward);
        assert_eq!(forward.last_read_date, Some(at("2024-03-18T21:00:00Z")));
    }

    #[test]
    fn consecutive_days_extend_the_streak() {
        let mut streak = fresh();
        for day in ["2024-03-15", "2024-03-16", "2024-03-17"] {
            streak = read(&streak, &format!("{}T09:00:00Z", day), None);
        }

        assert_eq!(streak.current_streak, 3);
        assert_eq!(streak.longest_streak, 3);
    }

    #[test]
    fn multi_day_session_counts_every_day_it_covers() {
        let streak = read(&fresh(), "2024-03-16T23:00:00Z", Some("2024-03-18T00:15:00Z"));

        assert_eq!(streak.current_streak, 3);
        assert_eq!(streak.longest_streak, 3);
        assert_eq!(streak.last_read_date, Some(at("2024-03-18T00:15:00Z")));
    }

    #[test]
    fn gap_resets_current_but_keeps_longest() {
        let mut streak = fresh();
        for day in ["2024-03-01", "2024-03-02", "2024-03-03"] {
            streak = read(&streak, &format!("{}T09:00:00Z", day), None);
        }
        streak = read(&streak, "2024-03-06T09:00:00Z", None);

        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 3);
    }

    #[test]
    fn two_day_gap_resets_to_one() {
        let day1 = read(&fresh(), "2024-03-01T09:00:00Z", None);
        let day4 = read(&day1, "2024-03-04T09:00:00Z", None);

        assert_eq!(day4.current_streak, 1);
        assert_eq!(day4.longest_streak, 1);
    }

    #[test]
    fn backfill_never_regresses() {
        let mut streak = fresh();
        for day in ["2024-03-10", "2024-03-11"] {
            streak = read(&streak, &format!("{}T12:00:00Z", day), None);
        }
        let backfilled = read(&streak, "2024-03-05T12:00:00Z", Some("2024-03-05T13:00:00Z"));

        assert_eq!(backfilled, streak);
    }

    #[test]
    fn session_overlapping_last_read_day_only_counts_newer_days() {
        let streak = read(&fresh(), "2024-03-10T12:00:00Z", None);
        let streak = read(&streak, "2024-03-08T22:00:00Z", Some("2024-03-11T01:00:00Z"));

        assert_eq!(streak.current_streak, 2);
        assert_eq!(streak.longest_streak, 2);
        assert_eq!(streak.last_read_date, Some(at("2024-03-11T01:00:00Z")));
    }

    #[test]
    fn last_read_date_never_moves_backward_within_a_day() {
        let streak = read(&fresh(), "2024-03-18T20:00:00Z", Some("2024-03-18T21:00:00Z"));
        let streak = read(&streak, "2024-03-18T07:00:00Z", Some("2024-03-18T07:45:00Z"));

        assert_eq!(streak.last_read_date, Some(at("2024-03-18T21:00:00Z")));
    }

    #[test]
    fn future_start_is_rejected() {
        let prior = fresh();
        let tomorrow = now() + Duration::days(1);

        assert_eq!(
            apply_session(&prior, tomorrow, None, now()),
            Err(DateRejection::FutureDate)
        );
    }

    #[test]
    fn future_end_is_rejected() {
        let result = apply_session(
            &fresh(),
            at("2024-03-20T23:00:00Z"),
            Some(at("2024-03-21T00:30:00Z")),
            now(),
        );
        assert_eq!(result, Err(DateRejection::FutureDate));
    }

    #[test]
    fn later_today_is_not_future() {
        let streak = apply_session(&fresh(), at("2024-03-20T23:59:00Z"), None, now()).unwrap();
        assert_eq!(streak.current_streak, 1);
    }

    #[test]
    fn inverted_range_leaves_record_untouched() {
        let prior = read(&fresh(), "2024-03-12T10:00:00Z", None);
        let after = apply_session(&prior, at("2024-03-15T10:00:00Z"), Some(at("2024-03-14T10:00:00Z")), now()).unwrap();
        assert_eq!(after, prior);

        let empty = fresh();
        let after = apply_session(&empty, at("2024-03-15T10:00:00Z"), Some(at("2024-03-14T10:00:00Z")), now()).unwrap();
        assert_eq!(after, empty);
    }

    #[test]
    fn out_of_order_backfill_across_gap_depends_on_insertion_order() {
        let d1 = "2024-03-01T09:00:00Z";
        let d2 = "2024-03-02T09:00:00Z";
        let d3 = "2024-03-03T09:00:00Z";

        let chronological = read(&read(&read(&fresh(), d1, None), d2, None), d3, None);
        let interleaved = read(&read(&read(&fresh(), d1, None), d3, None), d2, None);

        assert_eq!(chronological.longest_streak, 3);
        assert_eq!(interleaved.longest_streak, 1);
        assert_eq!(interleaved.current_streak, 1);
    }

    #[test]
    fn fold_keeps_current_within_longest() {
        let days = ["2024-01-01", "2024-01-02", "2024-01-05", "2024-01-06", "2024-01-07", "2024-01-07", "2024-01-03"]
            .map(|d| d.parse::<NaiveDate>().unwrap());
        let mut state = StreakState::of(&fresh());
        for day in days {
            state = state.fold_day(day);
            assert!(state.current_streak <= state.longest_streak);
        }
        assert_eq!(state.current_streak, 3);
        assert_eq!(state.longest_streak, 3);
    }
}
