//! crates/reading_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::calendar::DayKey;

/// How a reading session was timed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionType {
    Free,
    Pomodoro,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Free => "FREE",
            SessionType::Pomodoro => "POMODORO",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FREE" => Ok(SessionType::Free),
            "POMODORO" => Ok(SessionType::Pomodoro),
            other => Err(format!("unknown session type '{}'", other)),
        }
    }
}

/// A stored reading session.
///
/// `ended_at == None` marks an open (timer-style) session whose effective end is
/// `started_at + duration_minutes`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub session_type: SessionType,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub pages_read: u32,
    pub created_at: DateTime<Utc>,
}

/// A session as submitted by a client, before it is persisted.
#[derive(Debug, Clone)]
pub struct NewReadingSession {
    pub session_type: SessionType,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
    pub pages_read: u32,
}

/// Per-user reading streak. Mutated only through [`crate::streak`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingStreak {
    pub user_id: Uuid,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_read_date: Option<DateTime<Utc>>,
}

impl ReadingStreak {
    /// The lazily-created record for a user who has never read.
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            current_streak: 0,
            longest_streak: 0,
            last_read_date: None,
        }
    }
}

/// Minutes and pages attributed to one UTC calendar day. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayAllocation {
    pub day: DayKey,
    pub minutes: u32,
    pub pages: u32,
}

/// One row of a monthly report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyStats {
    pub day: DayKey,
    pub pages_read: u64,
    pub minutes_read: u64,
    pub session_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DailyStats>,
    pub total_pages_read: u64,
    pub total_minutes_read: u64,
    pub session_count: u64,
}

/// All-time totals for a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadingSummary {
    pub total_pages_read: u64,
    pub total_minutes_read: u64,
    pub session_count: u64,
}

/// A page of results plus the numbers needed to render pagination.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            0
        } else {
            self.total.div_ceil(u64::from(self.limit))
        }
    }
}

// Represents a user - used throughout app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}
