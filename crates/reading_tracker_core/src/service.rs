//! crates/reading_tracker_core/src/service.rs
//!
//! Orchestrates the storage ports around the pure allocator and streak tracker.
//! Every time-dependent call takes `now` explicitly.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::allocator::attribute_session;
use crate::calendar::{days_between, month_window, utc_day, DayKey};
use crate::domain::{
    DailyStats, MonthlyReport, NewReadingSession, Page, ReadingSession, ReadingStreak, ReadingSummary,
};
use crate::error::{DateRejection, ServiceError, ServiceResult};
use crate::ports::ReadingStore;
use crate::streak;

pub const DEFAULT_MAX_BACKDATE_DAYS: u32 = 30;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct ReadingService {
    store: Arc<dyn ReadingStore>,
    max_backdate_days: u32,
}

impl ReadingService {
    pub fn new(store: Arc<dyn ReadingStore>, max_backdate_days: u32) -> Self {
        Self {
            store,
            max_backdate_days,
        }
    }

    /// Date-range sanity for a submitted session. Runs before any write.
    pub fn validate_new_session(
        &self,
        session: &NewReadingSession,
        now: DateTime<Utc>,
    ) -> ServiceResult<()> {
        if session.duration_minutes == 0 {
            return Err(ServiceError::InvalidInput(
                "duration_minutes must be positive".to_string(),
            ));
        }
        if let Some(ended_at) = session.ended_at {
            if ended_at < session.started_at {
                return Err(DateRejection::InvertedRange.into());
            }
        }

        streak::validate_effective_date(session.started_at, now)?;
        streak::validate_effective_date(session.ended_at.unwrap_or(session.started_at), now)?;

        if days_between(utc_day(now), utc_day(session.started_at)) > i64::from(self.max_backdate_days) {
            return Err(DateRejection::TooFarInPast {
                max_days: self.max_backdate_days,
            }
            .into());
        }
        Ok(())
    }

    /// Persists a session and folds it into the user's streak in one transaction.
    ///
    /// On any failure the transaction is dropped uncommitted, so neither the
    /// session nor the streak change is kept.
    pub async fn record_session(
        &self,
        user_id: Uuid,
        session: NewReadingSession,
        now: DateTime<Utc>,
    ) -> ServiceResult<(ReadingSession, ReadingStreak)> {
        if let Err(e) = self.validate_new_session(&session, now) {
            warn!(%user_id, "Rejected reading session: {}", e);
            return Err(e);
        }

        let mut tx = self.store.begin().await?;
        let prior = tx.lock_streak(user_id).await?;
        let created = tx.insert_session(user_id, &session).await?;
        let updated = streak::apply_session(&prior, created.started_at, created.ended_at, now)?;
        tx.save_streak(&updated).await?;
        tx.commit().await?;

        info!(
            %user_id,
            session_id = %created.id,
            current_streak = updated.current_streak,
            "Recorded reading session"
        );
        Ok((created, updated))
    }

    pub async fn streak(&self, user_id: Uuid) -> ServiceResult<ReadingStreak> {
        Ok(self.store.get_or_create_streak(user_id).await?)
    }

    /// Newest first. `page` starts at 1; `limit` is clamped to `1..=MAX_PAGE_SIZE`.
    pub async fn list_sessions(
        &self,
        user_id: Uuid,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> ServiceResult<Page<ReadingSession>> {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = limit
            .filter(|l| *l >= 1)
            .map_or(DEFAULT_PAGE_SIZE, |l| l.min(MAX_PAGE_SIZE));
        let offset = u64::from(page - 1) * u64::from(limit);

        let (items, total) = self.store.list_sessions(user_id, offset, limit).await?;
        Ok(Page {
            items,
            page,
            limit,
            total,
        })
    }

    pub async fn summary(&self, user_id: Uuid) -> ServiceResult<ReadingSummary> {
        Ok(self.store.summary(user_id).await?)
    }

    pub async fn monthly_report(&self, user_id: Uuid, year: i32, month: u32) -> ServiceResult<MonthlyReport> {
        let (window_start, window_end) = month_window(year, month)?;
        let sessions = self
            .store
            .sessions_overlapping(user_id, window_start, window_end)
            .await?;
        debug!(%user_id, year, month, sessions = sessions.len(), "Building monthly report");
        Ok(build_monthly_report(year, month, &sessions, window_start, window_end))
    }
}

/// Merges the per-day attribution of every session into one report for the window.
pub fn build_monthly_report(
    year: i32,
    month: u32,
    sessions: &[ReadingSession],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> MonthlyReport {
    let mut buckets: BTreeMap<DayKey, DailyStats> = BTreeMap::new();
    let mut session_count = 0;

    for session in sessions {
        let allocations: Vec<_> = attribute_session(session, window_start, window_end)
            .into_iter()
            .filter(|a| a.minutes > 0 || a.pages > 0)
            .collect();
        if allocations.is_empty() {
            continue;
        }
        session_count += 1;

        for allocation in allocations {
            let bucket = buckets.entry(allocation.day).or_insert(DailyStats {
                day: allocation.day,
                pages_read: 0,
                minutes_read: 0,
                session_count: 0,
            });
            bucket.pages_read += u64::from(allocation.pages);
            bucket.minutes_read += u64::from(allocation.minutes);
            bucket.session_count += 1;
        }
    }

    let days: Vec<DailyStats> = buckets.into_values().collect();
    MonthlyReport {
        year,
        month,
        total_pages_read: days.iter().map(|d| d.pages_read).sum(),
        total_minutes_read: days.iter().map(|d| d.minutes_read).sum(),
        session_count,
        days,
    }
}
