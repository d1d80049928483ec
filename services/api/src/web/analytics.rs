//! services/api/src/web/analytics.rs
//!
//! Reading totals and the per-day monthly report.

use axum::{extract::State, Extension, Json};
use reading_tracker_core::domain::{DailyStats, MonthlyReport, ReadingSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::error::ApiError;
use crate::web::extract::ApiQuery;
use crate::web::state::{AppState, AuthUser};

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    pub total_pages_read: u64,
    pub total_minutes_read: u64,
    pub session_count: u64,
}

impl From<ReadingSummary> for SummaryResponse {
    fn from(summary: ReadingSummary) -> Self {
        Self {
            total_pages_read: summary.total_pages_read,
            total_minutes_read: summary.total_minutes_read,
            session_count: summary.session_count,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthlyQuery {
    /// Calendar year, 1970 or later.
    pub year: i32,
    /// Month number, 1 to 12.
    pub month: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailyStatsResponse {
    /// UTC calendar day, `YYYY-MM-DD`.
    pub date: String,
    pub pages_read: u64,
    pub minutes_read: u64,
    pub session_count: u64,
}

impl From<DailyStats> for DailyStatsResponse {
    fn from(day: DailyStats) -> Self {
        Self {
            date: day.day.to_string(),
            pages_read: day.pages_read,
            minutes_read: day.minutes_read,
            session_count: day.session_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlyReportResponse {
    pub year: i32,
    pub month: u32,
    pub total_pages_read: u64,
    pub total_minutes_read: u64,
    pub session_count: u64,
    pub days: Vec<DailyStatsResponse>,
}

impl From<MonthlyReport> for MonthlyReportResponse {
    fn from(report: MonthlyReport) -> Self {
        Self {
            year: report.year,
            month: report.month,
            total_pages_read: report.total_pages_read,
            total_minutes_read: report.total_minutes_read,
            session_count: report.session_count,
            days: report.days.into_iter().map(DailyStatsResponse::from).collect(),
        }
    }
}

/// All-time reading totals for the caller.
#[utoipa::path(
    get,
    path = "/analytics/summary",
    responses(
        (status = 200, description = "Reading totals", body = SummaryResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn summary_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let summary = state.reading.summary(user_id).await?;
    Ok(Json(summary.into()))
}

/// Minutes and pages per UTC day for one month. Sessions that cross a day or
/// month boundary are split across the days they overlap.
#[utoipa::path(
    get,
    path = "/analytics/monthly",
    params(MonthlyQuery),
    responses(
        (status = 200, description = "Monthly report", body = MonthlyReportResponse),
        (status = 400, description = "Invalid year or month"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn monthly_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<MonthlyQuery>,
) -> Result<Json<MonthlyReportResponse>, ApiError> {
    let report = state
        .reading
        .monthly_report(user_id, query.year, query.month)
        .await?;
    Ok(Json(report.into()))
}
