//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI document, plus the pagination
//! types shared by list endpoints.

use reading_tracker_core::domain::Page;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::web::{analytics, auth, sessions};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        sessions::create_session_handler,
        sessions::list_sessions_handler,
        sessions::get_streak_handler,
        analytics::summary_handler,
        analytics::monthly_handler,
    ),
    components(
        schemas(
            auth::CredentialsRequest,
            auth::AuthResponse,
            sessions::SessionTypeDto,
            sessions::CreateSessionRequest,
            sessions::ReadingSessionResponse,
            sessions::ListSessionsResponse,
            sessions::StreakResponse,
            analytics::SummaryResponse,
            analytics::DailyStatsResponse,
            analytics::MonthlyReportResponse,
            PageMeta,
        )
    ),
    tags(
        (name = "Reading Tracker API", description = "Reading sessions, streaks and reading analytics.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Pagination
//=========================================================================================

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// 1-based page number. Defaults to 1.
    pub page: Option<u32>,
    /// Page size, 1 to 100. Defaults to 10.
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn of<T>(page: &Page<T>) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages: page.total_pages(),
        }
    }
}
