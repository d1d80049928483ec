//! services/api/src/web/sessions.rs
//!
//! Reading-session and streak endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use reading_tracker_core::domain::{NewReadingSession, ReadingSession, ReadingStreak, SessionType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::extract::{ApiJson, ApiQuery};
use crate::web::rest::{PageMeta, PaginationQuery};
use crate::web::state::{AppState, AuthUser};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionTypeDto {
    Free,
    Pomodoro,
}

impl From<SessionTypeDto> for SessionType {
    fn from(dto: SessionTypeDto) -> Self {
        match dto {
            SessionTypeDto::Free => SessionType::Free,
            SessionTypeDto::Pomodoro => SessionType::Pomodoro,
        }
    }
}

impl From<SessionType> for SessionTypeDto {
    fn from(session_type: SessionType) -> Self {
        match session_type {
            SessionType::Free => SessionTypeDto::Free,
            SessionType::Pomodoro => SessionTypeDto::Pomodoro,
        }
    }
}

/// A session submitted by the client. `started_at` defaults to the time of the request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    #[serde(rename = "type")]
    pub session_type: SessionTypeDto,
    pub duration_minutes: u32,
    #[serde(default)]
    pub pages_read: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl CreateSessionRequest {
    fn into_new_session(self, now: DateTime<Utc>) -> NewReadingSession {
        NewReadingSession {
            session_type: self.session_type.into(),
            started_at: self.started_at.unwrap_or(now),
            ended_at: self.ended_at,
            duration_minutes: self.duration_minutes,
            pages_read: self.pages_read,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingSessionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub session_type: SessionTypeDto,
    pub duration_minutes: u32,
    pub pages_read: u32,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ReadingSession> for ReadingSessionResponse {
    fn from(session: ReadingSession) -> Self {
        Self {
            id: session.id,
            user_id: session.user_id,
            session_type: session.session_type.into(),
            duration_minutes: session.duration_minutes,
            pages_read: session.pages_read,
            started_at: session.started_at,
            ended_at: session.ended_at,
            created_at: session.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListSessionsResponse {
    pub data: Vec<ReadingSessionResponse>,
    pub meta: PageMeta,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StreakResponse {
    pub user_id: Uuid,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_read_date: Option<DateTime<Utc>>,
}

impl From<ReadingStreak> for StreakResponse {
    fn from(streak: ReadingStreak) -> Self {
        Self {
            user_id: streak.user_id,
            current_streak: streak.current_streak,
            longest_streak: streak.longest_streak,
            last_read_date: streak.last_read_date,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Record a reading session and update the caller's streak.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session recorded", body = ReadingSessionResponse),
        (status = 400, description = "Future, too-old or inverted session dates"),
        (status = 401, description = "Not logged in"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiJson(req): ApiJson<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let now = Utc::now();
    let (session, _streak) = state
        .reading
        .record_session(user_id, req.into_new_session(now), now)
        .await?;

    Ok((StatusCode::CREATED, Json(ReadingSessionResponse::from(session))))
}

/// List the caller's sessions, newest first.
#[utoipa::path(
    get,
    path = "/sessions",
    params(PaginationQuery),
    responses(
        (status = 200, description = "A page of sessions", body = ListSessionsResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<PaginationQuery>,
) -> Result<Json<ListSessionsResponse>, ApiError> {
    let page = state
        .reading
        .list_sessions(user_id, query.page, query.limit)
        .await?;

    let meta = PageMeta::of(&page);
    Ok(Json(ListSessionsResponse {
        data: page.items.into_iter().map(ReadingSessionResponse::from).collect(),
        meta,
    }))
}

/// The caller's reading streak.
#[utoipa::path(
    get,
    path = "/streak",
    responses(
        (status = 200, description = "Current streak", body = StreakResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn get_streak_handler(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<StreakResponse>, ApiError> {
    let streak = state.reading.streak(user_id).await?;
    Ok(Json(streak.into()))
}
