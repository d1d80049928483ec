//! crates/reading_tracker_core/src/ports.rs
//!
//! Defines the storage contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to stay independent of the concrete database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{NewReadingSession, ReadingSession, ReadingStreak, ReadingSummary, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Reading Storage Ports
//=========================================================================================

#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Opens a unit of work. Dropping it without `commit` rolls everything back.
    async fn begin(&self) -> PortResult<Box<dyn ReadingTransaction>>;

    /// Returns the user's streak, creating the all-zero record on first access.
    async fn get_or_create_streak(&self, user_id: Uuid) -> PortResult<ReadingStreak>;

    /// Newest sessions first, plus the user's total session count.
    async fn list_sessions(
        &self,
        user_id: Uuid,
        offset: u64,
        limit: u32,
    ) -> PortResult<(Vec<ReadingSession>, u64)>;

    /// Sessions whose effective interval intersects `[window_start, window_end)`.
    async fn sessions_overlapping(
        &self,
        user_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> PortResult<Vec<ReadingSession>>;

    async fn summary(&self, user_id: Uuid) -> PortResult<ReadingSummary>;
}

/// One transaction scoped to a single user's session-creation write.
#[async_trait]
pub trait ReadingTransaction: Send {
    /// Loads (creating if needed) and locks the user's streak row until commit or rollback.
    async fn lock_streak(&mut self, user_id: Uuid) -> PortResult<ReadingStreak>;

    async fn insert_session(&mut self, user_id: Uuid, session: &NewReadingSession) -> PortResult<ReadingSession>;

    async fn save_streak(&mut self, streak: &ReadingStreak) -> PortResult<()>;

    async fn commit(self: Box<Self>) -> PortResult<()>;
}

//=========================================================================================
// Account Ports
//=========================================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `PortError::Conflict` if the email is already registered.
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    /// Returns the owning user if the session exists and has not expired.
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;
}
