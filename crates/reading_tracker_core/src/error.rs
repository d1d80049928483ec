//! crates/reading_tracker_core/src/error.rs
//!
//! Validation and orchestration errors raised by the core.

use crate::ports::PortError;

/// A deterministic temporal-validation failure. Never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DateRejection {
    #[error("Session date cannot be in the future")]
    FutureDate,
    #[error("Session date cannot be more than {max_days} days in the past")]
    TooFarInPast { max_days: u32 },
    #[error("ended_at cannot be before started_at")]
    InvertedRange,
    #[error("Invalid month {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
}

impl DateRejection {
    /// A stable machine-readable code surfaced to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            DateRejection::FutureDate => "FUTURE_DATE",
            DateRejection::TooFarInPast { .. } => "TOO_FAR_IN_PAST",
            DateRejection::InvertedRange => "INVERTED_RANGE",
            DateRejection::InvalidMonth { .. } => "INVALID_MONTH",
        }
    }
}

/// Errors returned by [`crate::service::ReadingService`].
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Rejected(#[from] DateRejection),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Port(#[from] PortError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
