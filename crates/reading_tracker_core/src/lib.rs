pub mod allocator;
pub mod calendar;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;
pub mod streak;

pub use calendar::DayKey;
pub use domain::{
    DailyStats, DayAllocation, MonthlyReport, NewReadingSession, Page, ReadingSession, ReadingStreak,
    ReadingSummary, SessionType, User, UserCredentials,
};
pub use error::{DateRejection, ServiceError, ServiceResult};
pub use ports::{PortError, PortResult, ReadingStore, ReadingTransaction, UserStore};
pub use service::ReadingService;
