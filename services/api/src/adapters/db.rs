//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! `ReadingStore` and `UserStore` ports from the core crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reading_tracker_core::domain::{
    NewReadingSession, ReadingSession, ReadingStreak, ReadingSummary, SessionType, User, UserCredentials,
};
use reading_tracker_core::ports::{PortError, PortResult, ReadingStore, ReadingTransaction, UserStore};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

const SESSION_COLUMNS: &str =
    "id, user_id, session_type, started_at, ended_at, duration_minutes, pages_read, created_at";
const STREAK_COLUMNS: &str = "user_id, current_streak, longest_streak, last_read_date";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

/// The Postgres unit of work behind `ReadingTransaction`. Rolls back on drop.
pub struct DbTransaction {
    tx: Transaction<'static, Postgres>,
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn to_db_int(value: u32, field: &str) -> PortResult<i32> {
    i32::try_from(value).map_err(|_| PortError::Unexpected(format!("{} out of range: {}", field, value)))
}

fn from_db_int(value: i32, field: &str) -> PortResult<u32> {
    u32::try_from(value).map_err(|_| PortError::Unexpected(format!("Stored {} is negative: {}", field, value)))
}

fn from_db_count(value: i64, field: &str) -> PortResult<u64> {
    u64::try_from(value).map_err(|_| PortError::Unexpected(format!("Stored {} is negative: {}", field, value)))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct ReadingSessionRecord {
    id: Uuid,
    user_id: Uuid,
    session_type: String,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    duration_minutes: i32,
    pages_read: i32,
    created_at: DateTime<Utc>,
}
impl ReadingSessionRecord {
    fn to_domain(self) -> PortResult<ReadingSession> {
        let session_type = self
            .session_type
            .parse::<SessionType>()
            .map_err(PortError::Unexpected)?;
        Ok(ReadingSession {
            id: self.id,
            user_id: self.user_id,
            session_type,
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration_minutes: from_db_int(self.duration_minutes, "duration_minutes")?,
            pages_read: from_db_int(self.pages_read, "pages_read")?,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct StreakRecord {
    user_id: Uuid,
    current_streak: i32,
    longest_streak: i32,
    last_read_date: Option<DateTime<Utc>>,
}
impl StreakRecord {
    fn to_domain(self) -> PortResult<ReadingStreak> {
        Ok(ReadingStreak {
            user_id: self.user_id,
            current_streak: from_db_int(self.current_streak, "current_streak")?,
            longest_streak: from_db_int(self.longest_streak, "longest_streak")?,
            last_read_date: self.last_read_date,
        })
    }
}

#[derive(FromRow)]
struct SummaryRecord {
    total_pages: i64,
    total_minutes: i64,
    session_count: i64,
}

//=========================================================================================
// `ReadingStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReadingStore for DbAdapter {
    async fn begin(&self) -> PortResult<Box<dyn ReadingTransaction>> {
        let tx = self.pool.begin().await.map_err(unexpected)?;
        Ok(Box::new(DbTransaction { tx }))
    }

    async fn get_or_create_streak(&self, user_id: Uuid) -> PortResult<ReadingStreak> {
        sqlx::query("INSERT INTO reading_streaks (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        let record = sqlx::query_as::<_, StreakRecord>(&format!(
            "SELECT {} FROM reading_streaks WHERE user_id = $1",
            STREAK_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Streak for user {} not found", user_id)),
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn list_sessions(
        &self,
        user_id: Uuid,
        offset: u64,
        limit: u32,
    ) -> PortResult<(Vec<ReadingSession>, u64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reading_sessions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        let records = sqlx::query_as::<_, ReadingSessionRecord>(&format!(
            "SELECT {} FROM reading_sessions WHERE user_id = $1 \
             ORDER BY started_at DESC, created_at DESC LIMIT $2 OFFSET $3",
            SESSION_COLUMNS
        ))
        .bind(user_id)
        .bind(i64::from(limit))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let sessions = records
            .into_iter()
            .map(ReadingSessionRecord::to_domain)
            .collect::<PortResult<Vec<_>>>()?;
        Ok((sessions, from_db_count(total, "session count")?))
    }

    async fn sessions_overlapping(
        &self,
        user_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> PortResult<Vec<ReadingSession>> {
        let records = sqlx::query_as::<_, ReadingSessionRecord>(&format!(
            "SELECT {} FROM reading_sessions \
             WHERE user_id = $1 \
               AND started_at < $3 \
               AND COALESCE(ended_at, started_at + make_interval(mins => duration_minutes)) > $2 \
             ORDER BY started_at ASC",
            SESSION_COLUMNS
        ))
        .bind(user_id)
        .bind(window_start)
        .bind(window_end)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        debug!(%user_id, count = records.len(), "Loaded sessions overlapping window");
        records.into_iter().map(ReadingSessionRecord::to_domain).collect()
    }

    async fn summary(&self, user_id: Uuid) -> PortResult<ReadingSummary> {
        let record = sqlx::query_as::<_, SummaryRecord>(
            "SELECT COALESCE(SUM(pages_read), 0)::BIGINT AS total_pages, \
                    COALESCE(SUM(duration_minutes), 0)::BIGINT AS total_minutes, \
                    COUNT(*) AS session_count \
             FROM reading_sessions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(ReadingSummary {
            total_pages_read: from_db_count(record.total_pages, "total_pages")?,
            total_minutes_read: from_db_count(record.total_minutes, "total_minutes")?,
            session_count: from_db_count(record.session_count, "session_count")?,
        })
    }
}

//=========================================================================================
// `ReadingTransaction` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReadingTransaction for DbTransaction {
    async fn lock_streak(&mut self, user_id: Uuid) -> PortResult<ReadingStreak> {
        sqlx::query("INSERT INTO reading_streaks (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await
            .map_err(unexpected)?;

        let record = sqlx::query_as::<_, StreakRecord>(&format!(
            "SELECT {} FROM reading_streaks WHERE user_id = $1 FOR UPDATE",
            STREAK_COLUMNS
        ))
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn insert_session(&mut self, user_id: Uuid, session: &NewReadingSession) -> PortResult<ReadingSession> {
        let record = sqlx::query_as::<_, ReadingSessionRecord>(&format!(
            "INSERT INTO reading_sessions \
             (id, user_id, session_type, started_at, ended_at, duration_minutes, pages_read) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(session.session_type.as_str())
        .bind(session.started_at)
        .bind(session.ended_at)
        .bind(to_db_int(session.duration_minutes, "duration_minutes")?)
        .bind(to_db_int(session.pages_read, "pages_read")?)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn save_streak(&mut self, streak: &ReadingStreak) -> PortResult<()> {
        sqlx::query(
            "UPDATE reading_streaks \
             SET current_streak = $2, longest_streak = $3, last_read_date = $4, updated_at = NOW() \
             WHERE user_id = $1",
        )
        .bind(streak.user_id)
        .bind(to_db_int(streak.current_streak, "current_streak")?)
        .bind(to_db_int(streak.longest_streak, "longest_streak")?)
        .bind(streak.last_read_date)
        .execute(&mut *self.tx)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> PortResult<()> {
        self.tx.commit().await.map_err(unexpected)
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn create_user_with_email(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3) RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                PortError::Conflict(format!("Email {} is already registered", email))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
