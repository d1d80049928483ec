//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use reading_tracker_core::service::DEFAULT_MAX_BACKDATE_DAYS;
use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

pub const DEFAULT_AUTH_SESSION_TTL_DAYS: u32 = 30;
pub const MAX_AUTH_SESSION_TTL_DAYS: u32 = 365;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub max_backdate_days: u32,
    pub auth_session_ttl_days: u32,
    pub cors_allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address: parse_or(&lookup, "BIND_ADDRESS", "0.0.0.0:3000".parse().ok())?,
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", Some(5))?,
            log_level,
            max_backdate_days: parse_or(&lookup, "MAX_BACKDATE_DAYS", Some(DEFAULT_MAX_BACKDATE_DAYS))?,
            auth_session_ttl_days: auth_session_ttl_days(&lookup)?,
            cors_allowed_origin: lookup("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
        })
    }
}

/// Session lifetime in days, limited to `1..=MAX_AUTH_SESSION_TTL_DAYS`.
fn auth_session_ttl_days<F>(lookup: &F) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let days: u32 = parse_or(lookup, "AUTH_SESSION_TTL_DAYS", Some(DEFAULT_AUTH_SESSION_TTL_DAYS))?;
    if !(1..=MAX_AUTH_SESSION_TTL_DAYS).contains(&days) {
        return Err(ConfigError::InvalidValue(
            "AUTH_SESSION_TTL_DAYS".to_string(),
            format!("{} is outside 1..={}", days, MAX_AUTH_SESSION_TTL_DAYS),
        ));
    }
    Ok(days)
}

/// Parses `key` if present, otherwise falls back to `default`.
fn parse_or<F, T>(lookup: &F, key: &str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => default.ok_or_else(|| ConfigError::MissingVar(key.to_string())),
    }
}
