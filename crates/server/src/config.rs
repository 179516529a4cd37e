//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TANDIR_DATABASE_URL` - SQLite connection string (e.g., `sqlite:tandir.db`)
//! - `TANDIR_ACCESS_TOKEN_SECRET` - HS256 secret shared with the credential service (min 32 chars)
//! - `TANDIR_STAFF_TOKEN` - Shared token for staff status-transition calls
//!
//! ## Optional
//! - `TANDIR_SERVER_HOST` - Bind address (default: 127.0.0.1)
//! - `TANDIR_SERVER_PORT` - Listen port (default: 8000)
//! - `TANDIR_BOT_TOKEN` - Telegram bot token for outbound notifications
//!   (notifications are disabled when unset)
//! - `TANDIR_UTC_OFFSET_HOURS` - Restaurant timezone offset (default: 5, Tashkent)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use chrono::{FixedOffset, NaiveTime, Utc};
use secrecy::SecretString;
use thiserror::Error;

const MIN_SECRET_LENGTH: usize = 32;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Order backend configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// SQLite connection string.
    pub database_url: String,
    /// IP address to bind the server to.
    pub host: IpAddr,
    /// Port to listen on.
    pub port: u16,
    /// HS256 secret shared with the external credential service.
    pub access_token_secret: SecretString,
    /// Shared token authorizing staff status transitions.
    pub staff_token: SecretString,
    /// Telegram bot token for the notification channel.
    pub bot_token: Option<SecretString>,
    /// Restaurant timezone offset from UTC, in hours.
    pub utc_offset_hours: i32,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if secrets fail the minimum-length check.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = require("TANDIR_DATABASE_URL")?;
        let host = optional("TANDIR_SERVER_HOST")
            .unwrap_or_else(|| "127.0.0.1".to_owned())
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TANDIR_SERVER_HOST".to_owned(), e.to_string())
            })?;
        let port = optional("TANDIR_SERVER_PORT")
            .unwrap_or_else(|| "8000".to_owned())
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TANDIR_SERVER_PORT".to_owned(), e.to_string())
            })?;

        let access_token_secret = require_secret("TANDIR_ACCESS_TOKEN_SECRET")?;
        let staff_token = SecretString::from(require("TANDIR_STAFF_TOKEN")?);
        let bot_token = optional("TANDIR_BOT_TOKEN").map(SecretString::from);

        let utc_offset_hours = optional("TANDIR_UTC_OFFSET_HOURS")
            .unwrap_or_else(|| "5".to_owned())
            .parse::<i32>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TANDIR_UTC_OFFSET_HOURS".to_owned(), e.to_string())
            })?;

        let sentry_dsn = optional("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            access_token_secret,
            staff_token,
            bot_token,
            utc_offset_hours,
            sentry_dsn,
        })
    }

    /// Socket address to bind.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Current wall-clock time in the restaurant's timezone.
    ///
    /// Falls back to UTC if the configured offset is out of range.
    #[must_use]
    pub fn local_now(&self) -> NaiveTime {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).map_or_else(
            || Utc::now().time(),
            |offset| Utc::now().with_timezone(&offset).time(),
        )
    }
}

fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn require_secret(name: &str) -> Result<SecretString, ConfigError> {
    let value = require(name)?;
    if value.len() < MIN_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            name.to_owned(),
            format!("must be at least {MIN_SECRET_LENGTH} characters"),
        ));
    }
    Ok(SecretString::from(value))
}
