//! Bot configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TANDIR_BOT_TOKEN` - Chat transport bot token
//! - `TANDIR_API_BASE_URL` - Backend API base URL (e.g., `http://127.0.0.1:8000/`)
//!
//! ## Optional
//! - `TANDIR_BOT_DATABASE_URL` - Session store SQLite URL
//!   (default: `sqlite:tandir-bot.db`)
//! - `TANDIR_POLL_TIMEOUT_SECS` - Long-poll timeout (default: 30)

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Conversational front-end configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Chat transport bot token.
    pub bot_token: SecretString,
    /// Backend API base URL.
    pub api_base_url: Url,
    /// Session store SQLite URL.
    pub session_database_url: String,
    /// Long-poll timeout in seconds.
    pub poll_timeout_secs: u16,
}

impl BotConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let bot_token = SecretString::from(require("TANDIR_BOT_TOKEN")?);

        let api_base_url = require("TANDIR_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TANDIR_API_BASE_URL".to_owned(), e.to_string())
            })?;

        let session_database_url =
            optional("TANDIR_BOT_DATABASE_URL").unwrap_or_else(|| "sqlite:tandir-bot.db".to_owned());

        let poll_timeout_secs = optional("TANDIR_POLL_TIMEOUT_SECS")
            .unwrap_or_else(|| "30".to_owned())
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("TANDIR_POLL_TIMEOUT_SECS".to_owned(), e.to_string())
            })?;

        Ok(Self {
            bot_token,
            api_base_url,
            session_database_url,
            poll_timeout_secs,
        })
    }
}

fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
