//! Durable per-identity session store.
//!
//! One row per chat identity holding locale, the credential pair, and the
//! serialized conversation state. The store is the bot's own embedded
//! SQLite database, independent of the backend's - a restarted process
//! resumes every conversation exactly where its user left off.
//!
//! Credentials obey the both-or-neither invariant: a row with only one
//! token half (which can only mean corruption) is loaded as
//! unauthenticated and the halves are dropped on the next save.

use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use tandir_core::{ChatId, CredentialPair, Locale};

use crate::conversation::ConversationState;

/// Errors from the session store.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Underlying database failure.
    #[error("session database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored conversation state failed to deserialize.
    #[error("corrupt session state: {0}")]
    CorruptState(#[from] serde_json::Error),
}

/// A user's durable conversation session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub identity: ChatId,
    /// None until the user has picked a language.
    pub locale: Option<Locale>,
    pub credentials: Option<CredentialPair>,
    pub state: ConversationState,
}

impl Session {
    /// Fresh session for a first-time identity.
    #[must_use]
    pub const fn new(identity: ChatId) -> Self {
        Self {
            identity,
            locale: None,
            credentials: None,
            state: ConversationState::Ended,
        }
    }

    /// The effective locale, falling back to the default.
    #[must_use]
    pub fn locale(&self) -> Locale {
        self.locale.unwrap_or_default()
    }

    /// Whether a credential pair is on file.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    identity: i64,
    locale: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    state: String,
}

/// Keyed durable store over the bot's own SQLite database.
#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    /// Open the store and ensure its schema exists.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Database` if the database cannot be opened.
    pub async fn open(database_url: &str) -> Result<Self, SessionError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS sessions (
                identity INTEGER PRIMARY KEY,
                locale TEXT,
                access_token TEXT,
                refresh_token TEXT,
                state TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Load the session for an identity, creating a default one if absent.
    ///
    /// The default is not persisted by a read; it exists once `save` runs.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` on database failure or a corrupt stored state.
    pub async fn get(&self, identity: ChatId) -> Result<Session, SessionError> {
        let row = sqlx::query_as::<_, SessionRow>(
            "SELECT identity, locale, access_token, refresh_token, state FROM sessions WHERE identity = ?",
        )
        .bind(identity.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(Session::new(identity));
        };

        let credentials = match (row.access_token, row.refresh_token) {
            (Some(access), Some(refresh)) => Some(CredentialPair::new(access, refresh)),
            (None, None) => None,
            _ => {
                tracing::warn!(%identity, "partial credential pair in store, treating as unauthenticated");
                None
            }
        };

        Ok(Session {
            identity: ChatId::new(row.identity),
            locale: row.locale.as_deref().map(Locale::from_code),
            credentials,
            state: serde_json::from_str(&row.state)?,
        })
    }

    /// Persist the session, overwriting any previous row.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` on database failure.
    pub async fn save(&self, session: &Session) -> Result<(), SessionError> {
        let state = serde_json::to_string(&session.state)?;

        sqlx::query(
            r"
            INSERT INTO sessions (identity, locale, access_token, refresh_token, state, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (identity) DO UPDATE SET
                locale = excluded.locale,
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                state = excluded.state,
                updated_at = excluded.updated_at
            ",
        )
        .bind(session.identity.as_i64())
        .bind(session.locale.map(|l| l.code()))
        .bind(session.credentials.as_ref().map(|c| c.access().to_owned()))
        .bind(session.credentials.as_ref().map(|c| c.refresh().to_owned()))
        .bind(state)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Drop the stored credential pair for an identity.
    ///
    /// Everything else about the session (locale, state) survives.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` on database failure.
    pub async fn clear_credentials(&self, identity: ChatId) -> Result<(), SessionError> {
        sqlx::query(
            "UPDATE sessions SET access_token = NULL, refresh_token = NULL, updated_at = ? WHERE identity = ?",
        )
        .bind(Utc::now())
        .bind(identity.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
