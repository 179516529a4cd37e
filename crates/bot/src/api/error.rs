//! Tagged failure taxonomy for backend calls.

use thiserror::Error;

/// Every expected way a backend call can fail.
///
/// The conversation state machine is the single consumer: it decides
/// user-visible wording and the resulting transition from the tag alone.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Credentials missing, expired beyond refresh, or rejected twice.
    /// The gateway has already cleared the stored pair when this is
    /// returned.
    #[error("unauthorized: {detail}")]
    Unauthorized { detail: String },

    /// The referenced entity no longer exists.
    #[error("not found: {detail}")]
    NotFound { detail: String },

    /// Caller-fixable input problem (4xx with structured detail).
    #[error("validation error: {detail}")]
    Validation { detail: String, status: u16 },

    /// Backend-side failure (5xx).
    #[error("server error: {detail}")]
    Server { detail: String, status: u16 },

    /// The backend did not answer in time.
    #[error("timeout: {detail}")]
    Timeout { detail: String },

    /// The backend could not be reached at all.
    #[error("network error: {detail}")]
    Network { detail: String },
}

impl ApiError {
    /// The human-readable detail string.
    #[must_use]
    pub fn detail(&self) -> &str {
        match self {
            Self::Unauthorized { detail }
            | Self::NotFound { detail }
            | Self::Validation { detail, .. }
            | Self::Server { detail, .. }
            | Self::Timeout { detail }
            | Self::Network { detail } => detail,
        }
    }

    /// The original HTTP status, where one was observed.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::Validation { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Timeout { .. } | Self::Network { .. } => None,
        }
    }

    /// Whether the failure is transient (retry-later class).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Server { .. } | Self::Timeout { .. } | Self::Network { .. }
        )
    }
}
