//! Credential pair issued at phone verification.
//!
//! The access token is short-lived and attached to backend calls; the
//! refresh token is long-lived and used only to mint new access tokens.
//! A pair is either whole or absent - the type makes a partial pair
//! unrepresentable, which is the invariant the session store relies on.

use serde::{Deserialize, Serialize};

/// An access + refresh token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    access: String,
    refresh: String,
}

impl CredentialPair {
    /// Create a pair from freshly issued tokens.
    #[must_use]
    pub const fn new(access: String, refresh: String) -> Self {
        Self { access, refresh }
    }

    /// The short-lived access token.
    #[must_use]
    pub fn access(&self) -> &str {
        &self.access
    }

    /// The long-lived refresh token.
    #[must_use]
    pub fn refresh(&self) -> &str {
        &self.refresh
    }

    /// Replace the access token after a successful refresh, keeping the
    /// stored refresh token unless the backend rotated it.
    pub fn rotate(&mut self, access: String, refresh: Option<String>) {
        self.access = access;
        if let Some(refresh) = refresh {
            self.refresh = refresh;
        }
    }
}
