//! Request authentication.
//!
//! Access tokens are HS256 JWTs minted by the external credential
//! service; this crate shares the signing secret and only *validates*.
//! Staff endpoints (order status transitions) use a separate shared
//! token instead of a user credential.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use tandir_core::UserId;

use crate::error::AppError;
use crate::state::AppState;

/// JWT claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Backend user id.
    pub sub: i64,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// The authenticated user behind a bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing authorization header".to_owned()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("expected a bearer token".to_owned()))?;

        let user_id = verify_access_token(token, &state.config().access_token_secret)?;
        Ok(Self(user_id))
    }
}

/// Marker extractor for staff-only endpoints.
///
/// Checks the `X-Staff-Token` header against the configured shared token.
#[derive(Debug, Clone, Copy)]
pub struct StaffAuth;

impl FromRequestParts<AppState> for StaffAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let supplied = parts
            .headers
            .get("x-staff-token")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing staff token".to_owned()))?;

        if supplied != state.config().staff_token.expose_secret() {
            return Err(AppError::Unauthorized("invalid staff token".to_owned()));
        }

        Ok(Self)
    }
}

/// Validate a bearer token and extract the user id.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` for expired, malformed, or
/// wrongly-signed tokens.
pub fn verify_access_token(token: &str, secret: &SecretString) -> Result<UserId, AppError> {
    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    let data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| AppError::Unauthorized(format!("invalid access token: {e}")))?;

    Ok(UserId::new(data.claims.sub))
}

/// Mint an access token with the shared secret.
///
/// Token issuance belongs to the external credential service; this helper
/// exists for local development and the integration-test suite.
///
/// # Errors
///
/// Returns `AppError::Internal` if signing fails.
pub fn sign_access_token(
    user_id: UserId,
    secret: &SecretString,
    ttl: chrono::Duration,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: user_id.as_i64(),
        exp: (chrono::Utc::now() + ttl).timestamp(),
    };
    let key = EncodingKey::from_secret(secret.expose_secret().as_bytes());

    encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::from("a-long-signing-secret-for-tests-only")
    }

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let token =
            sign_access_token(UserId::new(7), &secret(), chrono::Duration::minutes(5)).unwrap();
        let user_id = verify_access_token(&token, &secret()).unwrap();
        assert_eq!(user_id, UserId::new(7));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token =
            sign_access_token(UserId::new(7), &secret(), chrono::Duration::minutes(-5)).unwrap();
        assert!(verify_access_token(&token, &secret()).is_err());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token =
            sign_access_token(UserId::new(7), &secret(), chrono::Duration::minutes(5)).unwrap();
        let other = SecretString::from("a-different-signing-secret-entirely");
        assert!(verify_access_token(&token, &other).is_err());
    }
}
