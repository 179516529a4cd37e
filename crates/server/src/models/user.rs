//! Backend user record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tandir_core::{ChatId, Locale, PhoneNumber, UserId};

/// A registered customer.
///
/// Rows are created by the external credential-issuance service at
/// registration time; this crate only reads them (ownership checks,
/// notification addressing).
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    /// Chat transport identity used for notification delivery.
    pub chat_id: ChatId,
    pub phone: PhoneNumber,
    pub first_name: String,
    pub last_name: Option<String>,
    pub locale: Locale,
    /// False until the account's phone has been verified.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
