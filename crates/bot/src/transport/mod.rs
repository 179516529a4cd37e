//! Chat transport seam.
//!
//! The transport's delivery primitives are an external collaborator; the
//! conversation layer only knows the [`ChatTransport`] trait. A thin
//! Telegram Bot API adapter lives in [`telegram`]; tests use a recording
//! fake.

pub mod telegram;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tandir_core::ChatId;

/// Identifier of a delivered message, for later edits/deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One inline action button carrying an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub payload: String,
}

impl InlineButton {
    /// Convenience constructor.
    #[must_use]
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// Keyboard attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMarkup {
    /// Rows of inline action buttons.
    Inline(Vec<Vec<InlineButton>>),
    /// Persistent keyboard of plain-text commands.
    Persistent(Vec<Vec<String>>),
    /// One button requesting the user's contact card.
    RequestContact(String),
    /// One button requesting the user's location.
    RequestLocation(String),
    /// Remove any persistent keyboard.
    Remove,
}

/// An outgoing chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    pub markup: Option<ReplyMarkup>,
}

impl OutgoingMessage {
    /// Plain text, no keyboard.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: None,
        }
    }

    /// Text with a keyboard.
    #[must_use]
    pub fn with_markup(text: impl Into<String>, markup: ReplyMarkup) -> Self {
        Self {
            text: text.into(),
            markup: Some(markup),
        }
    }
}

/// Errors from the chat transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport returned an error response.
    #[error("transport error: {description}")]
    Api { description: String },
}

/// Black-box delivery primitives required from the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a message, returning its id for later edits.
    async fn send_message(
        &self,
        chat: ChatId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TransportError>;

    /// Replace a previously sent message's text and inline keyboard.
    async fn edit_message(
        &self,
        chat: ChatId,
        message_id: MessageId,
        message: OutgoingMessage,
    ) -> Result<(), TransportError>;

    /// Delete a previously sent message.
    async fn delete_message(
        &self,
        chat: ChatId,
        message_id: MessageId,
    ) -> Result<(), TransportError>;
}
