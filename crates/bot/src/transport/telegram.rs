//! Telegram Bot API adapter.
//!
//! A thin JSON/HTTP binding for the handful of primitives the
//! conversation layer needs: sendMessage, editMessageText, deleteMessage,
//! and a long-polling getUpdates source. Formatting and layout concerns
//! stay out - messages are plain text plus keyboards.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use tandir_core::ChatId;

use super::{ChatTransport, InlineButton, MessageId, OutgoingMessage, ReplyMarkup, TransportError};
use crate::conversation::ChatEvent;

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramTransport {
    client: Client,
    api_base: String,
}

impl TelegramTransport {
    /// Create an adapter for a bot token.
    #[must_use]
    pub fn new(client: Client, bot_token: &SecretString) -> Self {
        Self {
            client,
            api_base: format!("https://api.telegram.org/bot{}", bot_token.expose_secret()),
        }
    }

    async fn call(&self, method: &str, body: &Value) -> Result<Value, TransportError> {
        let url = format!("{}/{method}", self.api_base);
        let response = self.client.post(&url).json(body).send().await?;
        let payload: Value = response.json().await?;

        if payload.get("ok").and_then(Value::as_bool) == Some(true) {
            Ok(payload.get("result").cloned().unwrap_or(Value::Null))
        } else {
            let description = payload
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_owned();
            Err(TransportError::Api { description })
        }
    }

    /// Long-poll for updates after `offset`.
    ///
    /// Button presses are acknowledged here (answerCallbackQuery) so the
    /// client stops showing a spinner regardless of what the conversation
    /// does with the event. Returns decoded events plus the next offset.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the poll itself fails; malformed
    /// updates inside a successful poll are skipped with a warning.
    pub async fn poll_updates(
        &self,
        offset: i64,
        timeout_secs: u16,
    ) -> Result<(Vec<(ChatId, ChatEvent)>, i64), TransportError> {
        let body = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        let result = self.call("getUpdates", &body).await?;

        let mut events = Vec::new();
        let mut next_offset = offset;

        for update in result.as_array().map(Vec::as_slice).unwrap_or_default() {
            if let Some(update_id) = update.get("update_id").and_then(Value::as_i64) {
                next_offset = next_offset.max(update_id + 1);
            }

            match decode_update(update) {
                Some((chat, event, callback_id)) => {
                    if let Some(callback_id) = callback_id {
                        let ack = json!({ "callback_query_id": callback_id });
                        if let Err(e) = self.call("answerCallbackQuery", &ack).await {
                            tracing::debug!(error = %e, "failed to answer callback query");
                        }
                    }
                    events.push((chat, event));
                }
                None => tracing::warn!(?update, "skipping undecodable update"),
            }
        }

        Ok((events, next_offset))
    }
}

/// Decode one update into `(chat, event, callback id to acknowledge)`.
fn decode_update(update: &Value) -> Option<(ChatId, ChatEvent, Option<String>)> {
    if let Some(callback) = update.get("callback_query") {
        let chat = callback
            .get("from")
            .and_then(|f| f.get("id"))
            .and_then(Value::as_i64)?;
        let payload = callback.get("data").and_then(Value::as_str)?.to_owned();
        let callback_id = callback
            .get("id")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);
        return Some((ChatId::new(chat), ChatEvent::Button { payload }, callback_id));
    }

    let message = update.get("message")?;
    let chat = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(Value::as_i64)?;
    let chat = ChatId::new(chat);

    if let Some(contact) = message.get("contact") {
        let phone = contact
            .get("phone_number")
            .and_then(Value::as_str)?
            .to_owned();
        let first_name = contact
            .get("first_name")
            .and_then(Value::as_str)
            .map(ToOwned::to_owned);
        return Some((chat, ChatEvent::Contact { phone, first_name }, None));
    }

    if let Some(location) = message.get("location") {
        let latitude = location.get("latitude").and_then(Value::as_f64)?;
        let longitude = location.get("longitude").and_then(Value::as_f64)?;
        return Some((
            chat,
            ChatEvent::Location {
                latitude,
                longitude,
            },
            None,
        ));
    }

    let text = message.get("text").and_then(Value::as_str)?.to_owned();
    let first_name = message
        .get("from")
        .and_then(|f| f.get("first_name"))
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);
    Some((chat, ChatEvent::Text { text, first_name }, None))
}

/// Render our markup model as Telegram's `reply_markup` JSON.
fn markup_json(markup: &ReplyMarkup) -> Value {
    match markup {
        ReplyMarkup::Inline(rows) => {
            let rows: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|InlineButton { label, payload }| {
                            json!({ "text": label, "callback_data": payload })
                        })
                        .collect()
                })
                .collect();
            json!({ "inline_keyboard": rows })
        }
        ReplyMarkup::Persistent(rows) => json!({
            "keyboard": rows
                .iter()
                .map(|row| row.iter().map(|label| json!({ "text": label })).collect::<Vec<_>>())
                .collect::<Vec<_>>(),
            "resize_keyboard": true,
        }),
        ReplyMarkup::RequestContact(label) => json!({
            "keyboard": [[{ "text": label, "request_contact": true }]],
            "resize_keyboard": true,
            "one_time_keyboard": true,
        }),
        ReplyMarkup::RequestLocation(label) => json!({
            "keyboard": [[{ "text": label, "request_location": true }]],
            "resize_keyboard": true,
            "one_time_keyboard": true,
        }),
        ReplyMarkup::Remove => json!({ "remove_keyboard": true }),
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_message(
        &self,
        chat: ChatId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TransportError> {
        let mut body = json!({
            "chat_id": chat.as_i64(),
            "text": message.text,
        });
        if let Some(markup) = &message.markup {
            body["reply_markup"] = markup_json(markup);
        }

        let result = self.call("sendMessage", &body).await?;
        let message_id = result
            .get("message_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| TransportError::Api {
                description: "sendMessage result missing message_id".to_owned(),
            })?;
        Ok(MessageId(message_id))
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message_id: MessageId,
        message: OutgoingMessage,
    ) -> Result<(), TransportError> {
        let mut body = json!({
            "chat_id": chat.as_i64(),
            "message_id": message_id.0,
            "text": message.text,
        });
        // editMessageText only accepts inline keyboards.
        if let Some(markup @ ReplyMarkup::Inline(_)) = &message.markup {
            body["reply_markup"] = markup_json(markup);
        }

        self.call("editMessageText", &body).await?;
        Ok(())
    }

    async fn delete_message(
        &self,
        chat: ChatId,
        message_id: MessageId,
    ) -> Result<(), TransportError> {
        let body = json!({
            "chat_id": chat.as_i64(),
            "message_id": message_id.0,
        });
        self.call("deleteMessage", &body).await?;
        Ok(())
    }
}
