//! Order status notifications.
//!
//! When an order's status genuinely changes (creation and no-op writes
//! excluded), the user on file is told through the outbound notification
//! channel. Delivery is strictly best-effort: a failed send is logged and
//! swallowed, never allowed to fail or roll back the status write that
//! triggered it.
//!
//! The notifier is called explicitly by the route handlers *after* a
//! committed write - there are no implicit persistence hooks.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use sqlx::SqlitePool;

use tandir_core::{ChatId, Locale, OrderId, OrderStatus};

use crate::db::UserRepository;
use crate::models::Order;

/// Errors from the outbound notification channel.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel returned an error response.
    #[error("channel error: {status} - {message}")]
    Channel { status: u16, message: String },
}

/// The outbound push channel - the excluded external collaborator's seam.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Push a plain-text message to a chat identity.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), NotifyError>;
}

/// Telegram Bot API channel.
#[derive(Clone)]
pub struct TelegramChannel {
    client: Client,
    send_url: String,
}

impl TelegramChannel {
    /// Create a channel from a bot token.
    #[must_use]
    pub fn new(client: Client, bot_token: &SecretString) -> Self {
        let send_url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            bot_token.expose_secret()
        );
        Self { client, send_url }
    }
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), NotifyError> {
        let body = serde_json::json!({
            "chat_id": chat_id.as_i64(),
            "text": text,
        });

        let response = self.client.post(&self.send_url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Channel {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Channel used when no bot token is configured. Every send is dropped
/// with a debug log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledChannel;

#[async_trait]
impl NotificationChannel for DisabledChannel {
    async fn send_text(&self, chat_id: ChatId, _text: &str) -> Result<(), NotifyError> {
        tracing::debug!(%chat_id, "notification channel disabled, dropping message");
        Ok(())
    }
}

/// Composes and pushes order-status notifications.
#[derive(Clone)]
pub struct OrderNotifier {
    channel: Arc<dyn NotificationChannel>,
}

impl OrderNotifier {
    /// Create a notifier over the given channel.
    #[must_use]
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self { channel }
    }

    /// Notify the order's user about a committed status change.
    ///
    /// Skips silently when the user no longer exists. Send failures are
    /// logged at warn level and swallowed.
    pub async fn order_status_changed(
        &self,
        pool: &SqlitePool,
        order: &Order,
        previous: OrderStatus,
    ) {
        let Some(user_id) = order.user_id else {
            tracing::debug!(order_id = %order.id, "status changed but order has no user, skipping notification");
            return;
        };

        let user = match UserRepository::new(pool).get_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::debug!(order_id = %order.id, "status changed but user is gone, skipping notification");
                return;
            }
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "failed to load user for notification");
                return;
            }
        };

        let text = status_message(order.id, order.status, user.locale);

        if let Err(e) = self.channel.send_text(user.chat_id, &text).await {
            tracing::warn!(
                order_id = %order.id,
                chat_id = %user.chat_id,
                error = %e,
                "failed to deliver status notification"
            );
        } else {
            tracing::info!(
                order_id = %order.id,
                from = %previous,
                to = %order.status,
                "status notification delivered"
            );
        }
    }
}

/// Human-readable status name per locale.
#[must_use]
pub fn status_label(status: OrderStatus, locale: Locale) -> &'static str {
    match (locale, status) {
        (Locale::Uz, OrderStatus::New) => "Yangi",
        (Locale::Uz, OrderStatus::Preparing) => "Tayyorlanmoqda",
        (Locale::Uz, OrderStatus::OnTheWay) => "Yo'lda",
        (Locale::Uz, OrderStatus::Delivered) => "Yetkazildi",
        (Locale::Uz, OrderStatus::Cancelled) => "Bekor qilindi",
        (Locale::Ru, OrderStatus::New) => "Новый",
        (Locale::Ru, OrderStatus::Preparing) => "Готовится",
        (Locale::Ru, OrderStatus::OnTheWay) => "В пути",
        (Locale::Ru, OrderStatus::Delivered) => "Доставлен",
        (Locale::Ru, OrderStatus::Cancelled) => "Отменён",
    }
}

fn status_message(order_id: OrderId, status: OrderStatus, locale: Locale) -> String {
    let label = status_label(status, locale);
    match locale {
        Locale::Uz => format!("Buyurtma #{order_id} holati yangilandi: {label}"),
        Locale::Ru => format!("Статус заказа #{order_id} обновлён: {label}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_wording() {
        let uz = status_message(OrderId::new(7), OrderStatus::Preparing, Locale::Uz);
        assert_eq!(uz, "Buyurtma #7 holati yangilandi: Tayyorlanmoqda");

        let ru = status_message(OrderId::new(7), OrderStatus::OnTheWay, Locale::Ru);
        assert_eq!(ru, "Статус заказа #7 обновлён: В пути");
    }
}
