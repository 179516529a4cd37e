//! Shared helpers for the integration-test suites.
//!
//! Every test runs against a file-backed SQLite database in a temp
//! directory (in-memory SQLite gives each pooled connection its own
//! database, which breaks multi-connection tests).

#![allow(clippy::unwrap_used, clippy::missing_panics_doc, clippy::missing_errors_doc)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use tandir_bot::transport::{ChatTransport, MessageId, OutgoingMessage, TransportError};
use tandir_core::{BranchId, CategoryId, ChatId, ProductId, UserId};
use tandir_server::notify::{NotificationChannel, NotifyError};

/// Open a fresh, migrated order database under `dir`.
pub async fn server_pool(dir: &tempfile::TempDir) -> SqlitePool {
    let url = format!("sqlite:{}", dir.path().join("orders.db").display());
    let pool = tandir_server::db::create_pool(&url).await.unwrap();
    tandir_server::db::MIGRATOR.run(&pool).await.unwrap();
    pool
}

/// Insert a verified user, returning its id.
pub async fn seed_user(pool: &SqlitePool, chat_id: ChatId, phone: &str) -> UserId {
    let now = Utc::now();
    let result = sqlx::query(
        r"
        INSERT INTO users (chat_id, phone, first_name, locale, is_active, created_at, updated_at)
        VALUES (?, ?, 'Test', 'uz', 1, ?, ?)
        ",
    )
    .bind(chat_id.as_i64())
    .bind(phone)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();
    UserId::new(result.last_insert_rowid())
}

/// Insert a category, returning its id.
pub async fn seed_category(pool: &SqlitePool, name: &str) -> CategoryId {
    let result = sqlx::query("INSERT INTO categories (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .unwrap();
    CategoryId::new(result.last_insert_rowid())
}

/// Insert an available product, returning its id.
pub async fn seed_product(
    pool: &SqlitePool,
    category: CategoryId,
    name: &str,
    price: i64,
) -> ProductId {
    let now = Utc::now();
    let result = sqlx::query(
        r"
        INSERT INTO products (category_id, name, price, is_available, created_at, updated_at)
        VALUES (?, ?, ?, 1, ?, ?)
        ",
    )
    .bind(category.as_i64())
    .bind(name)
    .bind(price)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .unwrap();
    ProductId::new(result.last_insert_rowid())
}

/// Insert a branch open around the clock, returning its id.
pub async fn seed_branch(pool: &SqlitePool, name: &str, prep_minutes: i64) -> BranchId {
    let result = sqlx::query(
        r"
        INSERT INTO branches (name, address, opens_at, closes_at, is_active,
                              avg_preparation_minutes, avg_delivery_extra_minutes)
        VALUES (?, 'Test street 1', '00:00:00', '23:59:59', 1, ?, 30)
        ",
    )
    .bind(name)
    .bind(prep_minutes)
    .execute(pool)
    .await
    .unwrap();
    BranchId::new(result.last_insert_rowid())
}

/// Mark a product unavailable.
pub async fn make_unavailable(pool: &SqlitePool, product: ProductId) {
    sqlx::query("UPDATE products SET is_available = 0 WHERE id = ?")
        .bind(product.as_i64())
        .execute(pool)
        .await
        .unwrap();
}

/// Notification channel that records instead of sending.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    pub sent: Arc<Mutex<Vec<(ChatId, String)>>>,
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().await.push((chat_id, text.to_owned()));
        Ok(())
    }
}

/// Chat transport that records outgoing messages instead of sending.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    pub sent: Arc<Mutex<Vec<(ChatId, OutgoingMessage)>>>,
}

impl RecordingTransport {
    /// Text of every message sent so far, in order.
    pub async fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .map(|(_, m)| m.text.clone())
            .collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_message(
        &self,
        chat: ChatId,
        message: OutgoingMessage,
    ) -> Result<MessageId, TransportError> {
        let mut sent = self.sent.lock().await;
        sent.push((chat, message));
        Ok(MessageId(i64::try_from(sent.len()).unwrap_or(0)))
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        _message_id: MessageId,
        message: OutgoingMessage,
    ) -> Result<(), TransportError> {
        self.sent.lock().await.push((chat, message));
        Ok(())
    }

    async fn delete_message(
        &self,
        _chat: ChatId,
        _message_id: MessageId,
    ) -> Result<(), TransportError> {
        Ok(())
    }
}
