//! Database operations for the order backend.
//!
//! # Database
//!
//! An embedded SQLite file. Relational state shared between the checkout
//! workflow and the staff status flow:
//!
//! ## Tables
//!
//! - `users` - Registered customers (rows written by the external auth service)
//! - `categories` / `products` - Catalog rows backing cart references
//! - `branches` - Pickup locations with working hours and prep estimates
//! - `carts` / `cart_items` - One mutable cart per user
//! - `orders` / `order_items` - Immutable checkout snapshots
//!
//! # Migrations
//!
//! Embedded via `sqlx::migrate!` and run at startup.

mod branches;
mod carts;
mod orders;
mod users;

pub use branches::BranchRepository;
pub use carts::CartRepository;
pub use orders::{OrderPage, OrderRepository, StatusChange};
pub use users::UserRepository;

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

/// Embedded migrations for the order database.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The referenced row does not exist (or is not owned by the caller).
    #[error("not found")]
    NotFound,

    /// A uniqueness or state conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value failed to parse back into its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a SQLite connection pool with sensible defaults.
///
/// Foreign keys are enforced per connection; WAL keeps readers from
/// blocking the single writer.
///
/// # Errors
///
/// Returns `sqlx::Error` if the database cannot be opened.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}
