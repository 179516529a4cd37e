//! Backend API gateway.
//!
//! Everything the conversation layer knows about the backend goes through
//! [`client::ApiGateway`]: it attaches credentials and the session locale,
//! refreshes an expired access token transparently (exactly once), and
//! returns every expected failure as a tagged [`error::ApiError`] instead
//! of raising across the boundary.

pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiGateway, ApiResponse};
pub use error::ApiError;
