//! HTTP route handlers for the order backend.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (verifies database)
//!
//! # Cart (bearer auth)
//! GET    /cart                  - Cart view with lines and total
//! POST   /cart                  - Add a product (merges quantities)
//! PATCH  /cart/items/{id}       - Set a line's quantity
//! DELETE /cart/items/{id}       - Remove a line
//!
//! # Orders (bearer auth)
//! POST /orders/checkout         - Atomic cart-to-order conversion
//! GET  /orders/history?page=    - Paginated order history
//! GET  /orders/{id}             - Order detail
//! POST /orders/{id}/cancel      - User-initiated cancellation
//!
//! # Staff (X-Staff-Token)
//! PATCH /orders/{id}/status     - Order status transition
//!
//! # Branches (public)
//! GET  /branches                - Active branches with computed open flag
//! ```

pub mod branches;
pub mod cart;
pub mod orders;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route(
            "/items/{id}",
            patch(cart::set_quantity).delete(cart::remove),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(orders::checkout))
        .route("/history", get(orders::history))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
        .route("/{id}/status", patch(orders::set_status))
}

/// Create all routes for the order backend.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .route("/branches", get(branches::index))
}
