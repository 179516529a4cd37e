//! Order route handlers.
//!
//! Status-changing handlers call the notifier only after the write has
//! committed, and only when the status actually changed.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tandir_core::{
    BranchId, DeliveryType, Money, OrderId, OrderItemId, OrderStatus, PaymentType, ProductId,
};

use crate::auth::{AuthUser, StaffAuth};
use crate::checkout::{self, CheckoutRequest};
use crate::db::{OrderRepository, StatusChange};
use crate::error::Result;
use crate::models::{Order, OrderItem};
use crate::state::AppState;

/// Orders per history page.
const HISTORY_PAGE_SIZE: u32 = 10;

/// Order line as served to clients.
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: u32,
    pub price_per_unit: Money,
    pub line_total: Money,
}

impl From<&OrderItem> for OrderItemResponse {
    fn from(item: &OrderItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            price_per_unit: item.price_per_unit,
            line_total: item.line_total,
        }
    }
}

/// Order as served to clients.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total_price: Money,
    pub delivery_type: DeliveryType,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub payment_type: PaymentType,
    pub notes: Option<String>,
    pub pickup_branch_id: Option<BranchId>,
    pub estimated_ready_at: Option<DateTime<Utc>>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            status: order.status,
            total_price: order.total_price,
            delivery_type: order.delivery_type,
            address: order.address.clone(),
            latitude: order.latitude,
            longitude: order.longitude,
            payment_type: order.payment_type,
            notes: order.notes.clone(),
            pickup_branch_id: order.pickup_branch_id,
            estimated_ready_at: order.estimated_ready_at,
            estimated_delivery_at: order.estimated_delivery_at,
            created_at: order.created_at,
            items: order.items.iter().map(OrderItemResponse::from).collect(),
        }
    }
}

/// One page of order history.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<OrderResponse>,
}

/// History pagination query.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<u32>,
}

/// Staff status-transition request body.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: OrderStatus,
}

/// Run checkout on the user's cart.
#[instrument(skip(state, body))]
pub async fn checkout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderResponse>)> {
    let local_now = state.config().local_now();
    let order = checkout::run(state.pool(), user_id, body, local_now).await?;

    tracing::info!(order_id = %order.id, total = %order.total_price, "order created");
    Ok((StatusCode::CREATED, Json(OrderResponse::from(&order))))
}

/// One page of the user's order history, newest first.
#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let result = OrderRepository::new(state.pool())
        .history(user_id, page, HISTORY_PAGE_SIZE)
        .await?;

    let total_pages = (u64::try_from(result.count).unwrap_or(0))
        .div_ceil(u64::from(HISTORY_PAGE_SIZE));
    let next = (u64::from(page) < total_pages)
        .then(|| format!("/orders/history?page={}", page + 1));
    let previous = (page > 1).then(|| format!("/orders/history?page={}", page - 1));

    Ok(Json(HistoryResponse {
        count: result.count,
        next,
        previous,
        results: result.orders.iter().map(OrderResponse::from).collect(),
    }))
}

/// Order detail, owner only.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderResponse>> {
    let order = OrderRepository::new(state.pool())
        .get_owned(user_id, OrderId::new(order_id))
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// User-initiated cancellation.
#[instrument(skip(state))]
pub async fn cancel(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderResponse>> {
    let change = OrderRepository::new(state.pool())
        .cancel(user_id, OrderId::new(order_id))
        .await?;

    notify_if_changed(&state, &change).await;
    Ok(Json(OrderResponse::from(&change.order)))
}

/// Staff status transition.
#[instrument(skip(state))]
pub async fn set_status(
    State(state): State<AppState>,
    StaffAuth: StaffAuth,
    Path(order_id): Path<i64>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<OrderResponse>> {
    let change = OrderRepository::new(state.pool())
        .transition_status(OrderId::new(order_id), body.status)
        .await?;

    notify_if_changed(&state, &change).await;
    Ok(Json(OrderResponse::from(&change.order)))
}

/// Push a notification for a committed, genuine status change.
async fn notify_if_changed(state: &AppState, change: &StatusChange) {
    if change.changed {
        state
            .notifier()
            .order_status_changed(state.pool(), &change.order, change.previous)
            .await;
    }
}
