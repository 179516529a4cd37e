//! Cart route handlers.

use axum::{Json, extract::Path, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tandir_core::{CartId, CartItemId, Money, ProductId};

use crate::auth::AuthUser;
use crate::db::CartRepository;
use crate::error::{AppError, Result};
use crate::models::{Cart, CartItem};
use crate::state::AppState;

/// Cart line as served to clients.
#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

impl From<&CartItem> for CartItemResponse {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.id,
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            unit_price: item.unit_price,
            quantity: item.quantity,
            line_total: item.line_total(),
        }
    }
}

/// Cart as served to clients.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub id: CartId,
    pub items: Vec<CartItemResponse>,
    pub total_price: Money,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id,
            items: cart.items.iter().map(CartItemResponse::from).collect(),
            total_price: cart.total_price(),
        }
    }
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Set-quantity request body.
#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

/// Display the user's cart.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<CartResponse>> {
    let cart = CartRepository::new(state.pool()).view(user_id).await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// Add a product to the cart, merging into an existing line.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<CartResponse>> {
    let quantity = body.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::Validation("quantity must be at least 1".to_owned()));
    }

    let cart = CartRepository::new(state.pool())
        .add_item(user_id, body.product_id, quantity)
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// Set a cart line's quantity.
#[instrument(skip(state))]
pub async fn set_quantity(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<i64>,
    Json(body): Json<SetQuantityRequest>,
) -> Result<Json<CartResponse>> {
    if body.quantity == 0 {
        return Err(AppError::Validation("quantity must be at least 1".to_owned()));
    }

    let cart = CartRepository::new(state.pool())
        .set_quantity(user_id, CartItemId::new(item_id), body.quantity)
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}

/// Remove a cart line.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(item_id): Path<i64>,
) -> Result<Json<CartResponse>> {
    let cart = CartRepository::new(state.pool())
        .delete_item(user_id, CartItemId::new(item_id))
        .await?;
    Ok(Json(CartResponse::from(&cart)))
}
