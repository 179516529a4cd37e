//! Wire types for the backend API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tandir_core::{
    BranchId, CartId, CartItemId, CategoryId, DeliveryType, Money, OrderId, OrderStatus,
    PaymentType, ProductId,
};

/// Registration request (`POST auth/register/`).
#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub chat_id: i64,
    pub phone: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// Verification request (`POST auth/verify/`).
#[derive(Debug, Serialize)]
pub struct VerifyRequest {
    pub phone: String,
    pub code: String,
}

/// Verification response: the issued credential pair plus the profile.
#[derive(Debug, Deserialize)]
pub struct VerifyResponse {
    pub access: String,
    pub refresh: String,
    pub user: Profile,
}

/// Refresh request (`POST auth/token/refresh/`).
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Refresh response. The refresh token is only present when the backend
/// rotated it.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// User profile (`GET users/profile/`).
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub phone: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

/// Profile update body (`PATCH users/profile/`).
#[derive(Debug, Serialize)]
pub struct ProfileUpdate<'a> {
    pub language_code: &'a str,
}

/// A page of a list endpoint.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub count: i64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Catalog category.
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Catalog product.
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    pub is_available: bool,
}

/// One cart line.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

/// The user's cart.
#[derive(Debug, Clone, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub items: Vec<CartItem>,
    pub total_price: Money,
}

/// Add-to-cart body (`POST cart/`).
#[derive(Debug, Serialize)]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Checkout submission (`POST orders/checkout/`).
#[derive(Debug, Serialize)]
pub struct CheckoutSubmission {
    pub delivery_type: DeliveryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    pub payment_type: PaymentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_branch_id: Option<BranchId>,
}

/// One frozen order line.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub product_name: String,
    pub quantity: u32,
    pub price_per_unit: Money,
    pub line_total: Money,
}

/// An order as returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub total_price: Money,
    pub delivery_type: DeliveryType,
    #[serde(default)]
    pub estimated_ready_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// A branch with its computed open flag.
#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub address: String,
    pub is_open: bool,
    pub avg_preparation_minutes: i64,
}
