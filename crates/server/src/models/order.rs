//! Order and order line models.
//!
//! An order is an immutable snapshot taken at checkout. After creation
//! only its `status` (and `updated_at`) ever change; prices, items, and
//! fulfillment estimates are frozen forever.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tandir_core::{
    BranchId, DeliveryType, Money, OrderId, OrderItemId, OrderStatus, PaymentType, ProductId,
    UserId,
};

/// A customer order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// Null once the owning user has been deleted; the order itself stays.
    pub user_id: Option<UserId>,
    pub status: OrderStatus,
    /// Copied from the cart total at checkout, never recomputed.
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
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// One frozen line of an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    /// Null once the product has been deleted from the catalog.
    pub product_id: Option<ProductId>,
    /// Name frozen at checkout so history stays readable after deletion.
    pub product_name: String,
    pub quantity: u32,
    /// Unit price at the moment of checkout.
    pub price_per_unit: Money,
    /// `price_per_unit * quantity`, computed once at checkout.
    pub line_total: Money,
}
