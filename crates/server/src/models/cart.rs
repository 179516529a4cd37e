//! Cart and cart line models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use tandir_core::{CartId, CartItemId, Money, ProductId, UserId};

/// One line in a cart.
///
/// Product name, price, and availability are joined in from the catalog
/// at read time - the cart itself stores only the reference and quantity.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    /// Current catalog price. Frozen into an order line only at checkout.
    pub unit_price: Money,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Extended price of this line at the current catalog price.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// A user's cart with its lines and derived total.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Sum of extended prices over all lines.
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }
}
