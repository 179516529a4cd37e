//! Order repository.
//!
//! Order creation lives in the checkout workflow (it spans carts,
//! products, and branches in one transaction); this repository covers
//! everything after creation - reads, history pages, and the status
//! machine.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use tandir_core::{
    BranchId, DeliveryType, OrderId, OrderItemId, OrderStatus, PaymentType, ProductId, UserId,
};

use super::RepositoryError;
use crate::models::{Order, OrderItem};

#[derive(sqlx::FromRow)]
pub(crate) struct OrderRow {
    pub id: i64,
    pub user_id: Option<i64>,
    pub status: String,
    pub total_price: i64,
    pub delivery_type: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub payment_type: String,
    pub notes: Option<String>,
    pub pickup_branch_id: Option<i64>,
    pub estimated_ready_at: Option<DateTime<Utc>>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
pub(crate) struct OrderItemRow {
    pub id: i64,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub quantity: i64,
    pub price_per_unit: i64,
    pub line_total: i64,
}

impl OrderRow {
    pub(crate) fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let corrupt = |field: &str, value: &str| {
            RepositoryError::DataCorruption(format!("invalid {field} in database: {value}"))
        };

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: self.user_id.map(UserId::new),
            status: self
                .status
                .parse::<OrderStatus>()
                .map_err(|_| corrupt("status", &self.status))?,
            total_price: self.total_price.into(),
            delivery_type: self
                .delivery_type
                .parse::<DeliveryType>()
                .map_err(|_| corrupt("delivery type", &self.delivery_type))?,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            payment_type: self
                .payment_type
                .parse::<PaymentType>()
                .map_err(|_| corrupt("payment type", &self.payment_type))?,
            notes: self.notes,
            pickup_branch_id: self.pickup_branch_id.map(BranchId::new),
            estimated_ready_at: self.estimated_ready_at,
            estimated_delivery_at: self.estimated_delivery_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(r: OrderItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(r.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("invalid quantity in database: {}", r.quantity))
        })?;

        Ok(Self {
            id: OrderItemId::new(r.id),
            product_id: r.product_id.map(ProductId::new),
            product_name: r.product_name,
            quantity,
            price_per_unit: r.price_per_unit.into(),
            line_total: r.line_total.into(),
        })
    }
}

const ORDER_COLUMNS: &str = r"
    id, user_id, status, total_price, delivery_type, address,
    latitude, longitude, payment_type, notes, pickup_branch_id,
    estimated_ready_at, estimated_delivery_at, created_at, updated_at
";

/// One page of a user's order history.
#[derive(Debug)]
pub struct OrderPage {
    /// Total number of orders for the user, across all pages.
    pub count: i64,
    pub orders: Vec<Order>,
}

/// Result of a status write.
#[derive(Debug)]
pub struct StatusChange {
    pub order: Order,
    pub previous: OrderStatus,
    /// False for a no-op write (same status). Notifications only fire on
    /// real changes.
    pub changed: bool,
}

/// Repository for order reads and status transitions.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order_id: i64) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, product_id, product_name, quantity, price_per_unit, line_total
            FROM order_items
            WHERE order_id = ?
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderItem::try_from).collect()
    }

    /// Get an order by id, regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id.as_i64())
            .fetch_optional(self.pool)
            .await?;

        match row {
            Some(r) => {
                let items = self.load_items(r.id).await?;
                Ok(Some(r.into_order(items)?))
            }
            None => Ok(None),
        }
    }

    /// Get an order by id, requiring the given user to own it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for a missing order and for an
    /// order owned by someone else - the two are indistinguishable to the
    /// caller.
    pub async fn get_owned(&self, user_id: UserId, id: OrderId) -> Result<Order, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ? AND user_id = ?");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id.as_i64())
            .bind(user_id.as_i64())
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let items = self.load_items(row.id).await?;
        row.into_order(items)
    }

    /// One page of a user's order history, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(
        &self,
        user_id: UserId,
        page: u32,
        page_size: u32,
    ) -> Result<OrderPage, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = ?")
            .bind(user_id.as_i64())
            .fetch_one(self.pool)
            .await?;

        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ? \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id.as_i64())
            .bind(i64::from(page_size))
            .bind(offset)
            .fetch_all(self.pool)
            .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.load_items(row.id).await?;
            orders.push(row.into_order(items)?);
        }

        Ok(OrderPage { count, orders })
    }

    /// Write a status, validating the order-status machine.
    ///
    /// Writing the current status again is accepted as a no-op
    /// (`changed = false`); an illegal transition is a `Conflict`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Conflict` for an illegal transition.
    pub async fn transition_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<StatusChange, RepositoryError> {
        let current = self.get(id).await?.ok_or(RepositoryError::NotFound)?;
        let previous = current.status;

        if previous == next {
            return Ok(StatusChange {
                order: current,
                previous,
                changed: false,
            });
        }

        if !previous.can_transition_to(next) {
            return Err(RepositoryError::Conflict(format!(
                "cannot move order from {previous} to {next}"
            )));
        }

        sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
            .bind(next.to_string())
            .bind(Utc::now())
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        let order = self.get(id).await?.ok_or(RepositoryError::NotFound)?;
        Ok(StatusChange {
            order,
            previous,
            changed: true,
        })
    }

    /// User-initiated cancellation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order is missing or not
    /// owned by the user.
    /// Returns `RepositoryError::Conflict` if the order is already
    /// delivered or cancelled.
    pub async fn cancel(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<StatusChange, RepositoryError> {
        let current = self.get_owned(user_id, id).await?;

        if !current.status.can_cancel() {
            return Err(RepositoryError::Conflict(format!(
                "order is already {}",
                current.status
            )));
        }

        self.transition_status(id, OrderStatus::Cancelled).await
    }
}
