//! The checkout workflow.
//!
//! Converts a mutable cart into an immutable order in a single database
//! transaction. Everything between draining the cart and inserting the
//! last order line is all-or-nothing: any validation failure rolls the
//! whole attempt back and the cart keeps its lines.
//!
//! Draining the cart is the transaction's *first* write on purpose: it
//! takes SQLite's write lock, so of two concurrent checkout attempts on
//! the same cart the second one finds zero lines and fails with
//! "cart is empty" instead of producing a duplicate or empty order.

use chrono::{Duration, NaiveTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;

use tandir_core::{
    BranchId, DeliveryType, Money, OrderId, OrderItemId, OrderStatus, PaymentType, ProductId,
    UserId,
};

use crate::db::RepositoryError;
use crate::models::{Branch, Order, OrderItem};

/// Checkout submission, accumulated by the conversational front-end.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub delivery_type: DeliveryType,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub payment_type: PaymentType,
    pub notes: Option<String>,
    pub pickup_branch_id: Option<BranchId>,
}

/// Errors from the checkout workflow.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// Caller-fixable problem; the cart is left untouched.
    #[error("{0}")]
    Validation(String),

    /// Storage failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

#[derive(sqlx::FromRow)]
struct DrainedLine {
    id: i64,
    product_id: i64,
    quantity: i64,
}

#[derive(sqlx::FromRow)]
struct ProductSnapshot {
    name: String,
    price: i64,
    is_available: bool,
}

/// Run checkout for the user's cart.
///
/// `local_now` is the wall-clock time in the restaurant's timezone, used
/// for the defensive branch-openness re-check (a branch may have closed
/// between selection and submission).
///
/// # Errors
///
/// Returns `CheckoutError::Validation` for an empty cart, incomplete
/// delivery fields, a closed/missing pickup branch, or an unavailable
/// product. Returns `CheckoutError::Repository` for storage failures.
pub async fn run(
    pool: &SqlitePool,
    user_id: UserId,
    request: CheckoutRequest,
    local_now: NaiveTime,
) -> Result<Order, CheckoutError> {
    validate_fulfillment_fields(&request)?;

    let mut tx = pool.begin().await?;

    let cart_id: Option<(i64,)> = sqlx::query_as("SELECT id FROM carts WHERE user_id = ?")
        .bind(user_id.as_i64())
        .fetch_optional(&mut *tx)
        .await?;

    let Some((cart_id,)) = cart_id else {
        return Err(CheckoutError::Validation("cart is empty".to_owned()));
    };

    // First write: drains the cart and takes the write lock in one step.
    let mut lines = sqlx::query_as::<_, DrainedLine>(
        "DELETE FROM cart_items WHERE cart_id = ? RETURNING id, product_id, quantity",
    )
    .bind(cart_id)
    .fetch_all(&mut *tx)
    .await?;

    if lines.is_empty() {
        return Err(CheckoutError::Validation("cart is empty".to_owned()));
    }
    lines.sort_by_key(|l| l.id);

    let branch = resolve_branch(&mut tx, &request, local_now).await?;

    // Freeze every line at the product's current price. One unavailable
    // product aborts the whole order.
    let mut items = Vec::with_capacity(lines.len());
    let mut total = Money::ZERO;
    for line in &lines {
        let snapshot = sqlx::query_as::<_, ProductSnapshot>(
            "SELECT name, price, is_available FROM products WHERE id = ?",
        )
        .bind(line.product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(snapshot) = snapshot else {
            return Err(CheckoutError::Validation(format!(
                "product {} is no longer available",
                line.product_id
            )));
        };
        if !snapshot.is_available {
            return Err(CheckoutError::Validation(format!(
                "product is no longer available: {}",
                snapshot.name
            )));
        }

        let quantity = u32::try_from(line.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "invalid quantity in database: {}",
                line.quantity
            ))
        })?;
        let price_per_unit = Money::from_som(snapshot.price);
        let line_total = price_per_unit.times(quantity);
        total += line_total;

        items.push((line.product_id, snapshot.name, quantity, price_per_unit, line_total));
    }

    let now = Utc::now();
    let (ready_at, delivery_at) = estimates(&request, branch.as_ref(), now);

    let inserted = sqlx::query(
        r"
        INSERT INTO orders (user_id, status, total_price, delivery_type, address,
                            latitude, longitude, payment_type, notes, pickup_branch_id,
                            estimated_ready_at, estimated_delivery_at, created_at, updated_at)
        VALUES (?, 'new', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(user_id.as_i64())
    .bind(total.as_som())
    .bind(request.delivery_type.to_string())
    .bind(request.address.as_deref())
    .bind(request.latitude)
    .bind(request.longitude)
    .bind(request.payment_type.to_string())
    .bind(request.notes.as_deref())
    .bind(request.pickup_branch_id.as_ref().map(BranchId::as_i64))
    .bind(ready_at)
    .bind(delivery_at)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;
    let order_id = inserted.last_insert_rowid();

    let mut order_items = Vec::with_capacity(items.len());
    for (product_id, name, quantity, price_per_unit, line_total) in items {
        let inserted = sqlx::query(
            r"
            INSERT INTO order_items (order_id, product_id, product_name, quantity,
                                     price_per_unit, line_total)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(order_id)
        .bind(product_id)
        .bind(&name)
        .bind(i64::from(quantity))
        .bind(price_per_unit.as_som())
        .bind(line_total.as_som())
        .execute(&mut *tx)
        .await?;

        order_items.push(OrderItem {
            id: OrderItemId::new(inserted.last_insert_rowid()),
            product_id: Some(ProductId::new(product_id)),
            product_name: name,
            quantity,
            price_per_unit,
            line_total,
        });
    }

    tx.commit().await?;

    Ok(Order {
        id: OrderId::new(order_id),
        user_id: Some(user_id),
        status: OrderStatus::New,
        total_price: total,
        delivery_type: request.delivery_type,
        address: request.address,
        latitude: request.latitude,
        longitude: request.longitude,
        payment_type: request.payment_type,
        notes: request.notes,
        pickup_branch_id: request.pickup_branch_id,
        estimated_ready_at: ready_at,
        estimated_delivery_at: delivery_at,
        created_at: now,
        updated_at: now,
        items: order_items,
    })
}

/// Structural validation of fulfillment fields, before any storage work.
fn validate_fulfillment_fields(request: &CheckoutRequest) -> Result<(), CheckoutError> {
    match request.delivery_type {
        DeliveryType::Delivery => {
            if request.latitude.is_some() != request.longitude.is_some() {
                return Err(CheckoutError::Validation(
                    "coordinates require both latitude and longitude".to_owned(),
                ));
            }
            let has_address = request
                .address
                .as_deref()
                .is_some_and(|a| !a.trim().is_empty());
            let has_coordinates = request.latitude.is_some() && request.longitude.is_some();
            if !has_address && !has_coordinates {
                return Err(CheckoutError::Validation(
                    "delivery requires an address or a coordinate pair".to_owned(),
                ));
            }
        }
        DeliveryType::Pickup => {
            if request.pickup_branch_id.is_none() {
                return Err(CheckoutError::Validation(
                    "pickup requires a branch".to_owned(),
                ));
            }
        }
    }
    Ok(())
}

/// Resolve the fulfilling branch, re-checking openness at commit time.
///
/// Delivery orders currently resolve no branch (see DESIGN.md), so their
/// estimates stay unset.
async fn resolve_branch(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    request: &CheckoutRequest,
    local_now: NaiveTime,
) -> Result<Option<Branch>, CheckoutError> {
    let Some(branch_id) = request.pickup_branch_id else {
        return Ok(None);
    };

    #[derive(sqlx::FromRow)]
    struct BranchRow {
        id: i64,
        name: String,
        address: String,
        phone: Option<String>,
        opens_at: String,
        closes_at: String,
        is_active: bool,
        avg_preparation_minutes: i64,
        avg_delivery_extra_minutes: i64,
    }

    let row = sqlx::query_as::<_, BranchRow>(
        r"
        SELECT id, name, address, phone, opens_at, closes_at,
               is_active, avg_preparation_minutes, avg_delivery_extra_minutes
        FROM branches
        WHERE id = ?
        ",
    )
    .bind(branch_id.as_i64())
    .fetch_optional(&mut **tx)
    .await?;

    let Some(row) = row else {
        return Err(CheckoutError::Validation("branch not found".to_owned()));
    };

    let parse_time = |s: &str| {
        s.parse::<NaiveTime>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid time in database ({s}): {e}"))
        })
    };
    let branch = Branch {
        id: BranchId::new(row.id),
        name: row.name,
        address: row.address,
        phone: row.phone,
        opens_at: parse_time(&row.opens_at)?,
        closes_at: parse_time(&row.closes_at)?,
        is_active: row.is_active,
        avg_preparation_minutes: row.avg_preparation_minutes,
        avg_delivery_extra_minutes: row.avg_delivery_extra_minutes,
    };

    if !branch.is_open_at(local_now) {
        return Err(CheckoutError::Validation(format!(
            "branch is closed: {}",
            branch.name
        )));
    }

    Ok(Some(branch))
}

/// Fulfillment estimates from the resolved branch's configured averages.
fn estimates(
    request: &CheckoutRequest,
    branch: Option<&Branch>,
    now: chrono::DateTime<Utc>,
) -> (Option<chrono::DateTime<Utc>>, Option<chrono::DateTime<Utc>>) {
    let Some(branch) = branch else {
        return (None, None);
    };

    let ready_at = now + Duration::minutes(branch.avg_preparation_minutes);
    let delivery_at = match request.delivery_type {
        DeliveryType::Delivery => {
            Some(ready_at + Duration::minutes(branch.avg_delivery_extra_minutes))
        }
        DeliveryType::Pickup => None,
    };

    (Some(ready_at), delivery_at)
}
