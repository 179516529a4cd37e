//! Cart repository.
//!
//! All operations are scoped to the acting user: an item id belonging to
//! another user's cart behaves exactly like a missing one, so cart
//! contents never leak across users.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use tandir_core::{CartId, CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartItem};

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: i64,
    product_id: i64,
    product_name: String,
    unit_price: i64,
    quantity: i64,
    added_at: DateTime<Utc>,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(r: CartItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(r.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("invalid quantity in database: {}", r.quantity))
        })?;

        Ok(Self {
            id: CartItemId::new(r.id),
            product_id: ProductId::new(r.product_id),
            product_name: r.product_name,
            unit_price: r.unit_price.into(),
            quantity,
            added_at: r.added_at,
        })
    }
}

/// Repository for cart mutations and reads.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the user's cart id, creating the cart row if absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<CartId, RepositoryError> {
        let now = Utc::now();
        let row: (i64,) = sqlx::query_as(
            r"
            INSERT INTO carts (user_id, created_at, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = excluded.updated_at
            RETURNING id
            ",
        )
        .bind(user_id.as_i64())
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(CartId::new(row.0))
    }

    /// Read the user's cart with its lines.
    ///
    /// A user with no cart row yet sees an empty cart; the row is not
    /// created by a read.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn view(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let cart_id: Option<(i64,)> = sqlx::query_as("SELECT id FROM carts WHERE user_id = ?")
            .bind(user_id.as_i64())
            .fetch_optional(self.pool)
            .await?;

        let Some((cart_id,)) = cart_id else {
            return Ok(Cart {
                id: CartId::new(0),
                user_id,
                items: vec![],
            });
        };

        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT ci.id, ci.product_id, p.name AS product_name,
                   p.price AS unit_price, ci.quantity, ci.added_at
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = ?
            ORDER BY ci.id
            ",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(CartItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart {
            id: CartId::new(cart_id),
            user_id,
            items,
        })
    }

    /// Add a product to the user's cart.
    ///
    /// Merges into an existing line for the same product (quantity
    /// accumulates) instead of duplicating the line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist
    /// or is not currently available.
    /// Returns `RepositoryError::Database` for other failures.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, RepositoryError> {
        let available: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM products WHERE id = ? AND is_available = 1")
                .bind(product_id.as_i64())
                .fetch_optional(self.pool)
                .await?;

        if available.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let cart_id = self.get_or_create(user_id).await?;

        sqlx::query(
            r"
            INSERT INTO cart_items (cart_id, product_id, quantity, added_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = quantity + excluded.quantity
            ",
        )
        .bind(cart_id.as_i64())
        .bind(product_id.as_i64())
        .bind(i64::from(quantity))
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        self.view(user_id).await
    }

    /// Set the quantity of one of the user's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist or
    /// belongs to another user's cart.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<Cart, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE cart_items
            SET quantity = ?
            WHERE id = ?
              AND cart_id IN (SELECT id FROM carts WHERE user_id = ?)
            ",
        )
        .bind(i64::from(quantity))
        .bind(item_id.as_i64())
        .bind(user_id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.view(user_id).await
    }

    /// Remove one of the user's cart lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist or
    /// belongs to another user's cart.
    pub async fn delete_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<Cart, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM cart_items
            WHERE id = ?
              AND cart_id IN (SELECT id FROM carts WHERE user_id = ?)
            ",
        )
        .bind(item_id.as_i64())
        .bind(user_id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.view(user_id).await
    }
}
