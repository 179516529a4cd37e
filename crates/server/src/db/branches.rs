//! Branch repository.

use chrono::NaiveTime;
use sqlx::SqlitePool;

use tandir_core::BranchId;

use super::RepositoryError;
use crate::models::Branch;

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

impl TryFrom<BranchRow> for Branch {
    type Error = RepositoryError;

    fn try_from(r: BranchRow) -> Result<Self, Self::Error> {
        let parse_time = |s: &str| {
            s.parse::<NaiveTime>().map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid time in database ({s}): {e}"))
            })
        };

        Ok(Self {
            id: BranchId::new(r.id),
            name: r.name,
            address: r.address,
            phone: r.phone,
            opens_at: parse_time(&r.opens_at)?,
            closes_at: parse_time(&r.closes_at)?,
            is_active: r.is_active,
            avg_preparation_minutes: r.avg_preparation_minutes,
            avg_delivery_extra_minutes: r.avg_delivery_extra_minutes,
        })
    }
}

/// Repository for branch reads.
pub struct BranchRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BranchRepository<'a> {
    /// Create a new branch repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List all active branches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored times are invalid.
    pub async fn list_active(&self) -> Result<Vec<Branch>, RepositoryError> {
        let rows = sqlx::query_as::<_, BranchRow>(
            r"
            SELECT id, name, address, phone, opens_at, closes_at,
                   is_active, avg_preparation_minutes, avg_delivery_extra_minutes
            FROM branches
            WHERE is_active = 1
            ORDER BY id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Branch::try_from).collect()
    }

    /// Get a branch by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if stored times are invalid.
    pub async fn get(&self, id: BranchId) -> Result<Option<Branch>, RepositoryError> {
        let row = sqlx::query_as::<_, BranchRow>(
            r"
            SELECT id, name, address, phone, opens_at, closes_at,
                   is_active, avg_preparation_minutes, avg_delivery_extra_minutes
            FROM branches
            WHERE id = ?
            ",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(Branch::try_from).transpose()
    }
}
