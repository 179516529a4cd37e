//! Branch (restaurant location) model.

use chrono::NaiveTime;
use serde::Serialize;

use tandir_core::BranchId;

/// A physical branch customers can pick up from.
#[derive(Debug, Clone, Serialize)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    /// Daily opening time (local).
    pub opens_at: NaiveTime,
    /// Daily closing time (local). May be earlier than `opens_at` for
    /// branches that close after midnight.
    pub closes_at: NaiveTime,
    pub is_active: bool,
    pub avg_preparation_minutes: i64,
    pub avg_delivery_extra_minutes: i64,
}

impl Branch {
    /// Whether the branch is taking orders at the given local time.
    #[must_use]
    pub fn is_open_at(&self, local: NaiveTime) -> bool {
        if !self.is_active {
            return false;
        }
        if self.opens_at <= self.closes_at {
            local >= self.opens_at && local < self.closes_at
        } else {
            // Overnight window, e.g. 18:00 - 02:00.
            local >= self.opens_at || local < self.closes_at
        }
    }
}

/// Branch as served to clients, with the open flag computed for "now".
#[derive(Debug, Clone, Serialize)]
pub struct BranchView {
    pub id: BranchId,
    pub name: String,
    pub address: String,
    pub phone: Option<String>,
    pub is_open: bool,
    pub avg_preparation_minutes: i64,
}

impl BranchView {
    /// Project a branch for the given local time.
    #[must_use]
    pub fn at(branch: &Branch, local: NaiveTime) -> Self {
        Self {
            id: branch.id,
            name: branch.name.clone(),
            address: branch.address.clone(),
            phone: branch.phone.clone(),
            is_open: branch.is_open_at(local),
            avg_preparation_minutes: branch.avg_preparation_minutes,
        }
    }
}
