//! Branch route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::BranchRepository;
use crate::error::Result;
use crate::models::branch::BranchView;
use crate::state::AppState;

/// List active branches with the open flag computed for "now".
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<BranchView>>> {
    let local_now = state.config().local_now();
    let branches = BranchRepository::new(state.pool()).list_active().await?;

    let views = branches
        .iter()
        .map(|b| BranchView::at(b, local_now))
        .collect();
    Ok(Json(views))
}
