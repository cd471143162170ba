//! Guest page ownership queries.

use axum::{
    Json,
    extract::{Path, State},
};

use ssi_common::{GuestPhysAddr, PageInfo};

use super::ApiResult;
use crate::state::AppState;

/// Look up owner and heat of the page at `gpa` (hex `0x..` or decimal)
pub async fn get_page_info(
    State(state): State<AppState>,
    Path(gpa): Path<String>,
) -> ApiResult<Json<PageInfo>> {
    state.registry.ensure_cluster().await?;

    let gpa: GuestPhysAddr = gpa.parse()?;
    tracing::debug!(gpa = %gpa, "Page lookup");

    Ok(Json(state.pages.lookup(gpa)))
}
