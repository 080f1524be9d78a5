//! Per-node hot state endpoint

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
};
use crate::space::NodeSnapshot;

/// GET /nodes/:node_id
///
/// Latest price, current window and live alerts. 404 if the space holds
/// nothing for the node.
pub async fn get_node(
    State(state): State<ApiState>,
    Path(node_id): Path<String>,
) -> ApiResult<Json<NodeSnapshot>> {
    let snapshot = state.space.node_snapshot(&node_id).await?;

    if snapshot.latest_price_mwh.is_none()
        && snapshot.window.is_empty()
        && snapshot.active_alerts.is_empty()
    {
        return Err(ApiError::NotFound(format!("no data for node {node_id}")));
    }

    Ok(Json(snapshot))
}
