//! Active alert endpoint

use axum::{Json, extract::State};

use crate::ActiveAlert;
use crate::api::{error::ApiResult, state::ApiState};

/// GET /active-alerts
///
/// Every unexpired alert, newest first
pub async fn list_active_alerts(State(state): State<ApiState>) -> ApiResult<Json<Vec<ActiveAlert>>> {
    Ok(Json(state.space.active_alerts().await?))
}
