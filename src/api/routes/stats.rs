//! Statistics endpoint

use axum::{Json, extract::State};
use tracing::warn;

use crate::api::{
    error::ApiResult,
    state::ApiState,
    types::{HistoryStats, StatsResponse},
};

/// GET /stats
///
/// Persistence worker totals and durable store stats. A failing durable
/// store shows up as `healthy: false` rather than an error.
pub async fn get_stats(State(state): State<ApiState>) -> ApiResult<Json<StatsResponse>> {
    let persistence = state.persistence.get_stats().await;

    let healthy = match state.history.health_check().await {
        Ok(status) => status.healthy,
        Err(e) => {
            warn!("history health check failed: {}", e);
            false
        }
    };

    let history = HistoryStats {
        healthy,
        total_alerts: state.history.count().await.ok(),
        summary: state.history.get_stats().await.ok(),
    };

    Ok(Json(StatsResponse {
        timestamp: chrono::Utc::now().to_rfc3339(),
        persistence,
        history,
    }))
}
