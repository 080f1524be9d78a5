//! Health check endpoint

use crate::api::types::HealthResponse;
use axum::Json;

/// GET /health
///
/// Liveness only; does not touch the shared or durable store
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP".to_string(),
        arch: "space-based".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
