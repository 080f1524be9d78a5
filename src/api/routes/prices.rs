//! Price ingestion endpoint

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::debug;

use crate::PriceUpdate;
use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::BulkPriceResponse,
};

/// POST /price-updates
///
/// Accepts a JSON array of price updates. The whole batch is rejected if it
/// is empty or any update is invalid.
pub async fn post_price_updates(
    State(state): State<ApiState>,
    body: Result<Json<Vec<PriceUpdate>>, JsonRejection>,
) -> ApiResult<Json<BulkPriceResponse>> {
    let Json(updates) = body.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;

    if updates.is_empty() {
        return Err(ApiError::InvalidRequest(
            "request contains no price updates".to_string(),
        ));
    }
    for (index, update) in updates.iter().enumerate() {
        update
            .validate()
            .map_err(|reason| ApiError::InvalidRequest(format!("update {index}: {reason}")))?;
    }

    debug!("received {} price updates", updates.len());
    let alerts = state.space.write_price_updates(&updates).await?;

    Ok(Json(BulkPriceResponse {
        accepted: updates.len(),
        alerts_raised: alerts.len(),
        alerts,
    }))
}
