//! API error types and conversions
//!
//! Every error leaves as `{"error": "..."}`. Shared store outages and
//! timeouts map to 503 with a `Retry-After` hint, since the next request
//! may well succeed against a recovered store.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::space::SpaceError;
use crate::storage::StorageError;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Seconds a client should wait before retrying a 503
const RETRY_AFTER_SECS: &str = "1";

#[derive(Debug)]
pub enum ApiError {
    /// Shared store down or timed out
    SpaceUnavailable(String),

    /// Shared store answered but the operation failed
    Space(String),

    /// Durable alert history failed
    History(String),

    InvalidRequest(String),

    NotFound(String),

    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SpaceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Space(_) | ApiError::History(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(self) -> String {
        match self {
            ApiError::SpaceUnavailable(msg)
            | ApiError::Space(msg)
            | ApiError::History(msg)
            | ApiError::InvalidRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.message() }));

        let mut response = (status, body).into_response();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}

impl From<SpaceError> for ApiError {
    fn from(err: SpaceError) -> Self {
        error!("shared store error: {}", err);
        if err.is_retryable() {
            ApiError::SpaceUnavailable(err.to_string())
        } else {
            ApiError::Space(err.to_string())
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        error!("alert history error: {}", err);
        ApiError::History(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(format!("{err:#}"))
    }
}
