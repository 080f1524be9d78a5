//! HTTP API for the energy space
//!
//! The API is stateless: every request reads or writes the shared space, so
//! any number of instances can sit behind a load balancer.
//!
//! ## Endpoints
//!
//! - `POST /price-updates` - Bulk price ingestion, returns raised alerts
//! - `GET /active-alerts` - Unexpired alerts, newest first
//! - `GET /nodes/:node_id` - Latest price, window and alerts for one node
//! - `GET /stats` - Persistence worker and durable store statistics
//! - `GET /health` - Liveness (never requires auth)

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::{BulkPriceResponse, HealthResponse, HistoryStats, StatsResponse};

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ApiSettings;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,

    /// Optional authentication token
    pub auth_token: Option<String>,

    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from(&ApiSettings::default())
    }
}

impl From<&ApiSettings> for ApiConfig {
    fn from(settings: &ApiSettings) -> Self {
        Self {
            bind_addr: settings.bind_addr,
            auth_token: settings.auth_token.clone(),
            enable_cors: settings.enable_cors,
        }
    }
}

/// Build the router with all routes and layers
pub fn router(config: &ApiConfig, state: ApiState) -> Router {
    let mut api = Router::new()
        .route("/price-updates", post(routes::prices::post_price_updates))
        .route("/active-alerts", get(routes::alerts::list_active_alerts))
        .route("/nodes/:node_id", get(routes::nodes::get_node))
        .route("/stats", get(routes::stats::get_stats));

    if let Some(token) = config.auth_token.as_deref() {
        api = api.route_layer(axum::middleware::from_fn_with_state(
            middleware::auth::BearerToken::new(token),
            middleware::auth::auth_middleware,
        ));
    }

    let mut app = api
        .route("/health", get(routes::health::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(&config, state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
