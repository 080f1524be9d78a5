//! API request and response types

use serde::{Deserialize, Serialize};

use crate::ActiveAlert;
use crate::actors::PersistenceStats;

/// Response for POST /price-updates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPriceResponse {
    /// Number of updates in the request
    pub accepted: usize,
    pub alerts_raised: usize,
    pub alerts: Vec<ActiveAlert>,
}

/// Response for GET /health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub arch: String,
    pub timestamp: String,
}

/// Response for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub timestamp: String,
    pub persistence: Option<PersistenceStats>,
    pub history: HistoryStats,
}

/// Durable store subset of the stats response
#[derive(Debug, Clone, Serialize)]
pub struct HistoryStats {
    pub healthy: bool,
    pub total_alerts: Option<u64>,
    pub summary: Option<String>,
}
