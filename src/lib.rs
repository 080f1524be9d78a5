pub mod actors;
#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod detector;
pub mod persistence;
pub mod space;
pub mod storage;
pub mod util;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single price reading for a grid node, as submitted to the write path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    pub node_id: String,
    pub price_mwh: Decimal,
    /// Reading time in Unix milliseconds; `<= 0` means "use ingestion time".
    #[serde(default)]
    pub timestamp_ms: i64,
}

impl PriceUpdate {
    pub fn new(node_id: impl Into<String>, price_mwh: Decimal, timestamp_ms: i64) -> Self {
        Self {
            node_id: node_id.into(),
            price_mwh,
            timestamp_ms,
        }
    }

    /// The timestamp the reading is filed under.
    pub fn effective_timestamp_ms(&self, now_ms: i64) -> i64 {
        if self.timestamp_ms > 0 {
            self.timestamp_ms
        } else {
            now_ms
        }
    }

    /// Returns a reason if the update cannot be ingested.
    pub fn validate(&self) -> Result<(), String> {
        if self.node_id.trim().is_empty() {
            return Err("nodeId must not be blank".to_string());
        }
        if self.price_mwh <= Decimal::ZERO {
            return Err(format!("priceMwh must be positive, got {}", self.price_mwh));
        }
        if self.timestamp_ms > 0 && DateTime::from_timestamp_millis(self.timestamp_ms).is_none() {
            return Err(format!(
                "timestampMs {} is outside the representable range",
                self.timestamp_ms
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    /// Price exceeded a multiple of the node's rolling average
    Spike,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Spike => "SPIKE",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SPIKE" => Ok(AlertType::Spike),
            other => Err(format!("unknown alert type: {other}")),
        }
    }
}

/// An alert living in the shared space until its TTL runs out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveAlert {
    pub alert_id: String,
    pub node_id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub price_mwh: Decimal,
    pub threshold_or_average: Decimal,
    pub raised_at: DateTime<Utc>,
    pub ttl_seconds: u64,
}

impl ActiveAlert {
    /// Deterministic id: re-detecting the same reading yields the same id.
    pub fn alert_id_for(node_id: &str, alert_type: AlertType, timestamp_ms: i64) -> String {
        format!("{node_id}:{alert_type}:{timestamp_ms}")
    }

    /// `timestamp_ms` is expected to have passed `PriceUpdate::validate`
    pub fn spike(
        node_id: &str,
        price_mwh: Decimal,
        average: Decimal,
        timestamp_ms: i64,
        ttl_seconds: u64,
    ) -> Self {
        Self {
            alert_id: Self::alert_id_for(node_id, AlertType::Spike, timestamp_ms),
            node_id: node_id.to_string(),
            alert_type: AlertType::Spike,
            price_mwh,
            threshold_or_average: average
                .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero),
            raised_at: DateTime::from_timestamp_millis(timestamp_ms).unwrap_or_else(Utc::now),
            ttl_seconds,
        }
    }
}
