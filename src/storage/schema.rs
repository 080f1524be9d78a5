//! Alert history records and rows
//!
//! ## Record vs. Row
//!
//! - `AlertHistoryRecord` is what travels through the persistence queue. It
//!   is JSON with camelCase names and a millisecond UTC timestamp, so other
//!   instances sharing the queue can read it.
//! - `AlertHistoryRow` is what lands in the durable store: the record plus
//!   the time it was persisted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ActiveAlert, AlertType};

/// An alert waiting in the queue for durable storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertHistoryRecord {
    pub alert_id: String,
    pub node_id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub price_mwh: Decimal,
    pub threshold_or_average: Option<Decimal>,
    #[serde(with = "raised_at_format")]
    pub raised_at: DateTime<Utc>,
}

impl From<&ActiveAlert> for AlertHistoryRecord {
    fn from(alert: &ActiveAlert) -> Self {
        Self {
            alert_id: alert.alert_id.clone(),
            node_id: alert.node_id.clone(),
            alert_type: alert.alert_type,
            price_mwh: alert.price_mwh,
            threshold_or_average: Some(alert.threshold_or_average),
            raised_at: alert.raised_at,
        }
    }
}

/// A persisted alert history entry
#[derive(Debug, Clone, PartialEq)]
pub struct AlertHistoryRow {
    pub alert_id: String,
    pub node_id: String,
    pub alert_type: AlertType,
    pub price_mwh: Decimal,
    pub threshold_or_average: Option<Decimal>,
    pub raised_at: DateTime<Utc>,
    pub persisted_at: DateTime<Utc>,
}

impl AlertHistoryRow {
    pub fn from_record(record: AlertHistoryRecord, persisted_at: DateTime<Utc>) -> Self {
        Self {
            alert_id: record.alert_id,
            node_id: record.node_id,
            alert_type: record.alert_type,
            price_mwh: record.price_mwh,
            threshold_or_average: record.threshold_or_average,
            raised_at: record.raised_at,
            persisted_at,
        }
    }

    pub fn into_record(self) -> AlertHistoryRecord {
        AlertHistoryRecord {
            alert_id: self.alert_id,
            node_id: self.node_id,
            alert_type: self.alert_type,
            price_mwh: self.price_mwh,
            threshold_or_average: self.threshold_or_average,
            raised_at: self.raised_at,
        }
    }
}

/// `raisedAt` on the queue: `2024-01-31T12:00:00.000+0000`.
/// RFC 3339 is accepted when reading.
mod raised_at_format {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(&raw))
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
