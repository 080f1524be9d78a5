//! Per-node rolling window of recent prices
//!
//! Each node's window is a sorted set scored by reading timestamp, with
//! members encoded as `"{price}:{timestampMs}"`. The window is trimmed on
//! every write rather than by a background sweep, so after a write every
//! remaining entry is newer than `timestamp - window`.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, instrument, trace};

use super::error::SpaceResult;
use super::keys;
use super::store::SharedStore;

/// One reading in a node's window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowEntry {
    pub price_mwh: Decimal,
    pub timestamp_ms: i64,
}

impl WindowEntry {
    pub fn new(price_mwh: Decimal, timestamp_ms: i64) -> Self {
        Self {
            price_mwh,
            timestamp_ms,
        }
    }

    /// Sorted-set member for this entry
    pub fn member(&self) -> String {
        format!("{}:{}", self.price_mwh, self.timestamp_ms)
    }

    /// Decode a stored member. The score is authoritative for the timestamp.
    pub fn parse(member: &str, score: f64) -> Option<Self> {
        let (price, _) = member.split_once(':')?;
        let price_mwh = Decimal::from_str(price).ok()?;
        Some(Self {
            price_mwh,
            timestamp_ms: score as i64,
        })
    }
}

#[derive(Clone)]
pub struct RollingWindowStore {
    store: Arc<dyn SharedStore>,
    window_ms: i64,
}

impl RollingWindowStore {
    pub fn new(store: Arc<dyn SharedStore>, window_ms: i64) -> Self {
        Self { store, window_ms }
    }

    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    pub async fn append(&self, node_id: &str, entry: &WindowEntry) -> SpaceResult<()> {
        self.store
            .zadd(
                &keys::price_window(node_id),
                entry.member(),
                entry.timestamp_ms as f64,
            )
            .await
    }

    /// Drop entries at or before `latest_ts - window`
    pub async fn trim(&self, node_id: &str, latest_ts: i64) -> SpaceResult<usize> {
        let cutoff = latest_ts - self.window_ms;
        let removed = self
            .store
            .zremrange_by_score(&keys::price_window(node_id), f64::NEG_INFINITY, cutoff as f64)
            .await?;
        if removed > 0 {
            trace!("trimmed {removed} entries older than {cutoff} from window of {node_id}");
        }
        Ok(removed)
    }

    /// Valid entries in timestamp order; unparseable members are skipped
    pub async fn entries(&self, node_id: &str) -> SpaceResult<Vec<WindowEntry>> {
        let raw = self
            .store
            .zrange_by_score(&keys::price_window(node_id), f64::NEG_INFINITY, f64::INFINITY)
            .await?;

        Ok(raw
            .iter()
            .filter_map(|(member, score)| {
                let entry = WindowEntry::parse(member, *score);
                if entry.is_none() {
                    debug!("skipping malformed window entry {member:?} for {node_id}");
                }
                entry
            })
            .collect())
    }

    /// Append, trim, and return the resulting window
    #[instrument(skip(self, entry), fields(ts = entry.timestamp_ms))]
    pub async fn record(&self, node_id: &str, entry: &WindowEntry) -> SpaceResult<Vec<WindowEntry>> {
        self.append(node_id, entry).await?;
        self.trim(node_id, entry.timestamp_ms).await?;
        self.entries(node_id).await
    }
}
