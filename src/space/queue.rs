//! FIFO queue of alerts awaiting durable storage
//!
//! Records are JSON on a shared list: enqueued at the tail and drained from
//! the head. A drained record is gone from the queue whether or not it ends
//! up persisted; failed records only come back through `requeue`.

use std::sync::Arc;

use tracing::{debug, warn};

use super::error::SpaceResult;
use super::keys;
use super::store::SharedStore;
use crate::storage::AlertHistoryRecord;

#[derive(Clone)]
pub struct PersistenceQueue {
    store: Arc<dyn SharedStore>,
}

impl PersistenceQueue {
    pub fn new(store: Arc<dyn SharedStore>) -> Self {
        Self { store }
    }

    /// Append a record to the tail. A record that can't be encoded is
    /// logged and dropped; only store failures are returned.
    pub async fn enqueue(&self, record: &AlertHistoryRecord) -> SpaceResult<()> {
        let payload = match serde_json::to_string(record) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("dropping alert {} from history queue: {e}", record.alert_id);
                return Ok(());
            }
        };
        let depth = self
            .store
            .rpush(&keys::alert_history_queue(), payload)
            .await?;
        debug!("queued alert {} for persistence (depth {depth})", record.alert_id);
        Ok(())
    }

    /// Pop up to `max` entries from the head.
    ///
    /// Malformed entries are skipped but still count toward `max`. If the
    /// store fails after at least one pop, the batch collected so far is
    /// returned; a failure on the first pop is an error.
    pub async fn drain(&self, max: usize) -> SpaceResult<Vec<AlertHistoryRecord>> {
        let key = keys::alert_history_queue();
        let mut batch = Vec::new();

        for popped in 0..max {
            let raw = match self.store.lpop(&key).await {
                Ok(Some(raw)) => raw,
                Ok(None) => break,
                Err(e) if popped == 0 => return Err(e),
                Err(e) => {
                    warn!("history queue drain stopped after {popped} pops: {e}");
                    break;
                }
            };

            match serde_json::from_str::<AlertHistoryRecord>(&raw) {
                Ok(record) => batch.push(record),
                Err(e) => warn!("discarding malformed history queue entry: {e}"),
            }
        }

        Ok(batch)
    }

    /// Put records back at the tail for a later cycle
    pub async fn requeue(&self, records: &[AlertHistoryRecord]) -> SpaceResult<()> {
        for record in records {
            self.enqueue(record).await?;
        }
        Ok(())
    }
}
