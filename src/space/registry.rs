//! Active alert registry
//!
//! An alert payload lives under its own key with a TTL. Two sets index it:
//! the global candidate set and a per-node set. Index entries can outlive
//! their payload, so readers resolve every candidate and prune the ones
//! whose payload has expired.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, trace};

use super::error::SpaceResult;
use super::keys;
use super::queue::PersistenceQueue;
use super::store::SharedStore;
use crate::ActiveAlert;
use crate::storage::AlertHistoryRecord;

/// Outcome of looking up one candidate id
enum Candidate {
    Live(ActiveAlert),
    Expired,
    Corrupt,
}

#[derive(Clone)]
pub struct AlertRegistry {
    store: Arc<dyn SharedStore>,
    queue: PersistenceQueue,
}

impl AlertRegistry {
    pub fn new(store: Arc<dyn SharedStore>, queue: PersistenceQueue) -> Self {
        Self { store, queue }
    }

    /// Store the alert with `ttl`, index it, and queue it for history
    #[instrument(skip(self, alert), fields(alert_id = %alert.alert_id))]
    pub async fn register(&self, alert: &ActiveAlert, ttl: Duration) -> SpaceResult<()> {
        let payload = serde_json::to_string(alert)?;

        self.store
            .set(&keys::alert(&alert.alert_id), payload, Some(ttl))
            .await?;
        self.store
            .sadd(&keys::active_alert_ids(), &alert.alert_id)
            .await?;

        let node_key = keys::node_alerts(&alert.node_id);
        self.store.sadd(&node_key, &alert.alert_id).await?;
        self.store.expire(&node_key, ttl).await?;

        self.queue
            .enqueue(&AlertHistoryRecord::from(alert))
            .await?;

        debug!("registered alert for {} with ttl {:?}", alert.node_id, ttl);
        Ok(())
    }

    /// Every unexpired alert, newest first. Ids whose payload has expired
    /// are removed from the global index.
    pub async fn list_active(&self) -> SpaceResult<Vec<ActiveAlert>> {
        self.resolve_index(&keys::active_alert_ids()).await
    }

    /// Unexpired alerts for one node, newest first
    pub async fn list_active_for_node(&self, node_id: &str) -> SpaceResult<Vec<ActiveAlert>> {
        self.resolve_index(&keys::node_alerts(node_id)).await
    }

    async fn resolve_index(&self, index_key: &str) -> SpaceResult<Vec<ActiveAlert>> {
        let ids = self.store.smembers(index_key).await?;
        let mut alerts = Vec::with_capacity(ids.len());

        for id in ids {
            match self.lookup(&id).await? {
                Candidate::Live(alert) => alerts.push(alert),
                Candidate::Expired => {
                    self.store.srem(index_key, &id).await?;
                    trace!("pruned expired alert {id} from {index_key}");
                }
                Candidate::Corrupt => {}
            }
        }

        alerts.sort_by(newest_first);
        Ok(alerts)
    }

    async fn lookup(&self, alert_id: &str) -> SpaceResult<Candidate> {
        let Some(raw) = self.store.get(&keys::alert(alert_id)).await? else {
            return Ok(Candidate::Expired);
        };
        match serde_json::from_str(&raw) {
            Ok(alert) => Ok(Candidate::Live(alert)),
            Err(e) => {
                debug!("skipping unreadable alert payload {alert_id}: {e}");
                Ok(Candidate::Corrupt)
            }
        }
    }
}

fn newest_first(a: &ActiveAlert, b: &ActiveAlert) -> Ordering {
    b.raised_at
        .cmp(&a.raised_at)
        .then_with(|| a.alert_id.cmp(&b.alert_id))
}
