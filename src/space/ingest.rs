//! Price write path
//!
//! Updates are applied in input order. For each one the latest price is
//! overwritten, the node's window is appended and trimmed, and the reading
//! is checked against the window's baseline. Nothing spans nodes, so
//! concurrent batches for different nodes never contend.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::error::{SpaceError, SpaceResult};
use super::keys;
use super::registry::AlertRegistry;
use super::store::SharedStore;
use super::window::{RollingWindowStore, WindowEntry};
use crate::detector::{SpikeDetector, SpikeEvaluation};
use crate::util::now_millis;
use crate::{ActiveAlert, PriceUpdate};

#[derive(Clone)]
pub struct PriceIngestor {
    store: Arc<dyn SharedStore>,
    window: RollingWindowStore,
    registry: AlertRegistry,
    detector: SpikeDetector,
    alert_ttl: Duration,
}

impl PriceIngestor {
    pub fn new(
        store: Arc<dyn SharedStore>,
        window: RollingWindowStore,
        registry: AlertRegistry,
        detector: SpikeDetector,
        alert_ttl: Duration,
    ) -> Self {
        Self {
            store,
            window,
            registry,
            detector,
            alert_ttl,
        }
    }

    /// Apply a batch of updates and return the alerts it raised, in input
    /// order. Invalid updates are skipped. A store failure aborts the rest
    /// of the batch; updates already applied stay applied.
    #[instrument(skip_all, fields(batch = updates.len()))]
    pub async fn write_price_updates(
        &self,
        updates: &[PriceUpdate],
    ) -> SpaceResult<Vec<ActiveAlert>> {
        let mut raised = Vec::new();

        for update in updates {
            if let Err(reason) = update.validate() {
                warn!("skipping price update for {:?}: {reason}", update.node_id);
                continue;
            }
            if let Some(alert) = self.apply(update).await? {
                raised.push(alert);
            }
        }

        if !raised.is_empty() {
            info!(
                "{} of {} updates raised alerts",
                raised.len(),
                updates.len()
            );
        }
        Ok(raised)
    }

    async fn apply(&self, update: &PriceUpdate) -> SpaceResult<Option<ActiveAlert>> {
        let node_id = update.node_id.as_str();
        let entry = WindowEntry::new(update.price_mwh, update.effective_timestamp_ms(now_millis()));

        self.store
            .set(&keys::latest_price(node_id), update.price_mwh.to_string(), None)
            .await?;

        let window = self.window.record(node_id, &entry).await?;

        let average = match self.detector.evaluate(&window, &entry) {
            SpikeEvaluation::Spike { average } => average,
            SpikeEvaluation::Normal { average } => {
                debug!("{node_id} at {} within {} x {average}", entry.price_mwh, self.detector.multiplier());
                return Ok(None);
            }
            SpikeEvaluation::NoBaseline => return Ok(None),
        };

        let alert = ActiveAlert::spike(
            node_id,
            entry.price_mwh,
            average,
            entry.timestamp_ms,
            self.alert_ttl.as_secs(),
        );

        match self.registry.register(&alert, self.alert_ttl).await {
            Ok(()) => {
                info!(
                    "spike on {node_id}: {} > {} x {}",
                    alert.price_mwh,
                    self.detector.multiplier(),
                    alert.threshold_or_average
                );
                Ok(Some(alert))
            }
            Err(SpaceError::Serialization(e)) => {
                warn!("could not encode alert {}: {e}", alert.alert_id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
