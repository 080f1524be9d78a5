//! The shared energy space
//!
//! All hot state (latest prices, rolling windows, active alerts and the
//! persistence queue) lives in one `SharedStore` that every instance talks
//! to. Nothing here holds state of its own, so any number of instances can
//! serve the same space.
//!
//! ## Components
//!
//! - [`ingest::PriceIngestor`]: the write path
//! - [`window::RollingWindowStore`]: per-node price history
//! - [`registry::AlertRegistry`]: alerts with TTL and their indexes
//! - [`queue::PersistenceQueue`]: alerts waiting for durable storage
//!
//! [`EnergySpace`] wires them together over one store handle.

pub mod error;
pub mod ingest;
pub mod keys;
pub mod memory;
pub mod queue;
pub mod registry;
pub mod store;
pub mod timeout;
pub mod window;

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

pub use error::{SpaceError, SpaceResult};
pub use ingest::PriceIngestor;
pub use memory::MemoryStore;
pub use queue::PersistenceQueue;
pub use registry::AlertRegistry;
pub use store::SharedStore;
pub use timeout::TimedStore;
pub use window::{RollingWindowStore, WindowEntry};

use crate::config::SpaceConfig;
use crate::detector::SpikeDetector;
use crate::{ActiveAlert, PriceUpdate};

/// Hot state for one node
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub node_id: String,
    pub latest_price_mwh: Option<Decimal>,
    pub window: Vec<WindowEntry>,
    pub rolling_average: Option<Decimal>,
    pub active_alerts: Vec<ActiveAlert>,
}

#[derive(Clone)]
pub struct EnergySpace {
    store: Arc<dyn SharedStore>,
    ingestor: PriceIngestor,
    window: RollingWindowStore,
    registry: AlertRegistry,
    queue: PersistenceQueue,
}

impl EnergySpace {
    pub fn new(store: Arc<dyn SharedStore>, config: &SpaceConfig) -> anyhow::Result<Self> {
        let multiplier = config.threshold_multiplier().ok_or_else(|| {
            anyhow::anyhow!(
                "spike threshold multiplier {} is not representable",
                config.spike_threshold_multiplier
            )
        })?;

        let queue = PersistenceQueue::new(store.clone());
        let window = RollingWindowStore::new(store.clone(), config.window_duration_ms());
        let registry = AlertRegistry::new(store.clone(), queue.clone());
        let ingestor = PriceIngestor::new(
            store.clone(),
            window.clone(),
            registry.clone(),
            SpikeDetector::new(multiplier),
            config.alert_ttl(),
        );

        debug!(
            "energy space ready: window {} ms, ttl {:?}, multiplier {multiplier}",
            window.window_ms(),
            config.alert_ttl()
        );

        Ok(Self {
            store,
            ingestor,
            window,
            registry,
            queue,
        })
    }

    pub async fn write_price_updates(
        &self,
        updates: &[PriceUpdate],
    ) -> SpaceResult<Vec<ActiveAlert>> {
        self.ingestor.write_price_updates(updates).await
    }

    pub async fn active_alerts(&self) -> SpaceResult<Vec<ActiveAlert>> {
        self.registry.list_active().await
    }

    /// Latest price, current window, and live alerts for one node
    pub async fn node_snapshot(&self, node_id: &str) -> SpaceResult<NodeSnapshot> {
        let latest_price_mwh = self
            .store
            .get(&keys::latest_price(node_id))
            .await?
            .and_then(|raw| Decimal::from_str(&raw).ok());
        let window = self.window.entries(node_id).await?;
        let active_alerts = self.registry.list_active_for_node(node_id).await?;

        Ok(NodeSnapshot {
            node_id: node_id.to_string(),
            latest_price_mwh,
            rolling_average: SpikeDetector::rolling_average(&window),
            window,
            active_alerts,
        })
    }

    pub fn queue(&self) -> &PersistenceQueue {
        &self.queue
    }
}
