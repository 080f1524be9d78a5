//! API shared state

use std::sync::Arc;

use crate::actors::PersistenceHandle;
use crate::space::EnergySpace;
use crate::storage::AlertHistoryBackend;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Hot state: prices, windows, active alerts
    pub space: EnergySpace,

    /// Handle to the persistence worker, for stats
    pub persistence: PersistenceHandle,

    /// Durable alert history, for stats and health
    pub history: Arc<dyn AlertHistoryBackend>,
}

impl ApiState {
    pub fn new(
        space: EnergySpace,
        persistence: PersistenceHandle,
        history: Arc<dyn AlertHistoryBackend>,
    ) -> Self {
        Self {
            space,
            persistence,
            history,
        }
    }
}
