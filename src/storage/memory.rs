//! In-memory alert history backend (no persistence)
//!
//! Useful for tests and for running without a database file. All data is
//! lost on restart.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::backend::{AlertHistoryBackend, HealthStatus, SaveOutcome};
use super::error::StorageResult;
use super::schema::AlertHistoryRow;

/// In-memory backend keyed by alert id
pub struct MemoryBackend {
    rows: RwLock<HashMap<String, AlertHistoryRow>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertHistoryBackend for MemoryBackend {
    async fn existing_alert_ids(&self, alert_ids: &[String]) -> StorageResult<HashSet<String>> {
        let rows = self.rows.read().await;
        Ok(alert_ids
            .iter()
            .filter(|id| rows.contains_key(id.as_str()))
            .cloned()
            .collect())
    }

    async fn insert_one(&self, row: AlertHistoryRow) -> StorageResult<SaveOutcome> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&row.alert_id) {
            trace!("alert {} already persisted", row.alert_id);
            return Ok(SaveOutcome::AlreadyPersisted);
        }
        debug!("persisting alert {} in memory", row.alert_id);
        rows.insert(row.alert_id.clone(), row);
        Ok(SaveOutcome::Inserted)
    }

    async fn find_by_alert_id(&self, alert_id: &str) -> StorageResult<Option<AlertHistoryRow>> {
        Ok(self.rows.read().await.get(alert_id).cloned())
    }

    async fn count(&self) -> StorageResult<u64> {
        Ok(self.rows.read().await.len() as u64)
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        Ok(HealthStatus {
            healthy: true,
            message: "In-memory storage operational".to_string(),
            metadata: HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("total_alerts".to_string(), self.count().await?.to_string()),
            ]),
        })
    }

    async fn get_stats(&self) -> StorageResult<String> {
        let rows = self.rows.read().await;
        let nodes: HashSet<&str> = rows.values().map(|r| r.node_id.as_str()).collect();
        Ok(format!(
            "In-Memory: {} alerts across {} nodes",
            rows.len(),
            nodes.len()
        ))
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }
}
