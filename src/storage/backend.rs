//! Alert history backend trait definition
//!
//! The durable store is written only by the persistence worker. Uniqueness
//! of `alert_id` is enforced by the backend itself, so two workers racing on
//! the same record end with exactly one row.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use super::error::StorageResult;
use super::schema::AlertHistoryRow;

/// Health status of the storage backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: HashMap<String, String>,
}

/// What a single-row insert did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    /// A row with the same alert id was already there; nothing was written
    AlreadyPersisted,
}

/// Trait for durable alert history storage
///
/// Implementations must be `Send + Sync` as they are shared between the
/// persistence worker and the API.
#[async_trait]
pub trait AlertHistoryBackend: Send + Sync {
    /// The subset of `alert_ids` that already has a row
    async fn existing_alert_ids(&self, alert_ids: &[String]) -> StorageResult<HashSet<String>>;

    /// Insert one row as its own unit of work
    ///
    /// Checks for an existing row first and reports `AlreadyPersisted`
    /// instead of writing. A concurrent insert that slips past the check is
    /// rejected by the unique constraint and surfaces as
    /// `StorageError::DuplicateKey`.
    async fn insert_one(&self, row: AlertHistoryRow) -> StorageResult<SaveOutcome>;

    async fn find_by_alert_id(&self, alert_id: &str) -> StorageResult<Option<AlertHistoryRow>>;

    /// Total number of persisted alerts
    async fn count(&self) -> StorageResult<u64>;

    /// Check backend health
    ///
    /// Performs a lightweight operation to verify the backend is
    /// operational. Failures are reported in the status, not as errors.
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Human-readable stats (e.g. "SQLite: 1200 alerts, 0.45 MB on disk")
    async fn get_stats(&self) -> StorageResult<String>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}
