//! Drain cycle from the persistence queue into durable history
//!
//! One cycle:
//!
//! ```text
//! drain(batch) → collapse repeated ids → bulk existence check → insert_one per new record
//! ```
//!
//! Each record is written as its own unit of work, so one bad record never
//! rolls back the others. "Already there", whether found by the bulk check,
//! the per-record check or the unique constraint, counts as success.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, instrument, trace};

use crate::space::PersistenceQueue;
use crate::storage::{AlertHistoryBackend, AlertHistoryRecord, AlertHistoryRow, SaveOutcome};

/// Outcome of a single drain cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Valid records taken off the queue
    pub drained: usize,
    pub persisted: usize,
    /// Records that were already persisted (or repeated within the batch)
    pub duplicates: usize,
    /// Records whose insert failed for any reason other than a duplicate
    pub failed: usize,
    /// Failed records pushed back onto the queue
    pub requeued: usize,
}

impl CycleReport {
    pub fn is_idle(&self) -> bool {
        self.drained == 0
    }
}

pub struct AlertPersister {
    queue: PersistenceQueue,
    backend: Arc<dyn AlertHistoryBackend>,
    batch_size: usize,
}

impl AlertPersister {
    pub fn new(
        queue: PersistenceQueue,
        backend: Arc<dyn AlertHistoryBackend>,
        batch_size: usize,
    ) -> Self {
        Self {
            queue,
            backend,
            batch_size,
        }
    }

    #[instrument(skip(self), fields(batch_size = self.batch_size))]
    pub async fn run_cycle(&self) -> anyhow::Result<CycleReport> {
        let drained = self
            .queue
            .drain(self.batch_size)
            .await
            .context("failed to drain alert history queue")?;

        let mut report = CycleReport {
            drained: drained.len(),
            ..CycleReport::default()
        };
        if drained.is_empty() {
            return Ok(report);
        }

        let mut seen = HashSet::with_capacity(drained.len());
        let batch: Vec<AlertHistoryRecord> = drained
            .into_iter()
            .filter(|record| seen.insert(record.alert_id.clone()))
            .collect();
        report.duplicates = report.drained - batch.len();

        let ids: Vec<String> = batch.iter().map(|r| r.alert_id.clone()).collect();
        let existing = match self.backend.existing_alert_ids(&ids).await {
            Ok(existing) => existing,
            Err(e) => {
                self.requeue(&batch).await;
                return Err(anyhow::anyhow!(e)
                    .context(format!("existence check failed for {} alerts", batch.len())));
            }
        };

        let mut to_requeue = Vec::new();
        for record in batch {
            if existing.contains(&record.alert_id) {
                trace!("alert {} already persisted", record.alert_id);
                report.duplicates += 1;
                continue;
            }

            let row = AlertHistoryRow::from_record(record.clone(), Utc::now());
            match self.backend.insert_one(row).await {
                Ok(SaveOutcome::Inserted) => report.persisted += 1,
                Ok(SaveOutcome::AlreadyPersisted) => report.duplicates += 1,
                Err(e) if e.is_duplicate() => {
                    trace!("alert {} persisted concurrently", record.alert_id);
                    report.duplicates += 1;
                }
                Err(e) => {
                    error!("failed to persist alert {}: {e}", record.alert_id);
                    report.failed += 1;
                    to_requeue.push(record);
                }
            }
        }

        if !to_requeue.is_empty() {
            report.requeued = self.requeue(&to_requeue).await;
        }

        debug!(
            drained = report.drained,
            persisted = report.persisted,
            duplicates = report.duplicates,
            failed = report.failed,
            "persistence cycle complete"
        );
        Ok(report)
    }

    /// Push records back for the next cycle; returns how many made it
    async fn requeue(&self, records: &[AlertHistoryRecord]) -> usize {
        match self.queue.requeue(records).await {
            Ok(()) => records.len(),
            Err(e) => {
                error!("lost {} alert history records: requeue failed: {e}", records.len());
                0
            }
        }
    }
}
