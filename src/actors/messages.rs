//! Message types for actor communication
//!
//! Commands are request/response messages sent over mpsc; replies come back
//! on a oneshot channel carried in the command.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::oneshot;

use crate::persistence::CycleReport;

/// Commands that can be sent to the PersistenceWorker
#[derive(Debug)]
pub enum PersistenceCommand {
    /// Run a drain cycle immediately, bypassing the interval timer
    ///
    /// Used for testing and manual flushes.
    RunNow {
        respond_to: oneshot::Sender<anyhow::Result<CycleReport>>,
    },

    GetStats {
        respond_to: oneshot::Sender<PersistenceStats>,
    },

    /// Gracefully shut down the worker
    ///
    /// The worker runs one last cycle before exiting.
    Shutdown,
}

/// Running totals across all cycles of one worker
#[derive(Debug, Clone, Default, Serialize)]
pub struct PersistenceStats {
    pub cycles: u64,
    pub failed_cycles: u64,
    pub persisted: u64,
    pub duplicates: u64,
    pub failed_records: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_report: Option<CycleReport>,
}

impl PersistenceStats {
    pub fn record(&mut self, result: &anyhow::Result<CycleReport>) {
        self.cycles += 1;
        self.last_cycle_at = Some(Utc::now());
        match result {
            Ok(report) => {
                self.persisted += report.persisted as u64;
                self.duplicates += report.duplicates as u64;
                self.failed_records += report.failed as u64;
                self.last_report = Some(*report);
            }
            Err(_) => self.failed_cycles += 1,
        }
    }
}
