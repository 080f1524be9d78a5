//! PersistenceWorker - drains the alert history queue on a timer
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → AlertPersister::run_cycle → update stats
//!     ↑
//!     └─── Commands (RunNow, GetStats, Shutdown)
//! ```
//!
//! The actor owns its timer and runs cycles inline, so two cycles of the same
//! worker never overlap. A cycle that outlasts the interval delays the next
//! tick instead of causing a burst. Failed cycles are logged and the next
//! tick simply tries again.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use super::messages::{PersistenceCommand, PersistenceStats};
use crate::persistence::{AlertPersister, CycleReport};

pub struct PersistenceWorker {
    persister: AlertPersister,
    command_rx: mpsc::Receiver<PersistenceCommand>,
    interval: Duration,
    stats: PersistenceStats,
}

impl PersistenceWorker {
    pub fn new(
        persister: AlertPersister,
        command_rx: mpsc::Receiver<PersistenceCommand>,
        interval: Duration,
    ) -> Self {
        Self {
            persister,
            command_rx,
            interval,
            stats: PersistenceStats::default(),
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Shutdown command arrives or every handle is dropped.
    /// Either way one final cycle drains what's left.
    #[instrument(skip(self), fields(interval = ?self.interval))]
    pub async fn run(mut self) {
        info!("starting persistence worker");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let _ = self.cycle().await;
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        PersistenceCommand::RunNow { respond_to } => {
                            debug!("received RunNow command");
                            let result = self.cycle().await;
                            let _ = respond_to.send(result);
                        }

                        PersistenceCommand::GetStats { respond_to } => {
                            let _ = respond_to.send(self.stats.clone());
                        }

                        PersistenceCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("final persistence cycle before shutdown");
        let _ = self.cycle().await;

        info!(
            "persistence worker stopped after {} cycles ({} alerts persisted)",
            self.stats.cycles, self.stats.persisted
        );
    }

    async fn cycle(&mut self) -> anyhow::Result<CycleReport> {
        let result = self.persister.run_cycle().await;
        if let Err(e) = &result {
            error!("persistence cycle failed: {:#}", e);
        }
        self.stats.record(&result);
        result
    }
}

/// Handle for controlling the PersistenceWorker
#[derive(Clone)]
pub struct PersistenceHandle {
    sender: mpsc::Sender<PersistenceCommand>,
}

impl PersistenceHandle {
    /// Spawn a worker running `persister` every `interval`
    pub fn spawn(persister: AlertPersister, interval: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let worker = PersistenceWorker::new(persister, cmd_rx, interval);
        tokio::spawn(worker.run());

        Self { sender: cmd_tx }
    }

    /// Run a cycle now and wait for its report
    pub async fn run_now(&self) -> anyhow::Result<CycleReport> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PersistenceCommand::RunNow { respond_to: tx })
            .await?;

        rx.await?
    }

    pub async fn get_stats(&self) -> Option<PersistenceStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PersistenceCommand::GetStats { respond_to: tx })
            .await
            .ok()?;

        rx.await.ok()
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(PersistenceCommand::Shutdown).await;
    }

    /// True once the worker has exited
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
