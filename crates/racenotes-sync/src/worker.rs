//! Background drain worker: a recurring reconnect check that pushes the
//! pending-write queue through the coordinator.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument};

use racenotes_core::defaults::{DRAIN_INTERVAL_SECS, EVENT_BUS_CAPACITY};
use racenotes_core::{Error, Result};

use crate::coordinator::SyncCoordinator;

/// Configuration for the drain worker.
#[derive(Debug, Clone)]
pub struct DrainConfig {
    /// Interval between reconnect checks.
    pub interval: Duration,
    /// Whether the background drain runs at all.
    pub enabled: bool,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DRAIN_INTERVAL_SECS),
            enabled: true,
        }
    }
}

impl DrainConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `SYNC_DRAIN_ENABLED` | `true` | Enable/disable the background drain |
    /// | `SYNC_DRAIN_INTERVAL_SECS` | `30` | Seconds between reconnect checks |
    pub fn from_env() -> Self {
        let enabled = std::env::var("SYNC_DRAIN_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let interval_secs = std::env::var("SYNC_DRAIN_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DRAIN_INTERVAL_SECS);

        Self {
            interval: Duration::from_secs(interval_secs),
            enabled,
        }
    }

    /// Set the interval between reconnect checks.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Enable or disable the background drain.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Event emitted by the drain worker.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Worker started.
    WorkerStarted,
    /// Worker stopped.
    WorkerStopped,
    /// A drain pass applied queued writes remotely.
    QueueDrained { applied: usize },
    /// A drain pass stopped early; the remote is still unreachable.
    DrainDeferred { remaining: usize },
    /// The remote store rejected a queued write; it was dropped.
    ItemRejected { sequence: u64, error: String },
}

/// Handle for controlling a running drain worker.
pub struct WorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
    event_rx: broadcast::Receiver<SyncEvent>,
}

impl WorkerHandle {
    /// Signal the worker to shut down gracefully. Shutdown between ticks
    /// never mutates queue state.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        Ok(())
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_rx.resubscribe()
    }
}

/// Worker that periodically drains the pending-write queue.
pub struct DrainWorker {
    coordinator: Arc<SyncCoordinator>,
    config: DrainConfig,
    event_tx: broadcast::Sender<SyncEvent>,
}

impl DrainWorker {
    /// Create a new drain worker over a coordinator.
    pub fn new(coordinator: Arc<SyncCoordinator>, config: DrainConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self {
            coordinator,
            config,
            event_tx,
        }
    }

    /// Start the worker and return a handle for control.
    pub fn start(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
        });

        WorkerHandle {
            shutdown_tx,
            event_rx,
        }
    }

    #[instrument(skip(self, shutdown_rx))]
    async fn run(&self, shutdown_rx: &mut mpsc::Receiver<()>) {
        if !self.config.enabled {
            info!("Drain worker is disabled, not starting");
            return;
        }

        info!(
            interval_secs = self.config.interval.as_secs(),
            "Drain worker started"
        );
        let _ = self.event_tx.send(SyncEvent::WorkerStarted);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Drain worker received shutdown signal");
                    break;
                }
                _ = sleep(self.config.interval) => {}
            }

            self.tick().await;
        }

        let _ = self.event_tx.send(SyncEvent::WorkerStopped);
    }

    /// One reconnect check. Skips the remote entirely when nothing is
    /// queued.
    async fn tick(&self) {
        if self.coordinator.pending_count().await == 0 {
            return;
        }

        match self.coordinator.drain_pending_writes().await {
            Ok(report) => {
                for (sequence, error) in &report.rejected {
                    let _ = self.event_tx.send(SyncEvent::ItemRejected {
                        sequence: *sequence,
                        error: error.clone(),
                    });
                }
                if report.deferred > 0 {
                    debug!(remaining = report.deferred, "Drain deferred");
                    let _ = self.event_tx.send(SyncEvent::DrainDeferred {
                        remaining: report.deferred,
                    });
                } else if !report.applied.is_empty() {
                    let _ = self.event_tx.send(SyncEvent::QueueDrained {
                        applied: report.applied.len(),
                    });
                }
            }
            Err(e) => {
                // Local store failure; nothing to do but report and retry
                // next tick.
                error!(error = %e, "Drain pass failed");
            }
        }
    }
}
