//! Periodic queue sweeper.
//!
//! The sweeper is a background tokio task that promotes queued requests into
//! running work:
//!
//! 1. Sleeps for the configured process-queue interval
//! 2. Runs one pass of [`Coordinator::process_queue`]
//! 3. Repeats until the shutdown token is cancelled
//!
//! The next sleep only starts once a pass has returned, so passes never
//! overlap and a slow pass delays the next one. Each pass runs inside
//! `catch_unwind`; a panic is logged and the loop carries on.
//!
//! # Example
//!
//! ```ignore
//! use datatier::coordinator::QueueSweeper;
//!
//! let sweeper = QueueSweeper::new(Arc::clone(&coordinator), dispatcher);
//! let handle = sweeper.spawn(shutdown.clone());
//! ```

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::machine::{Coordinator, SweepReport};
use crate::workers::WorkerDispatch;

/// Background task that dispatches queued work on a fixed period.
pub struct QueueSweeper {
    coordinator: Arc<Coordinator>,
    dispatcher: Arc<dyn WorkerDispatch>,
    interval: Duration,
    passes: Arc<AtomicU64>,
}

impl QueueSweeper {
    /// Creates a sweeper using the coordinator's configured interval.
    pub fn new(coordinator: Arc<Coordinator>, dispatcher: Arc<dyn WorkerDispatch>) -> Self {
        let interval = coordinator.config().process_queue_interval;
        Self {
            coordinator,
            dispatcher,
            interval,
            passes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Overrides the interval between passes.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Returns the interval between passes.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns a counter of completed passes, including ones that panicked.
    pub fn pass_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.passes)
    }

    /// Runs a single pass, containing any panic.
    ///
    /// Returns `None` if the pass panicked.
    pub fn run_pass(&self) -> Option<SweepReport> {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.coordinator.process_queue(self.dispatcher.as_ref())
        }));
        self.passes.fetch_add(1, Ordering::Relaxed);

        match result {
            Ok(report) => {
                if !report.is_idle() {
                    debug!(
                        dispatched = report.dispatched.len(),
                        dropped_archives = report.dropped_archives.len(),
                        deferred_writes = report.deferred_writes,
                        "Queue pass finished"
                    );
                }
                Some(report)
            }
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(reason = %reason, "Queue pass panicked, next pass still scheduled");
                None
            }
        }
    }

    /// Runs the sweeper until shutdown is signalled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            "Queue sweeper starting"
        );

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Queue sweeper shutting down");
                    break;
                }

                _ = tokio::time::sleep(self.interval) => {
                    self.run_pass();
                }
            }
        }
    }

    /// Spawns [`run`](Self::run) onto the current tokio runtime.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
