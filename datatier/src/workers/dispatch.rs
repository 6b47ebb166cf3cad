//! Task-per-order dispatcher.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use super::{TierWorker, WorkOrder, WorkerDispatch, WorkerError, WorkerKind};
use crate::coordinator::{CoordinatorConfig, DirtyMarkerStore};
use crate::dataset::DatasetRef;
use crate::error::CoordinatorError;

/// Runs every [`WorkOrder`] as an independent tokio task.
///
/// After a successful write-back the dataset's dirty marker is removed.
/// The order's completion guard lives inside the task, so the coordinator
/// is notified however the task ends.
pub struct SpawningDispatcher<W: TierWorker> {
    worker: Arc<W>,
    markers: DirtyMarkerStore,
    runtime: Handle,
}

impl<W: TierWorker> SpawningDispatcher<W> {
    /// Creates a dispatcher that spawns onto `runtime`.
    pub fn new(worker: Arc<W>, markers: DirtyMarkerStore, runtime: Handle) -> Self {
        Self {
            worker,
            markers,
            runtime,
        }
    }

    /// Creates a dispatcher that spawns onto the current tokio runtime.
    ///
    /// Fails when called outside a runtime.
    pub fn try_current(worker: Arc<W>, markers: DirtyMarkerStore) -> Result<Self, CoordinatorError> {
        let runtime = Handle::try_current().map_err(|e| CoordinatorError::Runtime(e.to_string()))?;
        Ok(Self::new(worker, markers, runtime))
    }
}

impl<W: TierWorker> WorkerDispatch for SpawningDispatcher<W> {
    fn dispatch(&self, order: WorkOrder) {
        let worker = Arc::clone(&self.worker);
        let markers = self.markers.clone();
        debug!(dataset = %order.dataset, worker = %order.kind, "Starting worker");
        self.runtime.spawn(run_order(worker, markers, order));
    }
}

async fn run_order<W: TierWorker>(worker: Arc<W>, markers: DirtyMarkerStore, order: WorkOrder) {
    let WorkOrder {
        kind,
        dataset,
        config,
        completion,
    } = order;

    let result = match kind {
        WorkerKind::Writer => write_back(worker.as_ref(), &markers, &dataset, &config).await,
        WorkerKind::Archiver => worker.archive(&dataset, &config).await,
        WorkerKind::Restorer => worker.restore(&dataset, &config).await,
        WorkerKind::WriteThenArchiver => {
            match write_back(worker.as_ref(), &markers, &dataset, &config).await {
                Ok(()) => worker.archive(&dataset, &config).await,
                Err(e) => Err(e),
            }
        }
    };

    match result {
        Ok(()) => info!(dataset = %dataset, worker = %kind, backend = worker.name(), "Worker finished"),
        Err(e) => warn!(dataset = %dataset, worker = %kind, backend = worker.name(), error = %e, "Worker failed"),
    }

    completion.finish();
}

async fn write_back<W: TierWorker>(
    worker: &W,
    markers: &DirtyMarkerStore,
    dataset: &DatasetRef,
    config: &CoordinatorConfig,
) -> Result<(), WorkerError> {
    worker.write(dataset, config).await?;
    markers
        .clear(dataset.id())
        .map_err(|e| WorkerError::io(markers.path_for(dataset.id()), e))?;
    Ok(())
}
