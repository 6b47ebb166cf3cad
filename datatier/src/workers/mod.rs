//! Boundary between the coordinator and the workers that move data.
//!
//! The sweeper hands every dispatched dataset to a [`WorkerDispatch`] as a
//! [`WorkOrder`]. Dispatch is fire-and-forget: the order carries a
//! [`CompletionGuard`](crate::coordinator::CompletionGuard) that releases the
//! dataset from the active set when the work finishes, fails, or panics.
//!
//! - [`TierWorker`] - the data movement itself (write, archive, restore)
//! - [`SpawningDispatcher`] - runs each order as its own tokio task
//! - [`DirectoryTiers`] - a [`TierWorker`] over two local directories

mod dispatch;
mod error;
mod fs;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use dispatch::SpawningDispatcher;
pub use error::WorkerError;
pub use fs::DirectoryTiers;

use crate::coordinator::{CompletionGuard, CoordinatorConfig, QueuedState};
use crate::dataset::DatasetRef;

/// Kind of worker started for a dispatched dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerKind {
    /// Writes the dataset back to the archive tier.
    Writer,
    /// Removes the dataset from the online tier.
    Archiver,
    /// Copies the dataset back to the online tier.
    Restorer,
    /// Writes the dataset back, then archives it.
    WriteThenArchiver,
}

impl WorkerKind {
    /// Returns the worker that carries out a queued state.
    pub fn for_state(state: QueuedState) -> Self {
        match state {
            QueuedState::WriteRequested => Self::Writer,
            QueuedState::ArchiveRequested => Self::Archiver,
            QueuedState::RestoreRequested => Self::Restorer,
            QueuedState::WriteThenArchiveRequested => Self::WriteThenArchiver,
        }
    }

    /// Returns the worker name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Writer => "Writer",
            Self::Archiver => "Archiver",
            Self::Restorer => "Restorer",
            Self::WriteThenArchiver => "WriteThenArchiver",
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of dispatched work.
pub struct WorkOrder {
    /// Which worker to run.
    pub kind: WorkerKind,
    /// The dataset the worker owns until it completes.
    pub dataset: DatasetRef,
    /// Configuration shared with every worker.
    pub config: Arc<CoordinatorConfig>,
    /// Reports completion back to the coordinator when dropped.
    pub completion: CompletionGuard,
}

impl fmt::Debug for WorkOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkOrder")
            .field("kind", &self.kind)
            .field("dataset", &self.dataset)
            .finish()
    }
}

/// Starts work for dispatched datasets.
///
/// Implementations must return promptly: the sweeper calls `dispatch` for
/// every eligible dataset of a pass in turn.
pub trait WorkerDispatch: Send + Sync {
    /// Starts `order` and returns without waiting for it.
    fn dispatch(&self, order: WorkOrder);
}

/// Boxed future returned by [`TierWorker`] operations.
pub type WorkerFuture<'a> = Pin<Box<dyn Future<Output = Result<(), WorkerError>> + Send + 'a>>;

/// Moves dataset bytes between the online and archive tiers.
pub trait TierWorker: Send + Sync + 'static {
    /// Returns a short name for logging.
    fn name(&self) -> &str;

    /// Copies current online data to the archive tier.
    fn write<'a>(&'a self, dataset: &'a DatasetRef, config: &'a CoordinatorConfig)
        -> WorkerFuture<'a>;

    /// Removes the dataset from the online tier.
    fn archive<'a>(
        &'a self,
        dataset: &'a DatasetRef,
        config: &'a CoordinatorConfig,
    ) -> WorkerFuture<'a>;

    /// Copies the dataset from the archive tier back online.
    fn restore<'a>(
        &'a self,
        dataset: &'a DatasetRef,
        config: &'a CoordinatorConfig,
    ) -> WorkerFuture<'a>;
}
