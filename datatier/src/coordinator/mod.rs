//! Deferred-operation coordination for datasets.
//!
//! Callers ask for a dataset to be written back, archived or restored with
//! [`Coordinator::queue`]. Requests are merged per dataset into a single
//! [`QueuedState`], write-backs are debounced, and a [`QueueSweeper`]
//! periodically hands eligible datasets to workers while guaranteeing that
//! at most one worker owns a dataset at a time.
//!
//! # Components
//!
//! - [`state`] - request merge table
//! - [`DelayScheduler`] - write-back debounce deadlines
//! - [`LockRegistry`] - read locks that block archival
//! - [`DirtyMarkerStore`] - on-disk markers for pending write-backs
//! - [`Coordinator`] - all of the above behind one lock
//! - [`QueueSweeper`] - background dispatch loop
//! - [`ServiceStatus`] - consistent snapshot for status reporting
//!
//! # Example
//!
//! ```ignore
//! use datatier::coordinator::{Coordinator, CoordinatorConfig, QueueSweeper, RequestedOp};
//! use datatier::dataset::DatasetRef;
//!
//! let coordinator = Coordinator::new(CoordinatorConfig::new("/var/cache/datatier"))?;
//! coordinator.queue(DatasetRef::from_id(42), RequestedOp::Write)?;
//!
//! QueueSweeper::new(Arc::clone(&coordinator), dispatcher).spawn(shutdown.clone());
//! ```

mod config;
mod delay;
mod locks;
mod machine;
mod marker;
pub mod state;
mod status;
mod sweeper;

pub use config::{
    CoordinatorConfig, DEFAULT_PROCESS_QUEUE_INTERVAL_SECS, DEFAULT_WRITE_DELAY_SECS,
    MAX_WRITE_DELAY_SECS,
};
pub use delay::DelayScheduler;
pub use locks::{LockId, LockRegistry};
pub use machine::{CompletionGuard, Coordinator, SweepReport};
pub use marker::{DirtyMarkerStore, MARKER_DIR_NAME};
pub use state::{QueuedState, RequestedOp};
pub use status::{QueueEntry, RequestStatus, ServiceStatus};
pub use sweeper::QueueSweeper;
