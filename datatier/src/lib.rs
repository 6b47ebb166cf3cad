//! datatier - dataset lifecycle coordination across two storage tiers
//!
//! Datasets live on a fast online tier and a slower archive tier. This
//! library decides *when* a dataset is written back, archived or restored:
//! requests are merged per dataset, write-backs are debounced, read locks
//! block archival, and a background sweeper hands eligible datasets to
//! workers so that only one worker ever owns a dataset.
//!
//! # High-Level API
//!
//! ```ignore
//! use datatier::config::ConfigFile;
//! use datatier::coordinator::{Coordinator, QueueSweeper, RequestedOp};
//! use datatier::dataset::DatasetRef;
//! use datatier::workers::SpawningDispatcher;
//!
//! let config = ConfigFile::load()?;
//! let coordinator = Coordinator::new(config.coordinator_config())?;
//! let dispatcher = SpawningDispatcher::try_current(
//!     Arc::new(config.directory_tiers()),
//!     coordinator.markers().clone(),
//! )?;
//! QueueSweeper::new(Arc::clone(&coordinator), Arc::new(dispatcher)).spawn(shutdown.clone());
//!
//! coordinator.queue(DatasetRef::from_id(7), RequestedOp::Write)?;
//! ```

pub mod config;
pub mod coordinator;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod workers;

pub use coordinator::{Coordinator, CoordinatorConfig, RequestedOp, ServiceStatus};
pub use dataset::{DatasetId, DatasetRef};
pub use error::CoordinatorError;

/// Version of the datatier library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
