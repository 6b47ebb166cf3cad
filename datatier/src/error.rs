//! Coordinator error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::dataset::DatasetId;

/// Errors surfaced by the coordinator to its callers.
///
/// Scheduling decisions (debounce, dropped archives) are never errors; the
/// only failures a caller sees come from the environment.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The dirty marker for a dataset could not be created.
    #[error("Failed to create dirty marker {path} for dataset {dataset}: {source}")]
    Marker {
        dataset: DatasetId,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The marker directory could not be created or read.
    #[error("Marker directory {path} unavailable: {source}")]
    MarkerDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The async runtime needed for background work is not available.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl CoordinatorError {
    /// Returns true for failures of the storage environment (permissions,
    /// full disk), as opposed to misuse of the coordinator.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Marker { .. } | Self::MarkerDirectory { .. })
    }
}
