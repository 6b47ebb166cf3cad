//! Worker error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::dataset::DatasetId;

/// Errors raised while moving a dataset between tiers.
///
/// Workers report these through logging only; the coordinator never sees
/// them, it just learns the dataset is no longer active.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The copy the operation needs to read from does not exist.
    #[error("Dataset {dataset} has no copy at {path}")]
    MissingSource { dataset: DatasetId, path: PathBuf },

    /// The dataset location would resolve outside the tier root.
    #[error("Dataset {dataset} location {location} is not inside the tier")]
    InvalidLocation { dataset: DatasetId, location: PathBuf },

    /// Filesystem failure while copying or removing data.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A blocking copy task was cancelled or panicked.
    #[error("Worker task failed: {0}")]
    Task(String),
}

impl WorkerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
