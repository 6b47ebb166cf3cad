//! Persisted dirty markers.
//!
//! A dirty marker is a zero-byte file named after the dataset id, created
//! the first time a write-back is requested. Its presence tells anyone
//! inspecting the cache after a crash that the dataset may not have reached
//! the archive tier. The coordinator only ever creates markers; the write
//! worker removes one after a successful write-back.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::dataset::DatasetId;
use crate::error::CoordinatorError;

/// Name of the marker directory under the cache directory.
pub const MARKER_DIR_NAME: &str = "marker";

/// Directory of dirty markers.
#[derive(Debug, Clone)]
pub struct DirtyMarkerStore {
    dir: PathBuf,
}

impl DirtyMarkerStore {
    /// Opens the store, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CoordinatorError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| CoordinatorError::MarkerDirectory {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Returns the marker directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the marker path for `dataset`.
    pub fn path_for(&self, dataset: DatasetId) -> PathBuf {
        self.dir.join(dataset.to_string())
    }

    /// Ensures the marker for `dataset` exists.
    ///
    /// Returns `true` if this call created it and `false` if it was already
    /// there. Any other failure is an internal error.
    pub fn mark(&self, dataset: DatasetId) -> Result<bool, CoordinatorError> {
        let path = self.path_for(dataset);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => {
                debug!(path = %path.display(), "Created marker");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(source) => Err(CoordinatorError::Marker {
                dataset,
                path,
                source,
            }),
        }
    }

    /// Returns true if a marker exists for `dataset`.
    pub fn is_marked(&self, dataset: DatasetId) -> bool {
        self.path_for(dataset).is_file()
    }

    /// Removes the marker for `dataset`. A missing marker is not an error.
    pub fn clear(&self, dataset: DatasetId) -> io::Result<bool> {
        let path = self.path_for(dataset);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Removed marker");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Lists datasets with an outstanding marker, in ascending order.
    ///
    /// Files whose names are not dataset ids are skipped.
    pub fn pending(&self) -> Result<Vec<DatasetId>, CoordinatorError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| CoordinatorError::MarkerDirectory {
            path: self.dir.clone(),
            source,
        })?;

        let mut ids: Vec<DatasetId> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().to_str()?.parse().ok())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
