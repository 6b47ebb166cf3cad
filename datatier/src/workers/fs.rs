//! Directory-backed storage tiers.
//!
//! The online tier and the archive tier are plain directories. A dataset
//! lives at `<tier>/<location>` in either of them:
//!
//! - write: copy online to archive, replacing any previous archive copy
//! - archive: make sure an archive copy exists, then remove the online copy
//! - restore: copy archive back to online
//!
//! Copies run on the blocking thread pool. Locations must be relative and
//! free of `..`, so no operation touches anything outside the two roots.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::{TierWorker, WorkerError, WorkerFuture};
use crate::coordinator::CoordinatorConfig;
use crate::dataset::DatasetRef;

/// [`TierWorker`] that moves datasets between two local directories.
#[derive(Debug, Clone)]
pub struct DirectoryTiers {
    online: PathBuf,
    archive: PathBuf,
}

impl DirectoryTiers {
    pub fn new(online: impl Into<PathBuf>, archive: impl Into<PathBuf>) -> Self {
        Self {
            online: online.into(),
            archive: archive.into(),
        }
    }

    pub fn online_dir(&self) -> &Path {
        &self.online
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive
    }

    /// Path of the dataset's online copy.
    pub fn online_path(&self, dataset: &DatasetRef) -> Result<PathBuf, WorkerError> {
        tier_path(&self.online, dataset)
    }

    /// Path of the dataset's archive copy.
    pub fn archive_path(&self, dataset: &DatasetRef) -> Result<PathBuf, WorkerError> {
        tier_path(&self.archive, dataset)
    }

    async fn blocking<F>(f: F) -> Result<(), WorkerError>
    where
        F: FnOnce() -> Result<(), WorkerError> + Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| WorkerError::Task(e.to_string()))?
    }
}

impl TierWorker for DirectoryTiers {
    fn name(&self) -> &str {
        "directory"
    }

    fn write<'a>(
        &'a self,
        dataset: &'a DatasetRef,
        _config: &'a CoordinatorConfig,
    ) -> WorkerFuture<'a> {
        let id = dataset.id();
        let paths = self
            .online_path(dataset)
            .and_then(|src| Ok((src, self.archive_path(dataset)?)));
        Box::pin(async move {
            let (src, dst) = paths?;
            debug!(dataset = %id, from = %src.display(), to = %dst.display(), "Writing back");
            Self::blocking(move || {
                if !src.exists() {
                    return Err(WorkerError::MissingSource { dataset: id, path: src });
                }
                replace_with_copy(&src, &dst)
            })
            .await
        })
    }

    fn archive<'a>(
        &'a self,
        dataset: &'a DatasetRef,
        _config: &'a CoordinatorConfig,
    ) -> WorkerFuture<'a> {
        let id = dataset.id();
        let paths = self
            .online_path(dataset)
            .and_then(|online| Ok((online, self.archive_path(dataset)?)));
        Box::pin(async move {
            let (online, archived) = paths?;
            debug!(dataset = %id, path = %online.display(), "Archiving");
            Self::blocking(move || {
                if !archived.exists() {
                    if !online.exists() {
                        return Err(WorkerError::MissingSource {
                            dataset: id,
                            path: online,
                        });
                    }
                    replace_with_copy(&online, &archived)?;
                }
                remove_path(&online)
            })
            .await
        })
    }

    fn restore<'a>(
        &'a self,
        dataset: &'a DatasetRef,
        _config: &'a CoordinatorConfig,
    ) -> WorkerFuture<'a> {
        let id = dataset.id();
        let paths = self
            .archive_path(dataset)
            .and_then(|src| Ok((src, self.online_path(dataset)?)));
        Box::pin(async move {
            let (src, dst) = paths?;
            debug!(dataset = %id, from = %src.display(), to = %dst.display(), "Restoring");
            Self::blocking(move || {
                if !src.exists() {
                    return Err(WorkerError::MissingSource { dataset: id, path: src });
                }
                replace_with_copy(&src, &dst)
            })
            .await
        })
    }
}

/// Joins the dataset location onto `root`, refusing locations that escape it.
fn tier_path(root: &Path, dataset: &DatasetRef) -> Result<PathBuf, WorkerError> {
    let location = dataset.location();
    let contained = location.components().next().is_some()
        && location
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !contained {
        return Err(WorkerError::InvalidLocation {
            dataset: dataset.id(),
            location: location.to_path_buf(),
        });
    }
    Ok(root.join(location))
}

/// Replaces `dst` with a copy of `src`.
fn replace_with_copy(src: &Path, dst: &Path) -> Result<(), WorkerError> {
    remove_path(dst)?;
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| WorkerError::io(parent, e))?;
    }
    copy_recursive(src, dst)
}

fn copy_recursive(src: &Path, dst: &Path) -> Result<(), WorkerError> {
    let meta = fs::metadata(src).map_err(|e| WorkerError::io(src, e))?;
    if !meta.is_dir() {
        fs::copy(src, dst).map_err(|e| WorkerError::io(dst, e))?;
        return Ok(());
    }

    fs::create_dir_all(dst).map_err(|e| WorkerError::io(dst, e))?;
    for entry in fs::read_dir(src).map_err(|e| WorkerError::io(src, e))? {
        let entry = entry.map_err(|e| WorkerError::io(src, e))?;
        copy_recursive(&entry.path(), &dst.join(entry.file_name()))?;
    }
    Ok(())
}

/// Removes a file or directory tree; a missing path is not an error.
fn remove_path(path: &Path) -> Result<(), WorkerError> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => Err(e),
    };
    result.map_err(|e| WorkerError::io(path, e))
}
