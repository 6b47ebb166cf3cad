//! Coordinator configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::marker::MARKER_DIR_NAME;

/// Default debounce delay before a requested write-back runs (seconds).
pub const DEFAULT_WRITE_DELAY_SECS: u64 = 60;

/// Largest accepted write delay (seconds), one year.
pub const MAX_WRITE_DELAY_SECS: u64 = 365 * 24 * 60 * 60;

/// Default interval between queue sweeps (seconds).
pub const DEFAULT_PROCESS_QUEUE_INTERVAL_SECS: u64 = 5;

/// Runtime settings for the coordinator and the workers it starts.
///
/// Read once at startup; there is no runtime reconfiguration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Quiet period a dataset needs before its write-back is dispatched.
    pub write_delay: Duration,
    /// Pause between the end of one sweep pass and the start of the next.
    pub process_queue_interval: Duration,
    /// Cache directory; dirty markers live in `<cache_dir>/marker`.
    pub cache_dir: PathBuf,
}

impl CoordinatorConfig {
    /// Creates a configuration with default timings.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            write_delay: Duration::from_secs(DEFAULT_WRITE_DELAY_SECS),
            process_queue_interval: Duration::from_secs(DEFAULT_PROCESS_QUEUE_INTERVAL_SECS),
            cache_dir: cache_dir.into(),
        }
    }

    /// Sets the write-back debounce delay.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    /// Sets the sweep interval.
    pub fn with_process_queue_interval(mut self, interval: Duration) -> Self {
        self.process_queue_interval = interval;
        self
    }

    /// Returns the cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the dirty marker directory.
    pub fn marker_dir(&self) -> PathBuf {
        self.cache_dir.join(MARKER_DIR_NAME)
    }
}
