//! Debounce deadlines for pending write-backs.
//!
//! Each write request pushes the dataset's deadline to `now + delay`, so a
//! burst of writes collapses into one write-back that runs once the dataset
//! has been quiet for a full delay interval.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::config::MAX_WRITE_DELAY_SECS;
use crate::dataset::DatasetId;

/// Tracks the earliest dispatch time of each pending write-back.
#[derive(Debug)]
pub struct DelayScheduler {
    delay: Duration,
    deadlines: HashMap<DatasetId, Instant>,
}

impl DelayScheduler {
    /// Creates a scheduler with the configured write delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadlines: HashMap::new(),
        }
    }

    /// Returns the configured write delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sets the deadline for `dataset` to `now + delay`, replacing any
    /// earlier deadline, and returns it.
    ///
    /// A delay too large for `Instant` is capped at [`MAX_WRITE_DELAY_SECS`].
    pub fn arm(&mut self, dataset: DatasetId, now: Instant) -> Instant {
        let deadline = now
            .checked_add(self.delay)
            .or_else(|| now.checked_add(Duration::from_secs(MAX_WRITE_DELAY_SECS)))
            .unwrap_or(now);
        self.deadlines.insert(dataset, deadline);
        deadline
    }

    /// Returns true once `now` is strictly past the deadline.
    ///
    /// A dataset without a deadline is never elapsed.
    pub fn is_elapsed(&self, dataset: DatasetId, now: Instant) -> bool {
        self.deadlines
            .get(&dataset)
            .map(|deadline| now > *deadline)
            .unwrap_or(false)
    }

    /// Removes the deadline for `dataset`.
    pub fn clear(&mut self, dataset: DatasetId) -> Option<Instant> {
        self.deadlines.remove(&dataset)
    }

    /// Returns the current deadline for `dataset`, if armed.
    pub fn deadline(&self, dataset: DatasetId) -> Option<Instant> {
        self.deadlines.get(&dataset).copied()
    }
}
