//! Point-in-time status of the coordinator.
//!
//! [`ServiceStatus`] is captured under the coordination lock, so every
//! dataset shows up exactly once: either with its queued request or as
//! `CHANGING` while a worker owns it. Serialized with serde into the status
//! document served to operators:
//!
//! ```json
//! {
//!   "opsQueue": [{"dsInfo": "Dataset 1 (ds-1) at 1", "request": "WRITE_REQUESTED"}],
//!   "lockCount": 1,
//!   "lockedDs": [4]
//! }
//! ```

use std::fmt;

use serde::{Serialize, Serializer};

use super::state::QueuedState;
use crate::dataset::{DatasetId, DatasetRef};

/// Label of a dataset in the status queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    /// Waiting for the sweeper.
    Queued(QueuedState),
    /// A worker currently owns the dataset.
    Changing,
}

impl RequestStatus {
    /// Returns the label written to the status document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued(state) => state.as_str(),
            Self::Changing => "CHANGING",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RequestStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

fn serialize_display<T: fmt::Display, S: Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// One dataset in the status queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEntry {
    #[serde(rename = "dsInfo", serialize_with = "serialize_display")]
    pub dataset: DatasetRef,
    pub request: RequestStatus,
}

/// Snapshot of queue, active set and locks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    /// Queued datasets first, then datasets in progress.
    pub ops_queue: Vec<QueueEntry>,
    /// Number of held locks.
    pub lock_count: usize,
    /// Every dataset covered by at least one lock.
    #[serde(rename = "lockedDs")]
    pub locked_datasets: Vec<DatasetId>,
}

impl ServiceStatus {
    /// Returns the status entry for `dataset`, if it is queued or changing.
    pub fn entry(&self, dataset: DatasetId) -> Option<&QueueEntry> {
        self.ops_queue.iter().find(|e| e.dataset.id() == dataset)
    }

    /// Returns the queued state of `dataset`, if it is waiting.
    pub fn queued_state(&self, dataset: DatasetId) -> Option<QueuedState> {
        match self.entry(dataset)?.request {
            RequestStatus::Queued(state) => Some(state),
            RequestStatus::Changing => None,
        }
    }

    /// Returns true if a worker owns `dataset`.
    pub fn is_changing(&self, dataset: DatasetId) -> bool {
        self.entry(dataset)
            .map(|e| e.request == RequestStatus::Changing)
            .unwrap_or(false)
    }

    /// Serializes the snapshot as a compact JSON document.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the snapshot as indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
