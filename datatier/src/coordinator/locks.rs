//! Read locks protecting datasets from archival.
//!
//! A lock is a claim by one reader that a set of datasets must stay online
//! while it reads them. The registry is a presence check for the sweeper,
//! not a mutual-exclusion primitive between readers: any number of locks may
//! cover the same dataset.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::dataset::DatasetId;

/// Opaque identifier returned when a lock is acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockId(Uuid);

impl LockId {
    /// Generates a fresh random lock id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LockId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Held locks, keyed by id.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: HashMap<LockId, HashSet<DatasetId>>,
}

impl LockRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a lock over `datasets` and returns its id.
    pub fn acquire(&mut self, datasets: HashSet<DatasetId>) -> LockId {
        let mut id = LockId::generate();
        while self.locks.contains_key(&id) {
            id = LockId::generate();
        }
        self.locks.insert(id, datasets);
        id
    }

    /// Drops a lock. Unknown ids are ignored.
    ///
    /// Returns true if the lock was held.
    pub fn release(&mut self, id: &LockId) -> bool {
        self.locks.remove(id).is_some()
    }

    /// Returns true if any held lock covers `dataset`.
    ///
    /// Linear in the number of held locks, which stays small.
    pub fn is_locked(&self, dataset: DatasetId) -> bool {
        self.locks.values().any(|set| set.contains(&dataset))
    }

    /// Number of held locks.
    pub fn count(&self) -> usize {
        self.locks.len()
    }

    /// De-duplicated union of every locked dataset, in ascending order.
    pub fn locked_datasets(&self) -> Vec<DatasetId> {
        let mut ids: Vec<DatasetId> = self
            .locks
            .values()
            .flatten()
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        ids.sort_unstable();
        ids
    }
}
