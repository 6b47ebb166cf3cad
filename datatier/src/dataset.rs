//! Dataset identity.
//!
//! A [`DatasetRef`] names one dataset and carries enough descriptive data to
//! find it on both storage tiers. Two refs are the same dataset when their
//! [`DatasetId`]s match; the descriptive fields never take part in equality
//! or hashing, so a ref can be used as a map key regardless of where it came
//! from.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Numeric identifier of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(u64);

impl DatasetId {
    /// Creates an identifier from its raw value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DatasetId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for DatasetId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Reference to one dataset on both storage tiers.
///
/// Immutable once constructed.
#[derive(Debug, Clone)]
pub struct DatasetRef {
    id: DatasetId,
    name: String,
    location: PathBuf,
}

impl DatasetRef {
    /// Creates a reference with an explicit name and tier-relative location.
    pub fn new(id: impl Into<DatasetId>, name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: location.into(),
        }
    }

    /// Creates a reference whose name and location are derived from the id.
    ///
    /// The location is the id itself, so the dataset lives at `<tier>/<id>`.
    pub fn from_id(id: impl Into<DatasetId>) -> Self {
        let id = id.into();
        Self {
            id,
            name: format!("ds-{}", id),
            location: PathBuf::from(id.to_string()),
        }
    }

    /// Returns the dataset identifier.
    pub fn id(&self) -> DatasetId {
        self.id
    }

    /// Returns the human-readable dataset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the location of the dataset relative to a tier root.
    pub fn location(&self) -> &Path {
        &self.location
    }
}

impl PartialEq for DatasetRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DatasetRef {}

impl Hash for DatasetRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dataset {} ({}) at {}",
            self.id,
            self.name,
            self.location.display()
        )
    }
}
