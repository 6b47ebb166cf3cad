//! Requested operations, queued states and the merge table between them.
//!
//! Every dataset has at most one [`QueuedState`]. A new [`RequestedOp`] is
//! folded into the current state by [`transition`], which is a pure function:
//! it decides the next state and whether the write-back side effects (dirty
//! marker, debounce deadline) must be applied, but performs none of them.
//!
//! | current \ op              | Write                       | Archive                   | Restore          |
//! |---------------------------|-----------------------------|---------------------------|------------------|
//! | absent                    | WriteRequested (mark, arm)  | ArchiveRequested          | RestoreRequested |
//! | ArchiveRequested          | WriteThenArchive (mark, arm)| unchanged                 | RestoreRequested |
//! | RestoreRequested          | WriteRequested (mark, arm)  | ArchiveRequested          | unchanged        |
//! | WriteRequested            | unchanged (arm)             | WriteThenArchive          | unchanged        |
//! | WriteThenArchiveRequested | unchanged (arm)             | unchanged                 | WriteRequested   |

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Operation a caller asks for on a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestedOp {
    /// Copy current online data to the archive tier.
    Write,
    /// Remove the dataset from the online tier.
    Archive,
    /// Bring the dataset back from the archive tier.
    Restore,
}

impl RequestedOp {
    /// All operations, in table order.
    pub const ALL: [RequestedOp; 3] = [Self::Write, Self::Archive, Self::Restore];

    /// Returns a lowercase name for display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Archive => "archive",
            Self::Restore => "restore",
        }
    }
}

impl fmt::Display for RequestedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestedOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "write" => Ok(Self::Write),
            "archive" => Ok(Self::Archive),
            "restore" => Ok(Self::Restore),
            other => Err(format!(
                "unknown operation '{}': must be one of write, archive, restore",
                other
            )),
        }
    }
}

/// The single next action the sweeper will take for a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueuedState {
    WriteRequested,
    ArchiveRequested,
    RestoreRequested,
    WriteThenArchiveRequested,
}

impl QueuedState {
    /// Returns true if dispatching this state writes the dataset back first,
    /// which is exactly when a debounce deadline must exist.
    pub fn involves_write(&self) -> bool {
        matches!(self, Self::WriteRequested | Self::WriteThenArchiveRequested)
    }

    /// Returns the name used in status documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WriteRequested => "WRITE_REQUESTED",
            Self::ArchiveRequested => "ARCHIVE_REQUESTED",
            Self::RestoreRequested => "RESTORE_REQUESTED",
            Self::WriteThenArchiveRequested => "WRITE_THEN_ARCHIVE_REQUESTED",
        }
    }
}

impl fmt::Display for QueuedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side effect attached to a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteEffect {
    /// Nothing beyond the state change.
    None,
    /// Push the debounce deadline forward.
    Rearm,
    /// Ensure the dirty marker exists, then arm the debounce deadline.
    MarkAndArm,
}

/// Outcome of merging one request into a dataset's queued state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State after the merge.
    pub next: Option<QueuedState>,
    /// Write-back side effect to apply with the new state.
    pub effect: WriteEffect,
}

impl Transition {
    fn to(next: QueuedState, effect: WriteEffect) -> Self {
        Self {
            next: Some(next),
            effect,
        }
    }

    fn unchanged(current: Option<QueuedState>) -> Self {
        Self {
            next: current,
            effect: WriteEffect::None,
        }
    }

    /// Returns true if applying this transition leaves everything as it was.
    pub fn is_noop(&self, current: Option<QueuedState>) -> bool {
        self.next == current && self.effect == WriteEffect::None
    }
}

/// Merges `op` into `current`.
pub fn transition(current: Option<QueuedState>, op: RequestedOp) -> Transition {
    use QueuedState::*;
    use RequestedOp::*;

    match (current, op) {
        (None, Write) => Transition::to(WriteRequested, WriteEffect::MarkAndArm),
        (None, Archive) => Transition::to(ArchiveRequested, WriteEffect::None),
        (None, Restore) => Transition::to(RestoreRequested, WriteEffect::None),

        (Some(ArchiveRequested), Write) => {
            Transition::to(WriteThenArchiveRequested, WriteEffect::MarkAndArm)
        }
        (Some(ArchiveRequested), Restore) => Transition::to(RestoreRequested, WriteEffect::None),

        (Some(RestoreRequested), Write) => Transition::to(WriteRequested, WriteEffect::MarkAndArm),
        (Some(RestoreRequested), Archive) => Transition::to(ArchiveRequested, WriteEffect::None),

        (Some(WriteRequested), Write) => Transition::to(WriteRequested, WriteEffect::Rearm),
        (Some(WriteRequested), Archive) => {
            Transition::to(WriteThenArchiveRequested, WriteEffect::None)
        }

        (Some(WriteThenArchiveRequested), Write) => {
            Transition::to(WriteThenArchiveRequested, WriteEffect::Rearm)
        }
        // The write still happens; only the archive intent is cancelled.
        (Some(WriteThenArchiveRequested), Restore) => {
            Transition::to(WriteRequested, WriteEffect::None)
        }

        (Some(ArchiveRequested), Archive)
        | (Some(RestoreRequested), Restore)
        | (Some(WriteRequested), Restore)
        | (Some(WriteThenArchiveRequested), Archive) => Transition::unchanged(current),
    }
}

/// Folds a sequence of requests into a final state, starting from absent.
pub fn fold_requests<I>(ops: I) -> Option<QueuedState>
where
    I: IntoIterator<Item = RequestedOp>,
{
    ops.into_iter()
        .fold(None, |state, op| transition(state, op).next)
}
