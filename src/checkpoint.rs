//! Checkpoints and change classification
//!
//! A checkpoint records one observed state of one path. The classifier decides,
//! from the metadata before and after a mutation, which kind of change took
//! place. It performs no I/O; persisting the result is the engine's job.

use crate::error::HistoryError;
use crate::hash::ContentHash;
use crate::types::{Identity, Timestamp};
use std::fmt;
use std::str::FromStr;

/// Kind of modification a checkpoint records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Add,
    Modify,
    Move,
    Remove,
}

impl ChangeType {
    /// Token used in the wire format.
    pub fn as_token(&self) -> &'static str {
        match self {
            ChangeType::Add => "added",
            ChangeType::Modify => "modified",
            ChangeType::Move => "moved",
            ChangeType::Remove => "removed",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

impl FromStr for ChangeType {
    type Err = HistoryError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "added" => Ok(ChangeType::Add),
            "modified" => Ok(ChangeType::Modify),
            "moved" => Ok(ChangeType::Move),
            "removed" => Ok(ChangeType::Remove),
            other => Err(HistoryError::UnknownChangeType(other.to_string())),
        }
    }
}

/// Metadata of a file at one point in time, as reported by the filesystem layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileState {
    pub hash: ContentHash,
    pub size: u64,
}

impl FileState {
    pub fn new(hash: ContentHash, size: u64) -> Self {
        Self { hash, size }
    }
}

/// One recorded state of a single path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    hash: ContentHash,
    mod_time: Timestamp,
    size: u64,
    change: ChangeType,
    author: Identity,
}

impl Checkpoint {
    pub fn new(
        hash: ContentHash,
        mod_time: Timestamp,
        size: u64,
        change: ChangeType,
        author: Identity,
    ) -> Self {
        Self {
            hash,
            mod_time,
            size,
            change,
            author,
        }
    }

    /// Content hash at this point. For removals, the last existing content.
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn mod_time(&self) -> Timestamp {
        self.mod_time
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn change(&self) -> ChangeType {
        self.change
    }

    pub fn author(&self) -> &Identity {
        &self.author
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<8} {}@{} ({} bytes, by {})",
            self.change,
            self.hash.short_string(),
            self.mod_time,
            self.size,
            self.author
        )
    }
}

/// Result of comparing two file states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Nothing changed; callers skip.
    NoChange,
    Changed {
        change: ChangeType,
        /// Path the checkpoint belongs to.
        path: String,
        hash: ContentHash,
        size: u64,
    },
}

/// Classify the transition from `old` to `new`.
///
/// First match wins: add, remove, modify (hash differs), move (path differs),
/// otherwise no change. Passing neither state is a caller bug.
pub fn classify(
    old: Option<&FileState>,
    new: Option<&FileState>,
    old_path: &str,
    new_path: &str,
) -> Result<Classification, HistoryError> {
    let (change, path, state) = match (old, new) {
        (None, None) => {
            return Err(HistoryError::InvalidArguments(format!(
                "neither old nor new state given for {} -> {}",
                old_path, new_path
            )))
        }
        (None, Some(new)) => (ChangeType::Add, new_path, new),
        (Some(old), None) => (ChangeType::Remove, old_path, old),
        (Some(old), Some(new)) if old.hash != new.hash => (ChangeType::Modify, new_path, new),
        (Some(_), Some(new)) if old_path != new_path => (ChangeType::Move, new_path, new),
        (Some(_), Some(_)) => return Ok(Classification::NoChange),
    };

    Ok(Classification::Changed {
        change,
        path: path.to_string(),
        hash: state.hash.clone(),
        size: state.size,
    })
}

/// Outcome of checkpointing a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointOutcome {
    Created {
        path: String,
        /// Set for moves: the path whose history was carried over.
        moved_from: Option<String>,
        checkpoint: Checkpoint,
    },
    NoChange,
}

impl CheckpointOutcome {
    pub fn checkpoint(&self) -> Option<&Checkpoint> {
        match self {
            CheckpointOutcome::Created { checkpoint, .. } => Some(checkpoint),
            CheckpointOutcome::NoChange => None,
        }
    }

    pub fn is_no_change(&self) -> bool {
        matches!(self, CheckpointOutcome::NoChange)
    }
}
