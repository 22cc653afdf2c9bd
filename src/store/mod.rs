//! Persistence
//!
//! Maps histories and commits onto sled trees. One sled database backs one
//! store; the checkpoint tree holds every path's history and the commit tree
//! holds sealed commits by hash.

pub mod commits;
pub mod keys;

pub use commits::{CommitStore, Commits};

use crate::error::StorageError;
use crate::history::HistoryLog;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::PathBuf;
use tracing::debug;

const TREE_CHECKPOINTS: &str = "checkpoints";
const TREE_COMMITS: &str = "commits";
const TREE_REFS: &str = "refs";

/// Backend kind as named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Disk,
    Memory,
}

/// Where a store keeps its data. Chosen once when the store is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// sled database in a directory.
    Disk {
        path: PathBuf,
        flush_every_ms: Option<u64>,
    },
    /// Temporary sled database, removed when the last handle drops.
    Memory,
}

impl StorageBackend {
    pub fn disk(path: impl Into<PathBuf>) -> Self {
        StorageBackend::Disk {
            path: path.into(),
            flush_every_ms: Some(500),
        }
    }

    fn open(&self) -> Result<Db, StorageError> {
        let db = match self {
            StorageBackend::Disk {
                path,
                flush_every_ms,
            } => sled::Config::new()
                .path(path)
                .flush_every_ms(*flush_every_ms)
                .open()?,
            StorageBackend::Memory => sled::Config::new().temporary(true).open()?,
        };
        Ok(db)
    }
}

/// Handle onto one history store.
#[derive(Clone)]
pub struct Store {
    db: Db,
    history: HistoryLog,
    commits: CommitStore,
}

impl Store {
    pub fn open(backend: &StorageBackend) -> Result<Self, StorageError> {
        let db = backend.open()?;
        let checkpoints = db.open_tree(TREE_CHECKPOINTS)?;
        let commits = db.open_tree(TREE_COMMITS)?;
        let refs = db.open_tree(TREE_REFS)?;
        debug!(backend = ?backend, "Opened history store");
        Ok(Self {
            db,
            history: HistoryLog::new(checkpoints, refs.clone()),
            commits: CommitStore::new(commits, refs),
        })
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn commits(&self) -> &CommitStore {
        &self.commits
    }

    #[cfg(test)]
    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}
