//! Filechain: Versioned File History
//!
//! Records every change to a file as a checkpoint in that path's history and
//! bundles checkpoints into content-addressed commits that link to their
//! parent by hash.

pub mod checkpoint;
pub mod codec;
pub mod commit;
pub mod config;
pub mod engine;
pub mod error;
pub mod hash;
pub mod history;
pub mod logging;
pub mod path;
pub mod repo;
pub mod store;
pub mod types;

pub use checkpoint::{ChangeType, Checkpoint, CheckpointOutcome, FileState};
pub use commit::{Commit, CommitLog};
pub use engine::Engine;
pub use error::{HistoryError, StorageError};
pub use hash::ContentHash;
pub use history::History;
pub use repo::Repository;
pub use store::StorageBackend;
pub use types::{Identity, Timestamp};
