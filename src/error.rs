//! Error types for the history engine.

use crate::hash::ContentHash;
use crate::types::Timestamp;
use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(#[from] sled::Error),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors surfaced by checkpointing, history and commit operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Path {path} already has a change in this commit")]
    DuplicateChangeInCommit { path: String },

    #[error("Path {path} already has a checkpoint at {mod_time}")]
    DuplicateTimestamp { path: String, mod_time: Timestamp },

    #[error("Commit {hash} is sealed and cannot record further changes")]
    CommitSealed { hash: ContentHash },

    #[error("No history for path: {0}")]
    NoSuchPath(String),

    #[error("Parent commit {parent} not found")]
    ParentNotFound { parent: ContentHash },

    #[error("Cannot move history to {path}: destination already has history")]
    DestinationExists { path: String },

    #[error("Nothing to commit")]
    NothingToCommit,

    #[error("Malformed hash: {0}")]
    MalformedHash(String),

    #[error("Unknown change type: {0:?}")]
    UnknownChangeType(String),

    #[error("Failed to encode {what}: {reason}")]
    Encode { what: String, reason: String },

    #[error("Failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        expected: ContentHash,
        actual: ContentHash,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl HistoryError {
    /// Missing data that may show up later, e.g. after fetching from a peer.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HistoryError::NoSuchPath(_)
                | HistoryError::ParentNotFound { .. }
                | HistoryError::DestinationExists { .. }
                | HistoryError::NothingToCommit
        )
    }

    /// The record exists but cannot be read back.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            HistoryError::MalformedHash(_)
                | HistoryError::UnknownChangeType(_)
                | HistoryError::Decode { .. }
                | HistoryError::HashMismatch { .. }
        )
    }

    pub(crate) fn encode(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        HistoryError::Encode {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        HistoryError::Decode {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<sled::Error> for HistoryError {
    fn from(err: sled::Error) -> Self {
        HistoryError::Storage(StorageError::Backend(err))
    }
}

impl From<config::ConfigError> for HistoryError {
    fn from(err: config::ConfigError) -> Self {
        HistoryError::ConfigError(err.to_string())
    }
}

impl From<sled::transaction::TransactionError<HistoryError>> for HistoryError {
    fn from(err: sled::transaction::TransactionError<HistoryError>) -> Self {
        match err {
            sled::transaction::TransactionError::Abort(inner) => inner,
            sled::transaction::TransactionError::Storage(e) => e.into(),
        }
    }
}
