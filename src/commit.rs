//! Commits
//!
//! A commit bundles the checkpoints recorded since the previous commit and
//! links to that commit by hash. The parent is never held in memory; it is
//! looked up in the commit store when needed, so chains of any length can be
//! walked without loading them.

use crate::checkpoint::Checkpoint;
use crate::codec;
use crate::error::HistoryError;
use crate::hash::ContentHash;
use crate::path;
use crate::store::CommitStore;
use crate::types::{Identity, Timestamp};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    message: String,
    author: Identity,
    mod_time: Timestamp,
    changes: BTreeMap<String, Checkpoint>,
    parent: Option<ContentHash>,
    hash: Option<ContentHash>,
}

impl Commit {
    /// Start an unsealed commit with no changes.
    pub fn new_empty(author: Identity) -> Self {
        Self::new_at(author, Timestamp::now())
    }

    pub fn new_at(author: Identity, mod_time: Timestamp) -> Self {
        Commit {
            message: String::new(),
            author,
            mod_time,
            changes: BTreeMap::new(),
            parent: None,
            hash: None,
        }
    }

    pub(crate) fn from_parts(
        message: String,
        author: Identity,
        mod_time: Timestamp,
        changes: BTreeMap<String, Checkpoint>,
        parent: Option<ContentHash>,
        hash: Option<ContentHash>,
    ) -> Self {
        Commit {
            message,
            author,
            mod_time,
            changes,
            parent,
            hash,
        }
    }

    /// Set the message. A sealed commit loses its hash and must be resealed.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self.hash = None;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn author(&self) -> &Identity {
        &self.author
    }

    pub fn mod_time(&self) -> Timestamp {
        self.mod_time
    }

    pub fn changes(&self) -> &BTreeMap<String, Checkpoint> {
        &self.changes
    }

    pub fn parent(&self) -> Option<&ContentHash> {
        self.parent.as_ref()
    }

    pub fn hash(&self) -> Option<&ContentHash> {
        self.hash.as_ref()
    }

    pub fn is_sealed(&self) -> bool {
        self.hash.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        match path::normalize(path) {
            Ok(path) => self.changes.contains_key(&path),
            Err(_) => false,
        }
    }

    /// Add the checkpoint of `path` to this commit. The path is normalized
    /// first, so two spellings of one path count as the same change.
    pub fn record(&mut self, path: &str, checkpoint: Checkpoint) -> Result<(), HistoryError> {
        if let Some(hash) = &self.hash {
            return Err(HistoryError::CommitSealed { hash: hash.clone() });
        }
        let path = path::normalize(path)?;
        if self.changes.contains_key(&path) {
            return Err(HistoryError::DuplicateChangeInCommit { path });
        }
        self.changes.insert(path, checkpoint);
        Ok(())
    }

    /// Link to `parent` and compute the content hash.
    ///
    /// Same content and parent always give the same hash.
    pub fn seal(mut self, parent: Option<ContentHash>) -> Result<Commit, HistoryError> {
        self.parent = parent;
        self.hash = Some(self.compute_hash()?);
        Ok(self)
    }

    pub fn compute_hash(&self) -> Result<ContentHash, HistoryError> {
        let body = codec::encode_commit_body(self)?;
        Ok(ContentHash::of(&body))
    }

    /// Check that the recorded hash matches the content. Unsealed commits pass.
    pub fn verify(&self) -> Result<(), HistoryError> {
        let Some(expected) = &self.hash else {
            return Ok(());
        };
        let actual = self.compute_hash()?;
        if *expected != actual {
            return Err(HistoryError::HashMismatch {
                expected: expected.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Look up the parent commit.
    ///
    /// `Ok(None)` for the first commit of a chain; `ParentNotFound` if the
    /// parent has not been stored (yet).
    pub fn resolve_parent(&self, store: &CommitStore) -> Result<Option<Commit>, HistoryError> {
        let Some(parent) = &self.parent else {
            return Ok(None);
        };
        match store.get(parent)? {
            Some(commit) => Ok(Some(commit)),
            None => Err(HistoryError::ParentNotFound {
                parent: parent.clone(),
            }),
        }
    }
}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hash = self
            .hash
            .as_ref()
            .map(|h| h.short_string())
            .unwrap_or_else(|| "unsealed".to_string());
        write!(
            f,
            "{} {} by {} ({} changes): {}",
            hash,
            self.mod_time,
            self.author,
            self.changes.len(),
            self.message
        )
    }
}

/// Walks a commit chain from a starting hash towards the root.
///
/// Yields `ParentNotFound` once and stops if a link is missing.
pub struct CommitLog {
    store: CommitStore,
    next: Option<ContentHash>,
}

impl CommitLog {
    pub fn new(store: CommitStore, start: Option<ContentHash>) -> Self {
        Self { store, next: start }
    }
}

impl Iterator for CommitLog {
    type Item = Result<Commit, HistoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.next.take()?;
        match self.store.get(&hash) {
            Ok(Some(commit)) => {
                self.next = commit.parent().cloned();
                Some(Ok(commit))
            }
            Ok(None) => Some(Err(HistoryError::ParentNotFound { parent: hash })),
            Err(e) => Some(Err(e)),
        }
    }
}
