//! Per-path history
//!
//! Every path owns an append-only, time-ordered run of checkpoints in the
//! checkpoint tree. A rename moves the whole run to the new path so that the
//! new path's history still shows what happened before the rename.
//!
//! Write operations assume a single writer at a time; the engine serializes
//! them behind its write lock.

use crate::checkpoint::Checkpoint;
use crate::codec;
use crate::error::HistoryError;
use crate::path;
use crate::store::keys;
use crate::types::Timestamp;
use sled::transaction::{abort, ConflictableTransactionResult, TransactionResult, TransactionalTree};
use sled::{IVec, Transactional, Tree};
use tracing::debug;

/// Checkpoint logs of all paths in one store.
///
/// Reads are open to anyone; writes are crate-internal and only issued by
/// the engine while it holds its write lock.
#[derive(Clone)]
pub struct HistoryLog {
    tree: Tree,
    refs: Tree,
}

impl HistoryLog {
    pub(crate) fn new(tree: Tree, refs: Tree) -> Self {
        Self { tree, refs }
    }

    /// Append a checkpoint to `path`'s history.
    pub(crate) fn append(&self, path: &str, checkpoint: &Checkpoint) -> Result<(), HistoryError> {
        let path = path::normalize(path)?;
        let key = keys::checkpoint_key(&path, checkpoint.mod_time());
        let value = codec::encode_checkpoint(checkpoint)?;

        let result: TransactionResult<(), HistoryError> =
            (&self.tree, &self.refs).transaction(|(tx, refs)| {
                if tx.get(key.as_slice())?.is_some() {
                    return abort(HistoryError::DuplicateTimestamp {
                        path: path.clone(),
                        mod_time: checkpoint.mod_time(),
                    });
                }
                tx.insert(key.as_slice(), value.as_slice())?;
                raise_clock(refs, checkpoint.mod_time())
            });
        result?;
        Ok(())
    }

    /// Newest `mod_time` ever written to this log, moved or not.
    pub fn high_water(&self) -> Result<Option<Timestamp>, HistoryError> {
        Ok(self
            .refs
            .get(keys::CLOCK_REF)?
            .and_then(|raw| decode_clock(&raw)))
    }

    /// History of `path`, oldest first. `NoSuchPath` if it has none.
    pub fn list(&self, path: &str) -> Result<History, HistoryError> {
        let path = path::normalize(path)?;
        let prefix = keys::path_prefix(&path);
        match self.tree.scan_prefix(&prefix).next() {
            None => Err(HistoryError::NoSuchPath(path)),
            Some(Err(e)) => Err(e.into()),
            Some(Ok(_)) => Ok(History {
                tree: self.tree.clone(),
                path,
                prefix,
            }),
        }
    }

    pub fn contains(&self, path: &str) -> Result<bool, HistoryError> {
        let path = path::normalize(path)?;
        match self.tree.scan_prefix(keys::path_prefix(&path)).next() {
            None => Ok(false),
            Some(item) => item.map(|_| true).map_err(HistoryError::from),
        }
    }

    /// Move all of `old_path`'s checkpoints to `new_path`, atomically.
    ///
    /// Returns the number of checkpoints moved.
    pub(crate) fn relocate(&self, old_path: &str, new_path: &str) -> Result<usize, HistoryError> {
        let old_path = path::normalize(old_path)?;
        if !self.contains(&old_path)? {
            return Err(HistoryError::NoSuchPath(old_path));
        }
        self.move_entries(&old_path, new_path, None)
    }

    /// Relocate `old_path`'s history (if any) and append `checkpoint` at
    /// `new_path` in the same transaction.
    pub(crate) fn relocate_and_append(
        &self,
        old_path: &str,
        new_path: &str,
        checkpoint: &Checkpoint,
    ) -> Result<usize, HistoryError> {
        self.move_entries(old_path, new_path, Some(checkpoint))
    }

    fn move_entries(
        &self,
        old_path: &str,
        new_path: &str,
        append: Option<&Checkpoint>,
    ) -> Result<usize, HistoryError> {
        let old_path = path::normalize(old_path)?;
        let new_path = path::normalize(new_path)?;
        if old_path == new_path {
            return Err(HistoryError::InvalidArguments(format!(
                "cannot relocate {} onto itself",
                old_path
            )));
        }
        if self.contains(&new_path)? {
            return Err(HistoryError::DestinationExists { path: new_path });
        }

        let mut moves: Vec<(IVec, Vec<u8>, IVec)> = Vec::new();
        for item in self.tree.scan_prefix(keys::path_prefix(&old_path)) {
            let (old_key, value) = item?;
            let (_, mod_time) = keys::split_checkpoint_key(&old_key)?;
            moves.push((old_key.clone(), keys::checkpoint_key(&new_path, mod_time), value));
        }

        let appended = match append {
            Some(cp) => {
                let key = keys::checkpoint_key(&new_path, cp.mod_time());
                if moves.iter().any(|(_, new_key, _)| *new_key == key) {
                    return Err(HistoryError::DuplicateTimestamp {
                        path: new_path,
                        mod_time: cp.mod_time(),
                    });
                }
                Some((key, codec::encode_checkpoint(cp)?))
            }
            None => None,
        };

        let result: TransactionResult<(), HistoryError> =
            (&self.tree, &self.refs).transaction(|(tx, refs)| {
                for (old_key, new_key, value) in &moves {
                    tx.remove(old_key.clone())?;
                    tx.insert(new_key.as_slice(), value.clone())?;
                }
                if let Some((key, value)) = &appended {
                    tx.insert(key.as_slice(), value.as_slice())?;
                }
                if let Some(cp) = append {
                    raise_clock(refs, cp.mod_time())?;
                }
                Ok(())
            });
        result?;

        debug!(
            from = %old_path,
            to = %new_path,
            moved = moves.len(),
            "Relocated history"
        );
        Ok(moves.len())
    }

    /// Every path that has a history, in key order.
    pub fn paths(&self) -> Paths {
        Paths {
            inner: self.tree.iter(),
            last: None,
        }
    }
}

fn decode_clock(raw: &[u8]) -> Option<Timestamp> {
    let bytes: [u8; 8] = raw.try_into().ok()?;
    Some(Timestamp::from_be_bytes(bytes))
}

fn raise_clock(
    refs: &TransactionalTree,
    mod_time: Timestamp,
) -> ConflictableTransactionResult<(), HistoryError> {
    let current = refs.get(keys::CLOCK_REF)?.and_then(|raw| decode_clock(&raw));
    if current.map_or(true, |c| c < mod_time) {
        refs.insert(keys::CLOCK_REF, &mod_time.to_be_bytes()[..])?;
    }
    Ok(())
}

/// Handle onto one path's history.
///
/// Each call to [`History::iter`] starts a fresh scan, so a history can be
/// read any number of times; entries are decoded lazily.
#[derive(Clone)]
pub struct History {
    tree: Tree,
    path: String,
    prefix: Vec<u8>,
}

impl History {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn iter(&self) -> Checkpoints {
        Checkpoints {
            inner: self.tree.scan_prefix(&self.prefix),
            path: self.path.clone(),
        }
    }

    /// Most recent checkpoint.
    pub fn latest(&self) -> Result<Option<Checkpoint>, HistoryError> {
        let mut iter = self.iter();
        iter.next_back().transpose()
    }

    pub fn to_vec(&self) -> Result<Vec<Checkpoint>, HistoryError> {
        self.iter().collect()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = Result<Checkpoint, HistoryError>;
    type IntoIter = Checkpoints;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazily decoded checkpoints of one path, ascending by `mod_time`.
pub struct Checkpoints {
    inner: sled::Iter,
    path: String,
}

impl Checkpoints {
    fn decode(&self, item: sled::Result<(IVec, IVec)>) -> Result<Checkpoint, HistoryError> {
        let (key, value) = item?;
        let (_, key_time) = keys::split_checkpoint_key(&key)?;
        let checkpoint = codec::decode_checkpoint(&value).map_err(|e| match e {
            HistoryError::Decode { reason, .. } => HistoryError::decode(
                format!("checkpoint {}@{}", self.path, key_time),
                reason,
            ),
            other => other,
        })?;
        if checkpoint.mod_time() != key_time {
            return Err(HistoryError::decode(
                format!("checkpoint {}@{}", self.path, key_time),
                format!("record carries mod_time {}", checkpoint.mod_time()),
            ));
        }
        Ok(checkpoint)
    }
}

impl Iterator for Checkpoints {
    type Item = Result<Checkpoint, HistoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        Some(self.decode(item))
    }
}

impl DoubleEndedIterator for Checkpoints {
    fn next_back(&mut self) -> Option<Self::Item> {
        let item = self.inner.next_back()?;
        Some(self.decode(item))
    }
}

/// Distinct paths of the checkpoint tree.
pub struct Paths {
    inner: sled::Iter,
    last: Option<String>,
}

impl Iterator for Paths {
    type Item = Result<String, HistoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (key, _) = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };
            let path = match keys::split_checkpoint_key(&key) {
                Ok((path, _)) => path.to_string(),
                Err(e) => return Some(Err(e)),
            };
            if self.last.as_deref() == Some(path.as_str()) {
                continue;
            }
            self.last = Some(path.clone());
            return Some(Ok(path));
        }
    }
}
