//! Commit tree and refs.

use crate::codec;
use crate::commit::Commit;
use crate::error::HistoryError;
use crate::hash::ContentHash;
use crate::store::keys::HEAD_REF;
use sled::transaction::{abort, TransactionResult};
use sled::{Transactional, Tree};

/// Commits keyed by their hash, plus the HEAD ref.
#[derive(Clone)]
pub struct CommitStore {
    commits: Tree,
    refs: Tree,
}

impl CommitStore {
    pub(crate) fn new(commits: Tree, refs: Tree) -> Self {
        Self { commits, refs }
    }

    /// Fetch a commit by hash.
    ///
    /// `Ok(None)` means absent. A stored value that does not decode, or whose
    /// content does not hash to its key, is an error.
    pub fn get(&self, hash: &ContentHash) -> Result<Option<Commit>, HistoryError> {
        let Some(raw) = self.commits.get(hash.as_bytes())? else {
            return Ok(None);
        };
        let commit = codec::decode_commit(&raw)?;
        match commit.hash() {
            Some(stored) if stored == hash => Ok(Some(commit)),
            Some(stored) => Err(HistoryError::HashMismatch {
                expected: hash.clone(),
                actual: stored.clone(),
            }),
            None => Err(HistoryError::decode(
                format!("commit {}", hash),
                "stored commit is not sealed",
            )),
        }
    }

    pub fn contains(&self, hash: &ContentHash) -> Result<bool, HistoryError> {
        Ok(self.commits.contains_key(hash.as_bytes())?)
    }

    pub fn head(&self) -> Result<Option<ContentHash>, HistoryError> {
        self.refs
            .get(HEAD_REF)?
            .map(|raw| ContentHash::from_bytes(&raw))
            .transpose()
    }

    /// Store a sealed commit without touching HEAD.
    ///
    /// Returns `false` if a commit with that hash was already present.
    pub fn put(&self, commit: &Commit) -> Result<bool, HistoryError> {
        let hash = sealed_hash(commit)?;
        commit.verify()?;
        let value = codec::encode_commit(commit)?;
        let previous = self
            .commits
            .compare_and_swap(hash.as_bytes(), None as Option<&[u8]>, Some(value))?;
        Ok(previous.is_ok())
    }

    /// Store a sealed commit and move HEAD to it in one transaction.
    ///
    /// Aborts without effect if HEAD no longer points at the commit's parent.
    pub fn append(&self, commit: &Commit) -> Result<(), HistoryError> {
        let hash = sealed_hash(commit)?;
        commit.verify()?;
        let value = codec::encode_commit(commit)?;
        let key = hash.to_bytes();
        let expected_parent = commit.parent().map(|p| p.to_bytes());

        let result: TransactionResult<(), HistoryError> =
            (&self.commits, &self.refs).transaction(|(commits, refs)| {
                let head = refs.get(HEAD_REF)?;
                if head.as_deref() != expected_parent.as_deref() {
                    return abort(HistoryError::InvalidArguments(format!(
                        "commit {} does not extend the current head",
                        hash
                    )));
                }
                commits.insert(key.as_slice(), value.as_slice())?;
                refs.insert(HEAD_REF, key.as_slice())?;
                Ok(())
            });
        result?;
        Ok(())
    }

    /// Every stored commit, in hash order.
    pub fn iter(&self) -> Commits {
        Commits {
            inner: self.commits.iter(),
        }
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

fn sealed_hash(commit: &Commit) -> Result<ContentHash, HistoryError> {
    commit.hash().cloned().ok_or_else(|| {
        HistoryError::InvalidArguments("only sealed commits can be stored".to_string())
    })
}

/// Iterator over all stored commits.
pub struct Commits {
    inner: sled::Iter,
}

impl Iterator for Commits {
    type Item = Result<Commit, HistoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.inner.next()?;
        Some(
            item.map_err(HistoryError::from)
                .and_then(|(_, value)| codec::decode_commit(&value)),
        )
    }
}
