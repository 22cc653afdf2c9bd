//! History engine
//!
//! Ties classification, persistence and the in-progress commit together for
//! one store. All writes go through a single lock, so a checkpoint's history
//! append, a rename's relocation and the staging of the checkpoint into the
//! next commit happen as one step or not at all.

use crate::checkpoint::{
    self, ChangeType, Checkpoint, CheckpointOutcome, Classification, FileState,
};
use crate::commit::{Commit, CommitLog};
use crate::error::HistoryError;
use crate::hash::ContentHash;
use crate::history::{History, Paths};
use crate::path;
use crate::store::{CommitStore, Commits, StorageBackend, Store};
use crate::types::{Identity, MonotonicClock, Timestamp};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

struct WriteState {
    clock: MonotonicClock,
    staged: Commit,
}

/// Versioned history of one owner's files.
pub struct Engine {
    store: Store,
    owner: Identity,
    write: Mutex<WriteState>,
}

impl Engine {
    pub fn open(backend: &StorageBackend, owner: Identity) -> Result<Self, HistoryError> {
        let store = Store::open(backend)?;
        Self::with_store(store, owner)
    }

    fn with_store(store: Store, owner: Identity) -> Result<Self, HistoryError> {
        let mut clock = MonotonicClock::starting_after(clock_floor(&store)?);
        let staged = Commit::new_at(owner.clone(), clock.tick());

        Ok(Self {
            store,
            owner,
            write: Mutex::new(WriteState { clock, staged }),
        })
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Record the transition of one file from `old` to `new`.
    ///
    /// Classifies the change, appends the checkpoint to the path's history
    /// (carrying the old path's history along on a move) and stages it for
    /// the next commit. Identical states yield [`CheckpointOutcome::NoChange`]
    /// and touch nothing.
    pub fn make_checkpoint(
        &self,
        old: Option<&FileState>,
        new: Option<&FileState>,
        old_path: &str,
        new_path: &str,
        author: &Identity,
    ) -> Result<CheckpointOutcome, HistoryError> {
        let old_path = path::normalize(old_path)?;
        let new_path = path::normalize(new_path)?;

        let classification = checkpoint::classify(old, new, &old_path, &new_path)?;
        let (change, path, hash, size) = match classification {
            Classification::NoChange => {
                debug!(path = %new_path, "No change, skipping checkpoint");
                return Ok(CheckpointOutcome::NoChange);
            }
            Classification::Changed {
                change,
                path,
                hash,
                size,
            } => (change, path, hash, size),
        };

        let mut state = self.write.lock();
        if state.staged.contains(&path) {
            return Err(HistoryError::DuplicateChangeInCommit { path });
        }

        let mod_time = state.clock.tick();
        let checkpoint = Checkpoint::new(hash, mod_time, size, change, author.clone());

        let moved_from = if change == ChangeType::Move {
            let moved = self
                .store
                .history()
                .relocate_and_append(&old_path, &path, &checkpoint)?;
            debug!(from = %old_path, to = %path, moved, "Carried history across rename");
            Some(old_path)
        } else {
            self.store.history().append(&path, &checkpoint)?;
            None
        };

        state.staged.record(&path, checkpoint.clone())?;
        debug!(path = %path, checkpoint = %checkpoint, "Created checkpoint");

        Ok(CheckpointOutcome::Created {
            path,
            moved_from,
            checkpoint,
        })
    }

    /// History of `path`, oldest first.
    pub fn history(&self, path: &str) -> Result<History, HistoryError> {
        self.store.history().list(path)
    }

    /// Every path with a history.
    pub fn paths(&self) -> Paths {
        self.store.history().paths()
    }

    /// Move `old_path`'s whole history to `new_path` without recording a
    /// checkpoint. Fails with `DestinationExists` rather than merging.
    pub fn relocate(&self, old_path: &str, new_path: &str) -> Result<usize, HistoryError> {
        let _guard = self.write.lock();
        self.store.history().relocate(old_path, new_path)
    }

    /// Copy of the in-progress commit.
    pub fn staged(&self) -> Commit {
        self.write.lock().staged.clone()
    }

    /// Drop the in-progress commit. Checkpoints already appended to
    /// histories stay there.
    pub fn discard_staged(&self) {
        let mut state = self.write.lock();
        let discarded = state.staged.changes().len();
        let started = state.clock.tick();
        state.staged = Commit::new_at(self.owner.clone(), started);
        debug!(discarded, "Discarded staged changes");
    }

    /// Seal the in-progress commit onto HEAD and store it.
    pub fn commit(&self, message: &str) -> Result<Commit, HistoryError> {
        let mut state = self.write.lock();
        if state.staged.is_empty() {
            return Err(HistoryError::NothingToCommit);
        }

        let parent = self.store.commits().head()?;
        let sealed = state.staged.clone().with_message(message).seal(parent)?;
        self.store.commits().append(&sealed)?;

        let started = state.clock.tick();
        state.staged = Commit::new_at(self.owner.clone(), started);

        if let Some(hash) = sealed.hash() {
            info!(
                commit = %hash.short_string(),
                changes = sealed.changes().len(),
                message = %sealed.message(),
                "Created commit"
            );
        }
        Ok(sealed)
    }

    pub fn head(&self) -> Result<Option<ContentHash>, HistoryError> {
        self.store.commits().head()
    }

    pub fn get_commit(&self, hash: &ContentHash) -> Result<Option<Commit>, HistoryError> {
        self.store.commits().get(hash)
    }

    pub fn commit_store(&self) -> &CommitStore {
        self.store.commits()
    }

    /// Walk the local chain from HEAD to the first commit.
    pub fn log(&self) -> Result<CommitLog, HistoryError> {
        Ok(CommitLog::new(self.store.commits().clone(), self.head()?))
    }

    /// All stored commits, including ones not reachable from HEAD.
    pub fn commits(&self) -> Commits {
        self.store.commits().iter()
    }

    /// Store a sealed commit received from elsewhere, e.g. a missing parent
    /// fetched from a peer. HEAD does not move.
    pub fn import_commit(&self, commit: &Commit) -> Result<bool, HistoryError> {
        let _guard = self.write.lock();
        let inserted = self.store.commits().put(commit)?;
        if let (true, Some(hash)) = (inserted, commit.hash()) {
            debug!(commit = %hash.short_string(), "Imported commit");
        }
        Ok(inserted)
    }

    pub fn flush(&self) -> Result<(), HistoryError> {
        self.store.flush()?;
        Ok(())
    }
}

/// Newest timestamp already on disk. New checkpoints must sort after it even
/// if the wall clock has stepped back since it was written.
fn clock_floor(store: &Store) -> Result<Timestamp, HistoryError> {
    let mut floor = store.history().high_water()?.unwrap_or_default();

    let Some(head) = store.commits().head()? else {
        return Ok(floor);
    };
    match store.commits().get(&head) {
        Ok(Some(commit)) => {
            floor = commit
                .changes()
                .values()
                .map(|cp| cp.mod_time())
                .fold(floor.max(commit.mod_time()), std::cmp::max);
        }
        Ok(None) => {
            warn!(head = %head.short_string(), "HEAD points at a missing commit");
        }
        Err(e) => {
            warn!(head = %head.short_string(), error = %e, "HEAD commit is unreadable");
        }
    }
    Ok(floor)
}
