//! Wire format for checkpoints and commits.
//!
//! Values are `u32` little-endian format version followed by a bincode payload.
//! Commit hashes are computed over the bincode encoding of the commit body
//! alone, so the encoding must stay byte-for-byte stable: maps are written as
//! path-sorted sequences and change types as their string tokens.

use crate::checkpoint::{ChangeType, Checkpoint};
use crate::commit::Commit;
use crate::error::HistoryError;
use crate::hash::ContentHash;
use crate::types::{Identity, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const WIRE_VERSION_V1: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CheckpointRecord {
    hash: Vec<u8>,
    mod_time: u64,
    size: u64,
    change: String,
    author: String,
}

/// Hashed part of a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CommitBody {
    message: String,
    author: String,
    mod_time: u64,
    changes: Vec<(String, CheckpointRecord)>,
    parent: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CommitRecord {
    hash: Option<Vec<u8>>,
    body: CommitBody,
}

impl From<&Checkpoint> for CheckpointRecord {
    fn from(cp: &Checkpoint) -> Self {
        CheckpointRecord {
            hash: cp.hash().to_bytes(),
            mod_time: cp.mod_time().as_nanos(),
            size: cp.size(),
            change: cp.change().as_token().to_string(),
            author: cp.author().as_str().to_string(),
        }
    }
}

impl TryFrom<CheckpointRecord> for Checkpoint {
    type Error = HistoryError;

    fn try_from(record: CheckpointRecord) -> Result<Self, Self::Error> {
        let change: ChangeType = record.change.parse()?;
        Ok(Checkpoint::new(
            ContentHash::from_bytes(&record.hash)?,
            Timestamp::from_nanos(record.mod_time),
            record.size,
            change,
            Identity::new(record.author)
                .map_err(|e| HistoryError::decode("checkpoint author", e))?,
        ))
    }
}

impl From<&Commit> for CommitBody {
    fn from(commit: &Commit) -> Self {
        CommitBody {
            message: commit.message().to_string(),
            author: commit.author().as_str().to_string(),
            mod_time: commit.mod_time().as_nanos(),
            changes: commit
                .changes()
                .iter()
                .map(|(path, cp)| (path.clone(), CheckpointRecord::from(cp)))
                .collect(),
            parent: commit.parent().map(|p| p.to_bytes()),
        }
    }
}

fn frame<T: Serialize>(what: &str, value: &T) -> Result<Vec<u8>, HistoryError> {
    let payload = bincode::serialize(value).map_err(|e| HistoryError::encode(what, e))?;
    let mut out = Vec::with_capacity(4 + payload.len());
    out.extend_from_slice(&WIRE_VERSION_V1.to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

fn unframe<'a, T: Deserialize<'a>>(what: &str, bytes: &'a [u8]) -> Result<T, HistoryError> {
    if bytes.len() < 4 {
        return Err(HistoryError::decode(what, "record too short"));
    }
    let version = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if version != WIRE_VERSION_V1 {
        return Err(HistoryError::decode(
            what,
            format!("unsupported format version {}", version),
        ));
    }
    bincode::deserialize(&bytes[4..]).map_err(|e| HistoryError::decode(what, e))
}

pub fn encode_checkpoint(checkpoint: &Checkpoint) -> Result<Vec<u8>, HistoryError> {
    frame("checkpoint", &CheckpointRecord::from(checkpoint))
}

pub fn decode_checkpoint(bytes: &[u8]) -> Result<Checkpoint, HistoryError> {
    let record: CheckpointRecord = unframe("checkpoint", bytes)?;
    Checkpoint::try_from(record)
}

/// Deterministic encoding of the hashed part of a commit.
pub(crate) fn encode_commit_body(commit: &Commit) -> Result<Vec<u8>, HistoryError> {
    bincode::serialize(&CommitBody::from(commit))
        .map_err(|e| HistoryError::encode("commit body", e))
}

pub fn encode_commit(commit: &Commit) -> Result<Vec<u8>, HistoryError> {
    let record = CommitRecord {
        hash: commit.hash().map(|h| h.to_bytes()),
        body: CommitBody::from(commit),
    };
    frame("commit", &record)
}

/// Decode a commit. Sealed commits are checked against their recorded hash.
pub fn decode_commit(bytes: &[u8]) -> Result<Commit, HistoryError> {
    let record: CommitRecord = unframe("commit", bytes)?;
    let body = record.body;

    let mut changes = BTreeMap::new();
    for (path, cp) in body.changes {
        if changes.insert(path.clone(), Checkpoint::try_from(cp)?).is_some() {
            return Err(HistoryError::decode(
                "commit",
                format!("duplicate change for {}", path),
            ));
        }
    }

    let parent = body
        .parent
        .as_deref()
        .map(ContentHash::from_bytes)
        .transpose()?;
    let author =
        Identity::new(body.author).map_err(|e| HistoryError::decode("commit author", e))?;
    let hash = record
        .hash
        .as_deref()
        .map(ContentHash::from_bytes)
        .transpose()?;

    let commit = Commit::from_parts(
        body.message,
        author,
        Timestamp::from_nanos(body.mod_time),
        changes,
        parent,
        hash,
    );
    commit.verify()?;
    Ok(commit)
}
