//! Storage key layout.
//!
//! The checkpoint tree flattens "one bucket per path, keyed by time" into a
//! single ordered keyspace: `path || 0x00 || mod_time (u64 big-endian)`.
//! Paths never contain NUL, so a path's entries are contiguous and sorted by
//! time, and `path || 0x00` is a prefix that matches no other path.

use crate::error::HistoryError;
use crate::types::Timestamp;

const PATH_TERMINATOR: u8 = 0;
const TIMESTAMP_LEN: usize = 8;

/// Ref key of the newest commit on the local chain.
pub const HEAD_REF: &[u8] = b"HEAD";

/// Ref key of the newest checkpoint timestamp ever written.
pub const CLOCK_REF: &[u8] = b"CLOCK";

pub fn path_prefix(path: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(path.len() + 1);
    key.extend_from_slice(path.as_bytes());
    key.push(PATH_TERMINATOR);
    key
}

pub fn checkpoint_key(path: &str, mod_time: Timestamp) -> Vec<u8> {
    let mut key = path_prefix(path);
    key.extend_from_slice(&mod_time.to_be_bytes());
    key
}

pub fn split_checkpoint_key(key: &[u8]) -> Result<(&str, Timestamp), HistoryError> {
    if key.len() < TIMESTAMP_LEN + 2 || key[key.len() - TIMESTAMP_LEN - 1] != PATH_TERMINATOR {
        return Err(HistoryError::decode(
            "checkpoint key",
            format!("malformed key {}", hex::encode(key)),
        ));
    }
    let split = key.len() - TIMESTAMP_LEN;
    let path = std::str::from_utf8(&key[..split - 1])
        .map_err(|e| HistoryError::decode("checkpoint key", e))?;
    let mut ts = [0u8; TIMESTAMP_LEN];
    ts.copy_from_slice(&key[split..]);
    Ok((path, Timestamp::from_be_bytes(ts)))
}
