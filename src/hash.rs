//! Content hashes in multihash framing.
//!
//! A hash is `varint(code) || varint(digest_len) || digest`. Digests computed by
//! this crate use BLAKE3-256, but any well-framed multihash read back from a
//! peer or from disk is accepted.

use crate::error::HistoryError;
use blake3::Hasher;
use std::fmt;

/// Multihash code for BLAKE3.
pub const BLAKE3_CODE: u64 = 0x1e;

const BLAKE3_LEN: u64 = 32;
const SHORT_LEN: usize = 10;
// u64 varints never need more than 10 bytes
const MAX_VARINT_LEN: usize = 10;

/// Identity of a blob of bytes.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash {
    bytes: Vec<u8>,
    digest_offset: usize,
}

impl ContentHash {
    /// Hash `data` with BLAKE3.
    pub fn of(data: &[u8]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(data);
        Self::from_blake3(hasher.finalize())
    }

    pub(crate) fn from_blake3(digest: blake3::Hash) -> Self {
        let mut bytes = Vec::with_capacity(2 + BLAKE3_LEN as usize);
        write_varint(&mut bytes, BLAKE3_CODE);
        write_varint(&mut bytes, BLAKE3_LEN);
        let digest_offset = bytes.len();
        bytes.extend_from_slice(digest.as_bytes());
        Self {
            bytes,
            digest_offset,
        }
    }

    /// Parse a multihash, rejecting anything that is not well framed.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, HistoryError> {
        let (_code, code_len) = read_varint(raw)
            .ok_or_else(|| HistoryError::MalformedHash("bad code varint".to_string()))?;
        let (digest_len, len_len) = read_varint(&raw[code_len..])
            .ok_or_else(|| HistoryError::MalformedHash("bad length varint".to_string()))?;

        let digest_offset = code_len + len_len;
        let actual = (raw.len() - digest_offset) as u64;
        if digest_len == 0 {
            return Err(HistoryError::MalformedHash("empty digest".to_string()));
        }
        if actual != digest_len {
            return Err(HistoryError::MalformedHash(format!(
                "digest length {} does not match declared length {}",
                actual, digest_len
            )));
        }

        Ok(Self {
            bytes: raw.to_vec(),
            digest_offset,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn code(&self) -> u64 {
        read_varint(&self.bytes).map(|(code, _)| code).unwrap_or(0)
    }

    pub fn digest(&self) -> &[u8] {
        &self.bytes[self.digest_offset..]
    }

    /// Truncated base58 of the digest, for log lines.
    pub fn short_string(&self) -> String {
        let mut short = bs58::encode(self.digest()).into_string();
        short.truncate(SHORT_LEN);
        short
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(&self.bytes).into_string())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short_string())
    }
}

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn read_varint(raw: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    for (i, byte) in raw.iter().take(MAX_VARINT_LEN).enumerate() {
        let bits = u64::from(byte & 0x7f);
        let shift = 7 * i as u32;
        if shift == 63 && bits > 1 {
            return None;
        }
        value |= bits << shift;
        if byte & 0x80 == 0 {
            // Multihash varints must be minimally encoded.
            if i > 0 && *byte == 0 {
                return None;
            }
            return Some((value, i + 1));
        }
    }
    None
}
