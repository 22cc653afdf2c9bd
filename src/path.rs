//! Logical path normalization
//!
//! History is keyed by the logical path inside the store, not by a host
//! filesystem path. Two spellings of the same path must map to the same key.

use crate::error::HistoryError;
use unicode_normalization::UnicodeNormalization;

/// Normalize a logical store path.
///
/// This function:
/// 1. Normalizes Unicode to NFC
/// 2. Collapses repeated slashes and removes trailing slashes (except root)
/// 3. Ensures a leading slash
///
/// Empty paths and paths containing NUL are rejected; NUL separates the path
/// from the timestamp in storage keys.
pub fn normalize(path: &str) -> Result<String, HistoryError> {
    if path.is_empty() {
        return Err(HistoryError::InvalidArguments("path must not be empty".to_string()));
    }
    if path.contains('\0') {
        return Err(HistoryError::InvalidArguments(format!(
            "path contains NUL byte: {:?}",
            path
        )));
    }

    let nfc: String = path.nfc().collect();

    let mut normalized = String::with_capacity(nfc.len() + 1);
    for segment in nfc.split('/').filter(|s| !s.is_empty()) {
        normalized.push('/');
        normalized.push_str(segment);
    }

    if normalized.is_empty() {
        normalized.push('/');
    }

    Ok(normalized)
}
