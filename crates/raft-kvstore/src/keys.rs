//! # keys
//!
//! why: the substrate orders keys by raw bytes, so log indices must be laid
//! out so that byte order and numeric order agree
//! relations: used by log_store.rs and stable_store.rs
//! what: namespace bytes, log key encoding, stable key encoding
//!
//! ```text
//! log key    = 'L' | index u64 BE      (always 9 bytes)
//! stable key = 'S' | caller key bytes
//! ```

use raft_log::{decode_u64, encode_u64};

use crate::error::{Result, StoreError};

/// namespace of log entry keys
pub const LOG_NAMESPACE: u8 = b'L';

/// namespace of stable value keys
pub const STABLE_NAMESPACE: u8 = b'S';

/// width of an encoded log key
pub const LOG_KEY_LEN: usize = 9;

/// key under which the entry at `index` is stored
pub fn log_key(index: u64) -> [u8; LOG_KEY_LEN] {
    let mut key = [0u8; LOG_KEY_LEN];
    key[0] = LOG_NAMESPACE;
    key[1..].copy_from_slice(&encode_u64(index));
    key
}

/// index held by a log key
pub fn log_index(key: &[u8]) -> Result<u64> {
    match key.split_first() {
        Some((&LOG_NAMESPACE, raw)) if key.len() == LOG_KEY_LEN => Ok(decode_u64(raw)?),
        _ => Err(StoreError::CorruptValue(format!(
            "malformed log key {:02x?}",
            key
        ))),
    }
}

/// key under which a stable value is stored
pub fn stable_key(key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(key.len() + 1);
    out.push(STABLE_NAMESPACE);
    out.extend_from_slice(key);
    out
}

/// smallest key strictly greater than every key carrying `prefix`,
/// `None` when no such key exists (prefix is all 0xff)
pub(crate) fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}
