//! # codec
//!
//! why: the byte layouts here are the on-disk compatibility contract
//! relations: used by raft-kvstore for every log record and uint64 value
//! what: log-entry record encoding, 8-byte big-endian uint64 encoding
//!
//! ## record layout
//!
//! ```text
//! ┌─────────────┬──────────────┬──────────────────────────────────────────┐
//! │ version (1) │ crc32 BE (4) │ body                                     │
//! └─────────────┴──────────────┴──────────────────────────────────────────┘
//! body = index u64 LE | term u64 LE | type tag u8 | data len u64 LE | data
//! ```
//!
//! the body is the bincode fixint little-endian encoding of `LogEntry`; the
//! crc covers the body only.

use bincode::Options;
use thiserror::Error;

use crate::log::LogEntry;

/// current record format version
pub const RECORD_FORMAT_VERSION: u8 = 1;

/// version byte plus checksum
pub const RECORD_HEADER_LEN: usize = 5;

/// width of an encoded uint64 value
pub const UINT64_LEN: usize = 8;

/// errors produced while decoding stored bytes
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unsupported record format version {0}")]
    UnsupportedVersion(u8),

    #[error("record too short: {len} bytes")]
    Truncated { len: usize },

    #[error("record checksum mismatch (stored {stored:#010x}, computed {computed:#010x})")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("malformed record body: {0}")]
    Malformed(#[from] bincode::Error),

    #[error("expected 8 bytes for a uint64 value, got {0}")]
    InvalidUintLength(usize),

    #[error("record holds index {found} but was stored under index {expected}")]
    IndexMismatch { expected: u64, found: u64 },

    #[error("kind Other({0}) reuses the tag of a named kind")]
    ReservedKindTag(u8),
}

fn body_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// encode an entry into a versioned, checksummed record
///
/// `Other` kinds carrying tags 0..=3 are rejected, they would decode as the
/// named kind
pub fn encode_entry(entry: &LogEntry) -> Result<Vec<u8>, CodecError> {
    if !entry.kind.is_canonical() {
        return Err(CodecError::ReservedKindTag(entry.kind.tag()));
    }
    let body = body_options().serialize(entry)?;

    let mut record = Vec::with_capacity(RECORD_HEADER_LEN + body.len());
    record.push(RECORD_FORMAT_VERSION);
    record.extend_from_slice(&crc32fast::hash(&body).to_be_bytes());
    record.extend_from_slice(&body);
    Ok(record)
}

/// decode a record produced by [`encode_entry`]
pub fn decode_entry(record: &[u8]) -> Result<LogEntry, CodecError> {
    if record.len() < RECORD_HEADER_LEN {
        return Err(CodecError::Truncated { len: record.len() });
    }

    let version = record[0];
    if version != RECORD_FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let stored = u32::from_be_bytes([record[1], record[2], record[3], record[4]]);
    let body = &record[RECORD_HEADER_LEN..];
    let computed = crc32fast::hash(body);
    if stored != computed {
        return Err(CodecError::ChecksumMismatch { stored, computed });
    }

    Ok(body_options().deserialize(body)?)
}

/// decode a record read back from the slot for `index`
///
/// a record whose embedded index disagrees with its slot is corrupt
pub fn decode_entry_at(index: u64, record: &[u8]) -> Result<LogEntry, CodecError> {
    let entry = decode_entry(record)?;
    if entry.index != index {
        return Err(CodecError::IndexMismatch {
            expected: index,
            found: entry.index,
        });
    }
    Ok(entry)
}

/// fixed-width big-endian encoding, byte order matches numeric order
pub fn encode_u64(value: u64) -> [u8; UINT64_LEN] {
    value.to_be_bytes()
}

/// inverse of [`encode_u64`]; anything but exactly 8 bytes is rejected
pub fn decode_u64(bytes: &[u8]) -> Result<u64, CodecError> {
    let raw: [u8; UINT64_LEN] = bytes
        .try_into()
        .map_err(|_| CodecError::InvalidUintLength(bytes.len()))?;
    Ok(u64::from_be_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogType;

    #[test]
    fn record_layout_is_pinned() {
        let entry = LogEntry::new(2, 1, vec![0xAB]).with_kind(LogType::Barrier);
        let record = encode_entry(&entry).unwrap();

        let mut body = Vec::new();
        body.extend_from_slice(&1u64.to_le_bytes());
        body.extend_from_slice(&2u64.to_le_bytes());
        body.push(2);
        body.extend_from_slice(&1u64.to_le_bytes());
        body.push(0xAB);

        assert_eq!(record[0], RECORD_FORMAT_VERSION);
        assert_eq!(&record[1..5], &crc32fast::hash(&body).to_be_bytes());
        assert_eq!(&record[5..], body.as_slice());
    }

    #[test]
    fn other_kind_with_named_tag_is_rejected() {
        let entry = LogEntry::new(1, 1, b"x".to_vec()).with_kind(LogType::Other(2));

        assert!(matches!(
            encode_entry(&entry),
            Err(CodecError::ReservedKindTag(2))
        ));
    }

    #[test]
    fn flipped_payload_bit_is_detected() {
        let entry = LogEntry::new(1, 9, b"payload".to_vec());
        let mut record = encode_entry(&entry).unwrap();
        let last = record.len() - 1;
        record[last] ^= 0x01;

        assert!(matches!(
            decode_entry(&record),
            Err(CodecError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn short_record_is_truncated() {
        assert!(matches!(
            decode_entry(&[RECORD_FORMAT_VERSION, 0, 0]),
            Err(CodecError::Truncated { len: 3 })
        ));
    }

    #[test]
    fn uint64_is_big_endian() {
        assert_eq!(encode_u64(1), [0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(encode_u64(0x0102_0304_0506_0708), [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn uint64_rejects_wrong_width() {
        assert!(matches!(
            decode_u64(&[1, 2, 3]),
            Err(CodecError::InvalidUintLength(3))
        ));
        assert!(matches!(
            decode_u64(&[0; 9]),
            Err(CodecError::InvalidUintLength(9))
        ));
    }
}
