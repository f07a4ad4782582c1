//! # comprehensive codec tests
//!
//! why: the record and uint64 layouts are what previously written data depends on
//! relations: tests raft-log crate
//! what: entry model, record encoding, corruption detection, uint64 encoding

use raft_log::{
    decode_entry, decode_entry_at, decode_u64, encode_entry, encode_u64, CodecError, LogEntry,
    LogType, RECORD_FORMAT_VERSION,
};

// =============================================================================
// SECTION 1: ENTRY MODEL
// =============================================================================

mod entry_model {
    use super::*;

    #[test]
    fn with_kind_keeps_other_fields() {
        let entry = LogEntry::new(4, 12, b"cfg".to_vec()).with_kind(LogType::Configuration);

        assert_eq!(entry.term, 4);
        assert_eq!(entry.index, 12);
        assert_eq!(entry.kind, LogType::Configuration);
        assert_eq!(entry.data, b"cfg".to_vec());
    }

    #[test]
    fn default_kind_is_command() {
        assert_eq!(LogType::default(), LogType::Command);
    }
}

// =============================================================================
// SECTION 2: RECORD ENCODING
// =============================================================================

mod record_encoding {
    use super::*;

    #[test]
    fn every_named_kind_survives_encoding() {
        for kind in [
            LogType::Command,
            LogType::Noop,
            LogType::Barrier,
            LogType::Configuration,
            LogType::Other(17),
        ] {
            let entry = LogEntry::new(1, 5, b"x".to_vec()).with_kind(kind);
            let decoded = decode_entry(&encode_entry(&entry).unwrap()).unwrap();
            assert_eq!(decoded.kind, kind);
        }
    }

    #[test]
    fn other_kind_cannot_reuse_named_tags() {
        for tag in 0..=3u8 {
            let entry = LogEntry::new(1, 1, b"x".to_vec()).with_kind(LogType::Other(tag));
            assert!(matches!(
                encode_entry(&entry),
                Err(CodecError::ReservedKindTag(t)) if t == tag
            ));
        }
    }

    #[test]
    fn empty_payload() {
        let entry = LogEntry::new(1, 1, Vec::new()).with_kind(LogType::Noop);
        let record = encode_entry(&entry).unwrap();

        // header + index + term + tag + length prefix
        assert_eq!(record.len(), 5 + 8 + 8 + 1 + 8);
        assert_eq!(decode_entry(&record).unwrap(), entry);
    }

    #[test]
    fn large_payload() {
        let entry = LogEntry::new(1, 1, vec![7u8; 1024 * 1024]);
        let decoded = decode_entry(&encode_entry(&entry).unwrap()).unwrap();

        assert_eq!(decoded.data.len(), 1024 * 1024);
    }

    #[test]
    fn extreme_index_and_term() {
        let entry = LogEntry::new(u64::MAX, u64::MAX, vec![0x00, 0xFF]);
        let decoded = decode_entry(&encode_entry(&entry).unwrap()).unwrap();

        assert_eq!(decoded, entry);
    }

    #[test]
    fn decode_at_matching_index() {
        let entry = LogEntry::new(2, 30, b"cmd".to_vec());
        let record = encode_entry(&entry).unwrap();

        assert_eq!(decode_entry_at(30, &record).unwrap(), entry);
    }
}

// =============================================================================
// SECTION 3: CORRUPTION DETECTION
// =============================================================================

mod corruption {
    use super::*;

    fn record() -> Vec<u8> {
        encode_entry(&LogEntry::new(3, 8, b"SET key value".to_vec())).unwrap()
    }

    #[test]
    fn unknown_version() {
        let mut bytes = record();
        bytes[0] = RECORD_FORMAT_VERSION + 1;

        assert!(matches!(
            decode_entry(&bytes),
            Err(CodecError::UnsupportedVersion(v)) if v == RECORD_FORMAT_VERSION + 1
        ));
    }

    #[test]
    fn damaged_checksum() {
        let mut bytes = record();
        bytes[2] ^= 0xFF;

        assert!(matches!(
            decode_entry(&bytes),
            Err(CodecError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn cut_short_body() {
        let bytes = record();
        let cut = &bytes[..bytes.len() - 4];

        // the checksum no longer matches what is left
        assert!(decode_entry(cut).is_err());
    }

    #[test]
    fn empty_input() {
        assert!(matches!(
            decode_entry(&[]),
            Err(CodecError::Truncated { len: 0 })
        ));
    }

    #[test]
    fn record_under_wrong_index() {
        let bytes = record();

        assert!(matches!(
            decode_entry_at(9, &bytes),
            Err(CodecError::IndexMismatch {
                expected: 9,
                found: 8
            })
        ));
    }
}

// =============================================================================
// SECTION 4: UINT64 ENCODING
// =============================================================================

mod uint64_encoding {
    use super::*;

    #[test]
    fn boundaries() {
        for value in [0, 1, 42_000, u64::MAX - 1, u64::MAX] {
            assert_eq!(decode_u64(&encode_u64(value)).unwrap(), value);
        }
    }

    #[test]
    fn most_significant_byte_first() {
        assert_eq!(encode_u64(u64::MAX), [0xFF; 8]);
        assert_eq!(encode_u64(1 << 56), [1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn empty_value_is_rejected() {
        assert!(matches!(
            decode_u64(&[]),
            Err(CodecError::InvalidUintLength(0))
        ));
    }
}

// =============================================================================
// SECTION 5: PROPERTIES
// =============================================================================

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn arb_entry() -> impl Strategy<Value = LogEntry> {
        (
            1u64..,
            any::<u64>(),
            any::<u8>(),
            proptest::collection::vec(any::<u8>(), 0..256),
        )
            .prop_map(|(index, term, tag, data)| {
                LogEntry::new(term, index, data).with_kind(LogType::from(tag))
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_record_preserves_entry(entry in arb_entry()) {
            let record = encode_entry(&entry).unwrap();
            prop_assert_eq!(decode_entry_at(entry.index, &record).unwrap(), entry);
        }

        #[test]
        fn prop_raw_other_kind_encodes_faithfully_or_not_at_all(tag in any::<u8>()) {
            let entry = LogEntry::new(1, 1, b"x".to_vec()).with_kind(LogType::Other(tag));
            match encode_entry(&entry) {
                Ok(record) => {
                    prop_assert!(tag > 3);
                    prop_assert_eq!(decode_entry(&record).unwrap(), entry);
                }
                Err(err) => {
                    prop_assert!(tag <= 3);
                    prop_assert!(matches!(err, CodecError::ReservedKindTag(_)));
                }
            }
        }

        #[test]
        fn prop_uint64_order_matches_byte_order(a in any::<u64>(), b in any::<u64>()) {
            prop_assert_eq!(a.cmp(&b), encode_u64(a).cmp(&encode_u64(b)));
        }
    }
}
