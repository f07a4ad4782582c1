//! # raft-log
//!
//! why: pin down what a persisted raft log entry is and how it is laid out in bytes
//! relations: used by raft-kvstore for every record it writes or reads back
//! what: LogEntry, LogType, record codec, uint64 codec

pub mod codec;
pub mod log;

pub use codec::{
    decode_entry, decode_entry_at, decode_u64, encode_entry, encode_u64, CodecError,
    RECORD_FORMAT_VERSION,
};
pub use log::{LogEntry, LogType};
