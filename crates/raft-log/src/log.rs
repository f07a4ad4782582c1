//! # log
//!
//! why: describe the entries of the replicated log the way they are persisted
//! relations: encoded by codec.rs, stored and fetched by raft-kvstore
//! what: LogEntry struct, LogType tag

use serde::{Deserialize, Serialize};

/// kind of a log entry
///
/// the storage layer never interprets the kind, it only keeps the tag stable.
/// tags outside the named set round-trip through `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum LogType {
    /// a command for the replicated state machine
    Command,
    /// appended by a new leader to commit entries from earlier terms
    Noop,
    /// forces all preceding entries to be applied
    Barrier,
    /// a cluster membership change
    Configuration,
    /// any other protocol-defined kind
    Other(u8),
}

impl LogType {
    /// the on-disk tag for this kind
    pub fn tag(self) -> u8 {
        match self {
            Self::Command => 0,
            Self::Noop => 1,
            Self::Barrier => 2,
            Self::Configuration => 3,
            Self::Other(tag) => tag,
        }
    }

    /// false for `Other` holding a named kind's tag, which cannot be told
    /// apart from that kind once stored
    pub fn is_canonical(self) -> bool {
        Self::from(self.tag()) == self
    }
}

impl Default for LogType {
    fn default() -> Self {
        Self::Command
    }
}

impl From<u8> for LogType {
    fn from(tag: u8) -> Self {
        match tag {
            0 => Self::Command,
            1 => Self::Noop,
            2 => Self::Barrier,
            3 => Self::Configuration,
            other => Self::Other(other),
        }
    }
}

impl From<LogType> for u8 {
    fn from(kind: LogType) -> Self {
        kind.tag()
    }
}

/// A single entry in the replicated log
///
/// field order is part of the record layout, see codec.rs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// The index of this entry in the log (1-indexed, 0 means "no log")
    pub index: u64,
    /// The term when this entry was created
    pub term: u64,
    /// what kind of entry this is
    pub kind: LogType,
    /// opaque payload, interpreted by higher layers only
    pub data: Vec<u8>,
}

impl LogEntry {
    /// Create a new command entry
    pub fn new(term: u64, index: u64, data: Vec<u8>) -> Self {
        Self {
            index,
            term,
            kind: LogType::Command,
            data,
        }
    }

    /// same entry with a different kind
    pub fn with_kind(mut self, kind: LogType) -> Self {
        self.kind = kind;
        self
    }
}
