//! # error
//!
//! why: callers must be able to tell "doesn't exist" apart from "storage broken"
//! relations: returned by every store and substrate operation
//! what: StoreError, Result alias, conversions from codec and redb errors

use std::path::PathBuf;

use raft_log::CodecError;
use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// every failure a store operation can report
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // expected absences
    // -------------------------------------------------------------------------
    #[error("not found")]
    NotFound,

    #[error("log not found at index {0}")]
    LogNotFound(u64),

    // -------------------------------------------------------------------------
    // data errors
    // -------------------------------------------------------------------------
    #[error("corrupt value: {0}")]
    CorruptValue(String),

    // -------------------------------------------------------------------------
    // substrate errors
    // -------------------------------------------------------------------------
    #[error("storage failure: {0}")]
    StorageFailure(String),

    #[error("failed to open store at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("failed to close store: {0}")]
    CloseFailed(String),
}

impl StoreError {
    /// true for the two "doesn't exist" kinds
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound | Self::LogNotFound(_))
    }

    /// true when the store can no longer be trusted for this operation
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::CorruptValue(_) | Self::StorageFailure(_) | Self::OpenFailed { .. }
        )
    }

    pub(crate) fn open_failed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::OpenFailed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<CodecError> for StoreError {
    fn from(err: CodecError) -> Self {
        Self::CorruptValue(err.to_string())
    }
}

macro_rules! storage_failure_from {
    ($($source:ty),+ $(,)?) => {
        $(
            impl From<$source> for StoreError {
                fn from(err: $source) -> Self {
                    Self::StorageFailure(err.to_string())
                }
            }
        )+
    };
}

storage_failure_from!(
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);
