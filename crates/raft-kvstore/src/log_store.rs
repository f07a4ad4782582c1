//! # log_store
//!
//! why: persist the raft log so it survives restarts and can be compacted
//! relations: keys from keys.rs, records from raft-log's codec, bytes kept in an OrderedStore
//! what: LogStore trait, KvLogStore implementation

use std::path::Path;
use std::sync::Arc;

use raft_log::{decode_entry_at, encode_entry, LogEntry};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::keys::{log_index, log_key, LOG_NAMESPACE};
use crate::substrate::{MemoryStore, OrderedStore, RedbStore, StoreHandle, WriteBatch};

/// file used by [`KvLogStore::open`]
pub const LOG_FILE_NAME: &str = "logs.redb";

/// trait for durable storage of the raft log
///
/// index 0 is never a valid entry index; `first_index`/`last_index` return it
/// when the log is empty.
pub trait LogStore {
    /// smallest stored index, 0 when empty
    fn first_index(&self) -> Result<u64>;

    /// largest stored index, 0 when empty
    fn last_index(&self) -> Result<u64>;

    /// the entry at `index`, `LogNotFound` if absent
    fn get_log(&self, index: u64) -> Result<LogEntry>;

    /// store a single entry under its index
    fn store_log(&self, entry: &LogEntry) -> Result<()>;

    /// store all entries as one atomic batch
    fn store_logs(&self, entries: &[LogEntry]) -> Result<()>;

    /// delete every entry with `min <= index <= max` as one atomic batch
    ///
    /// the matching keys are collected in one read and deleted in a later
    /// write; an entry stored into the range in between is kept
    fn delete_range(&self, min: u64, max: u64) -> Result<()>;
}

/// log store on top of an ordered key-value substrate
pub struct KvLogStore<S = RedbStore> {
    handle: StoreHandle<S>,
}

impl KvLogStore<RedbStore> {
    /// open a log store with its own store file inside `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let config = StoreConfig::builder()
            .dir(dir.as_ref())
            .file_name(LOG_FILE_NAME)
            .build();
        Ok(Self::new(Arc::new(RedbStore::open(&config)?)))
    }
}

impl KvLogStore<MemoryStore> {
    /// log store kept entirely in memory, for testing
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}

impl<S: OrderedStore> KvLogStore<S> {
    /// wrap a (possibly shared) substrate
    pub fn new(substrate: Arc<S>) -> Self {
        Self {
            handle: StoreHandle::new(substrate),
        }
    }

    /// first and last index read from one consistent view, `(0, 0)` when empty
    pub fn index_bounds(&self) -> Result<(u64, u64)> {
        match self.handle.get()?.key_bounds(&[LOG_NAMESPACE])? {
            Some((first, last)) => Ok((log_index(&first)?, log_index(&last)?)),
            None => Ok((0, 0)),
        }
    }

    /// every stored entry with `min <= index <= max`, in index order
    pub fn get_logs(&self, min: u64, max: u64) -> Result<Vec<LogEntry>> {
        if min > max {
            return Ok(Vec::new());
        }
        self.handle
            .get()?
            .scan(&log_key(min), &log_key(max))?
            .into_iter()
            .map(|(key, record)| decode_record(log_index(&key)?, &record))
            .collect()
    }

    /// release this store's handle on the substrate
    ///
    /// later operations fail; a second close fails with `CloseFailed`
    pub fn close(&self) -> Result<()> {
        self.handle.release()?;
        info!("closed log store");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }

    fn seek(&self, last: bool) -> Result<u64> {
        let substrate = self.handle.get()?;
        let key = if last {
            substrate.last_key(&[LOG_NAMESPACE])?
        } else {
            substrate.first_key(&[LOG_NAMESPACE])?
        };
        key.map_or(Ok(0), |key| log_index(&key))
    }
}

fn encode_record(entry: &LogEntry) -> Result<Vec<u8>> {
    if entry.index == 0 {
        return Err(StoreError::CorruptValue(
            "index 0 is reserved and cannot hold an entry".to_string(),
        ));
    }
    Ok(encode_entry(entry)?)
}

fn decode_record(index: u64, record: &[u8]) -> Result<LogEntry> {
    decode_entry_at(index, record).map_err(|e| {
        warn!("failed to decode log entry at index {}: {}", index, e);
        StoreError::from(e)
    })
}

impl<S: OrderedStore> LogStore for KvLogStore<S> {
    fn first_index(&self) -> Result<u64> {
        self.seek(false)
    }

    fn last_index(&self) -> Result<u64> {
        self.seek(true)
    }

    fn get_log(&self, index: u64) -> Result<LogEntry> {
        match self.handle.get()?.get(&log_key(index))? {
            Some(record) => decode_record(index, &record),
            None => Err(StoreError::LogNotFound(index)),
        }
    }

    fn store_log(&self, entry: &LogEntry) -> Result<()> {
        self.store_logs(std::slice::from_ref(entry))
    }

    fn store_logs(&self, entries: &[LogEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        // encode everything before touching the substrate
        let mut batch = WriteBatch::with_capacity(entries.len());
        for entry in entries {
            batch.put(log_key(entry.index), encode_record(entry)?);
        }

        self.handle.get()?.write(batch)?;
        debug!(
            "stored {} log entries [{}..={}]",
            entries.len(),
            entries[0].index,
            entries[entries.len() - 1].index
        );
        Ok(())
    }

    fn delete_range(&self, min: u64, max: u64) -> Result<()> {
        if min > max {
            return Ok(());
        }

        let substrate = self.handle.get()?;
        let keys = substrate.scan_keys(&log_key(min), &log_key(max))?;
        if keys.is_empty() {
            return Ok(());
        }

        let mut batch = WriteBatch::with_capacity(keys.len());
        let deleted = keys.len();
        for key in keys {
            batch.delete(key);
        }
        substrate.write(batch)?;

        debug!("deleted {} log entries in [{}..={}]", deleted, min, max);
        Ok(())
    }
}
