//! # substrate
//!
//! why: both stores sit on one ordered, durable key-value engine and should not
//! care which one
//! relations: implemented by RedbStore and MemoryStore, consumed by the log and stable stores
//! what: OrderedStore trait, WriteBatch, StoreHandle

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Result, StoreError};

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

/// trait for an ordered key-value engine
///
/// keys compare as raw bytes. every method runs to completion on the calling
/// thread. implementations must make a `write` all-or-nothing and serve each
/// read from a single point-in-time view.
pub trait OrderedStore: Send + Sync {
    /// point lookup
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// apply every op in the batch atomically
    fn write(&self, batch: WriteBatch) -> Result<()>;

    /// smallest key carrying `prefix`
    fn first_key(&self, prefix: &[u8]) -> Result<Option<Vec<u8>>>;

    /// largest key carrying `prefix`
    fn last_key(&self, prefix: &[u8]) -> Result<Option<Vec<u8>>>;

    /// smallest and largest key carrying `prefix`, read from one view
    fn key_bounds(&self, prefix: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>>;

    /// key/value pairs with `start <= key <= end`, in key order
    fn scan(&self, start: &[u8], end: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// keys with `start <= key <= end`, in key order
    fn scan_keys(&self, start: &[u8], end: &[u8]) -> Result<Vec<Vec<u8>>>;
}

/// a single mutation inside a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// ordered list of mutations committed as one unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ops: Vec::with_capacity(capacity),
        }
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Delete { key: key.into() });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// one store's claim on a shared substrate
///
/// several handles may point at the same substrate; releasing one only drops
/// that handle's reference, the substrate itself goes away with the last one.
pub struct StoreHandle<S> {
    inner: RwLock<Option<Arc<S>>>,
}

impl<S> StoreHandle<S> {
    pub fn new(substrate: Arc<S>) -> Self {
        Self {
            inner: RwLock::new(Some(substrate)),
        }
    }

    /// the substrate, or `StorageFailure` once released
    pub fn get(&self) -> Result<Arc<S>> {
        self.inner
            .read()
            .clone()
            .ok_or_else(|| StoreError::StorageFailure("store is closed".to_string()))
    }

    pub fn is_open(&self) -> bool {
        self.inner.read().is_some()
    }

    /// give up this handle's reference
    pub fn release(&self) -> Result<()> {
        let substrate = self
            .inner
            .write()
            .take()
            .ok_or_else(|| StoreError::CloseFailed("store already closed".to_string()))?;

        let remaining = Arc::strong_count(&substrate) - 1;
        debug!("released store handle, {} other references remain", remaining);
        Ok(())
    }
}
