//! in-memory substrate for testing
//!
//! stores everything in a BTreeMap, nothing survives the process. a batch is
//! applied under the write lock and undone if it fails part way, so readers
//! never see a partial batch.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::warn;

use super::{BatchOp, OrderedStore, WriteBatch};
use crate::error::{Result, StoreError};
use crate::keys::prefix_end;

type Map = BTreeMap<Vec<u8>, Vec<u8>>;

/// in-memory ordered store
#[derive(Default)]
pub struct MemoryStore {
    map: RwLock<Map>,
    /// fail the next batch once this many of its ops have been applied
    fail_batch_after: Mutex<Option<usize>>,
    /// fail every operation
    offline: AtomicBool,
}

impl MemoryStore {
    /// create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// make the next `write` fail after applying `ops` of its operations,
    /// simulating a crash in the middle of a batch. a batch with `ops` or
    /// fewer operations fails once all of them are applied
    pub fn fail_next_batch_after(&self, ops: usize) {
        *self.fail_batch_after.lock() = Some(ops);
    }

    /// make every operation fail until switched back
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// number of keys across all namespaces
    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::StorageFailure(
                "memory store is offline".to_string(),
            ));
        }
        Ok(())
    }

    fn rollback(map: &mut Map, undo: Vec<(Vec<u8>, Option<Vec<u8>>)>) {
        for (key, previous) in undo.into_iter().rev() {
            match previous {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    map.remove(&key);
                }
            }
        }
    }

    fn injected_failure(applied: usize) -> StoreError {
        warn!("injected failure after {} batch ops", applied);
        StoreError::StorageFailure(format!("injected failure after {} batch ops", applied))
    }

    fn prefix_bounds<'a>(
        prefix: &'a [u8],
        end: &'a Option<Vec<u8>>,
    ) -> (Bound<&'a [u8]>, Bound<&'a [u8]>) {
        let upper = match end {
            Some(end) => Bound::Excluded(end.as_slice()),
            None => Bound::Unbounded,
        };
        (Bound::Included(prefix), upper)
    }
}

impl OrderedStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.check_online()?;
        Ok(self.map.read().get(key).cloned())
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.check_online()?;

        let mut map = self.map.write();
        let fail_after = self.fail_batch_after.lock().take();
        let ops = batch.into_ops();
        let total = ops.len();
        // previous value of every touched key, newest last
        let mut undo: Vec<(Vec<u8>, Option<Vec<u8>>)> = Vec::with_capacity(total);

        for (applied, op) in ops.into_iter().enumerate() {
            if fail_after == Some(applied) {
                Self::rollback(&mut map, undo);
                return Err(Self::injected_failure(applied));
            }
            match op {
                BatchOp::Put { key, value } => {
                    let previous = map.insert(key.clone(), value);
                    undo.push((key, previous));
                }
                BatchOp::Delete { key } => {
                    let previous = map.remove(&key);
                    undo.push((key, previous));
                }
            }
        }

        // injection point past the end of the batch fails before returning
        if fail_after.is_some() {
            Self::rollback(&mut map, undo);
            return Err(Self::injected_failure(total));
        }
        Ok(())
    }

    fn first_key(&self, prefix: &[u8]) -> Result<Option<Vec<u8>>> {
        self.check_online()?;
        let end = prefix_end(prefix);
        let map = self.map.read();
        let first = map
            .range::<[u8], _>(Self::prefix_bounds(prefix, &end))
            .next()
            .map(|(k, _)| k.clone());
        Ok(first)
    }

    fn last_key(&self, prefix: &[u8]) -> Result<Option<Vec<u8>>> {
        self.check_online()?;
        let end = prefix_end(prefix);
        let map = self.map.read();
        let last = map
            .range::<[u8], _>(Self::prefix_bounds(prefix, &end))
            .next_back()
            .map(|(k, _)| k.clone());
        Ok(last)
    }

    fn key_bounds(&self, prefix: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.check_online()?;
        let end = prefix_end(prefix);
        let map = self.map.read();
        let mut range = map.range::<[u8], _>(Self::prefix_bounds(prefix, &end));
        let first = range.next().map(|(k, _)| k.clone());
        let last = range.next_back().map(|(k, _)| k.clone());
        Ok(first.map(|first| {
            let last = last.unwrap_or_else(|| first.clone());
            (first, last)
        }))
    }

    fn scan(&self, start: &[u8], end: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.check_online()?;
        if start > end {
            return Ok(Vec::new());
        }
        let map = self.map.read();
        Ok(map
            .range::<[u8], _>((Bound::Included(start), Bound::Included(end)))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn scan_keys(&self, start: &[u8], end: &[u8]) -> Result<Vec<Vec<u8>>> {
        self.check_online()?;
        if start > end {
            return Ok(Vec::new());
        }
        let map = self.map.read();
        Ok(map
            .range::<[u8], _>((Bound::Included(start), Bound::Included(end)))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
