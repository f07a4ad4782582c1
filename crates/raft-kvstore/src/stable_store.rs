//! # stable_store
//!
//! why: persist the small durable scalars raft needs across restarts (current term, last vote, ...)
//! relations: keys from keys.rs, uint64 encoding from raft-log's codec, bytes kept in an OrderedStore
//! what: StableStore trait, KvStableStore implementation

use std::path::Path;
use std::sync::Arc;

use raft_log::{decode_u64, encode_u64};
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::keys::stable_key;
use crate::substrate::{MemoryStore, OrderedStore, RedbStore, StoreHandle, WriteBatch};

/// file used by [`KvStableStore::open`]
pub const STABLE_FILE_NAME: &str = "stable.redb";

/// trait for named durable values
///
/// the uint64 accessors are an encoding over the byte values: `get` on a key
/// written with `set_u64` returns its 8 big-endian bytes.
pub trait StableStore {
    /// store `value` under `key`, replacing any previous value
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// the value under `key`, `NotFound` if it was never set
    fn get(&self, key: &[u8]) -> Result<Vec<u8>>;

    /// store `value` as 8 big-endian bytes
    fn set_u64(&self, key: &[u8], value: u64) -> Result<()> {
        self.set(key, &encode_u64(value))
    }

    /// read a value written by `set_u64`; any other width is `CorruptValue`
    fn get_u64(&self, key: &[u8]) -> Result<u64> {
        let raw = self.get(key)?;
        decode_u64(&raw).map_err(|e| {
            warn!(
                "stable value {:?} is not a uint64: {}",
                String::from_utf8_lossy(key),
                e
            );
            StoreError::from(e)
        })
    }
}

/// stable store on top of an ordered key-value substrate
pub struct KvStableStore<S = RedbStore> {
    handle: StoreHandle<S>,
}

impl KvStableStore<RedbStore> {
    /// open a stable store with its own store file inside `dir`
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let config = StoreConfig::builder()
            .dir(dir.as_ref())
            .file_name(STABLE_FILE_NAME)
            .build();
        Ok(Self::new(Arc::new(RedbStore::open(&config)?)))
    }
}

impl KvStableStore<MemoryStore> {
    /// stable store kept entirely in memory, for testing
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }
}

impl<S: OrderedStore> KvStableStore<S> {
    /// wrap a (possibly shared) substrate
    pub fn new(substrate: Arc<S>) -> Self {
        Self {
            handle: StoreHandle::new(substrate),
        }
    }

    /// release this store's handle on the substrate
    pub fn close(&self) -> Result<()> {
        self.handle.release()?;
        info!("closed stable store");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_open()
    }
}

impl<S: OrderedStore> StableStore for KvStableStore<S> {
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut batch = WriteBatch::with_capacity(1);
        batch.put(stable_key(key), value);
        self.handle.get()?.write(batch)
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.handle
            .get()?
            .get(&stable_key(key))?
            .ok_or(StoreError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_not_found() {
        let store = KvStableStore::in_memory();
        assert!(matches!(store.get(b"foobar"), Err(StoreError::NotFound)));
        assert!(matches!(store.get_u64(b"foobar"), Err(StoreError::NotFound)));
    }

    #[test]
    fn bytes_and_uint64_share_a_value() {
        let store = KvStableStore::in_memory();
        store.set_u64(b"CurrentTerm", 0x0102).unwrap();

        assert_eq!(store.get(b"CurrentTerm").unwrap(), vec![0, 0, 0, 0, 0, 0, 1, 2]);

        store.set(b"CurrentTerm", &[0, 0, 0, 0, 0, 0, 0, 9]).unwrap();
        assert_eq!(store.get_u64(b"CurrentTerm").unwrap(), 9);
    }

    #[test]
    fn short_value_is_corrupt_for_uint64() {
        let store = KvStableStore::in_memory();
        store.set(b"LastVoteTerm", b"abc").unwrap();

        assert!(matches!(
            store.get_u64(b"LastVoteTerm"),
            Err(StoreError::CorruptValue(_))
        ));
    }

    #[test]
    fn empty_value_is_kept() {
        let store = KvStableStore::in_memory();
        store.set(b"LastVoteCand", b"").unwrap();

        assert_eq!(store.get(b"LastVoteCand").unwrap(), Vec::<u8>::new());
    }
}
