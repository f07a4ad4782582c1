//! durable substrate backed by redb
//!
//! one table of raw byte keys and values. each `write` is one write
//! transaction, each read opens one read transaction, so a read always sees a
//! single committed state.

use std::fs;
use std::ops::Bound;
use std::path::{Path, PathBuf};

use redb::{Database, TableDefinition};
use tracing::{info, warn};

use super::{BatchOp, OrderedStore, WriteBatch};
use crate::config::{StoreConfig, SyncMode};
use crate::error::{Result, StoreError};
use crate::keys::prefix_end;

const KV_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("raft_kv");

/// on-disk ordered store
pub struct RedbStore {
    db: Database,
    path: PathBuf,
    sync_mode: SyncMode,
}

impl RedbStore {
    /// open or create the store file described by `config`
    ///
    /// creates the directory if it doesn't exist
    pub fn open(config: &StoreConfig) -> Result<Self> {
        fs::create_dir_all(&config.dir).map_err(|e| StoreError::open_failed(&config.dir, e))?;

        let path = config.db_path();
        let mut builder = redb::Builder::new();
        builder.set_cache_size(config.cache_size_bytes);
        let db = builder
            .create(&path)
            .map_err(|e| StoreError::open_failed(&path, e))?;

        // make sure the table exists so read transactions can always open it
        let txn = db
            .begin_write()
            .map_err(|e| StoreError::open_failed(&path, e))?;
        txn.open_table(KV_TABLE)
            .map_err(|e| StoreError::open_failed(&path, e))?;
        txn.commit().map_err(|e| StoreError::open_failed(&path, e))?;

        info!("opened redb store at {}", path.display());
        Ok(Self {
            db,
            path,
            sync_mode: config.sync_mode,
        })
    }

    /// location of the store file
    pub fn path(&self) -> &Path {
        &self.path
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

impl OrderedStore for RedbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KV_TABLE)?;
        let value = table.get(key)?.map(|v| v.value().to_vec());
        Ok(value)
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        let mut txn = self.db.begin_write()?;
        txn.set_durability(self.sync_mode.into());
        {
            let mut table = txn.open_table(KV_TABLE)?;
            for op in batch.ops() {
                let applied = match op {
                    BatchOp::Put { key, value } => {
                        table.insert(key.as_slice(), value.as_slice()).map(|_| ())
                    }
                    BatchOp::Delete { key } => table.remove(key.as_slice()).map(|_| ()),
                };
                // dropping the uncommitted transaction aborts the whole batch
                if let Err(e) = applied {
                    warn!("batch write to {} failed: {}", self.path.display(), e);
                    return Err(e.into());
                }
            }
        }
        txn.commit()?;
        Ok(())
    }

    fn first_key(&self, prefix: &[u8]) -> Result<Option<Vec<u8>>> {
        let end = prefix_end(prefix);
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KV_TABLE)?;
        let first = table
            .range::<&[u8]>(Self::prefix_bounds(prefix, &end))?
            .next()
            .transpose()?
            .map(|(k, _)| k.value().to_vec());
        Ok(first)
    }

    fn last_key(&self, prefix: &[u8]) -> Result<Option<Vec<u8>>> {
        let end = prefix_end(prefix);
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KV_TABLE)?;
        let last = table
            .range::<&[u8]>(Self::prefix_bounds(prefix, &end))?
            .next_back()
            .transpose()?
            .map(|(k, _)| k.value().to_vec());
        Ok(last)
    }

    fn key_bounds(&self, prefix: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let end = prefix_end(prefix);
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KV_TABLE)?;
        let mut range = table.range::<&[u8]>(Self::prefix_bounds(prefix, &end))?;

        let first = match range.next().transpose()? {
            Some((k, _)) => k.value().to_vec(),
            None => return Ok(None),
        };
        let last = match range.next_back().transpose()? {
            Some((k, _)) => k.value().to_vec(),
            None => first.clone(),
        };
        Ok(Some((first, last)))
    }

    fn scan(&self, start: &[u8], end: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        if start > end {
            return Ok(Vec::new());
        }
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KV_TABLE)?;
        let pairs = table
            .range::<&[u8]>(start..=end)?
            .map(|item| item.map(|(k, v)| (k.value().to_vec(), v.value().to_vec())))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(pairs)
    }

    fn scan_keys(&self, start: &[u8], end: &[u8]) -> Result<Vec<Vec<u8>>> {
        if start > end {
            return Ok(Vec::new());
        }
        let txn = self.db.begin_read()?;
        let table = txn.open_table(KV_TABLE)?;
        let keys = table
            .range::<&[u8]>(start..=end)?
            .map(|item| item.map(|(k, _)| k.value().to_vec()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}
