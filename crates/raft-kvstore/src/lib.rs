//! # raft-kvstore
//!
//! why: durable persistence for raft state on top of an ordered key-value engine
//! relations: stores raft-log entries, used by the consensus layer for log and term/vote state
//! what: LogStore and StableStore traits, their KV-backed implementations, the substrate they share
//!
//! ```text
//!   consensus logic
//!     │            │
//!     ▼            ▼
//! KvLogStore   KvStableStore      'L' | index BE      'S' | key
//!     │            │
//!     └─────┬──────┘
//!           ▼
//!     OrderedStore  (RedbStore on disk, MemoryStore for tests)
//! ```

pub mod config;
pub mod error;
pub mod keys;
pub mod log_store;
pub mod stable_store;
pub mod substrate;

use std::sync::Arc;

use tracing::info;

pub use config::{StoreConfig, SyncMode};
pub use error::{Result, StoreError};
pub use log_store::{KvLogStore, LogStore};
pub use raft_log::{LogEntry, LogType};
pub use stable_store::{KvStableStore, StableStore};
pub use substrate::{MemoryStore, OrderedStore, RedbStore, WriteBatch};

/// open one physical store and hand out a log store and a stable store sharing it
///
/// the two use disjoint key namespaces. closing either one leaves the other
/// usable; the file is released once both are closed and dropped.
pub fn open(config: &StoreConfig) -> Result<(KvLogStore<RedbStore>, KvStableStore<RedbStore>)> {
    let substrate = Arc::new(RedbStore::open(config)?);
    info!("sharing {} between log and stable store", config.db_path().display());
    Ok((
        KvLogStore::new(substrate.clone()),
        KvStableStore::new(substrate),
    ))
}
