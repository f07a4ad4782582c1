//! # config
//!
//! why: where and how durably the substrate keeps its files
//! relations: consumed by RedbStore::open and crate::open
//! what: StoreConfig, SyncMode, StoreConfigBuilder, json loading

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// file name used when log and stable state share one physical store
pub const DEFAULT_FILE_NAME: &str = "raft.redb";

/// when a committed batch is forced to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// fsync before a write returns (crash-safe once the call succeeds)
    #[default]
    Immediate,
    /// let the engine persist on a later commit; a crash may lose recent writes
    Eventual,
}

impl From<SyncMode> for redb::Durability {
    fn from(mode: SyncMode) -> Self {
        match mode {
            SyncMode::Immediate => redb::Durability::Immediate,
            SyncMode::Eventual => redb::Durability::Eventual,
        }
    }
}

/// configuration for an on-disk store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// directory holding the store file, created on open if missing
    pub dir: PathBuf,

    /// name of the store file inside `dir`
    pub file_name: String,

    /// durability of committed batches
    pub sync_mode: SyncMode,

    /// page cache handed to the engine (bytes)
    pub cache_size_bytes: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./raft_data"),
            file_name: DEFAULT_FILE_NAME.to_string(),
            sync_mode: SyncMode::Immediate,
            cache_size_bytes: 64 * 1024 * 1024, // 64 MB
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// default config rooted at `dir`
    pub fn for_dir(dir: impl Into<PathBuf>) -> Self {
        Self::builder().dir(dir).build()
    }

    /// full path of the store file
    pub fn db_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// parse a json document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| StoreError::open_failed("<config>", format!("invalid config: {}", e)))
    }

    /// read and parse a json config file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| StoreError::open_failed(path, e))?;
        serde_json::from_str(&contents)
            .map_err(|e| StoreError::open_failed(path, format!("invalid config: {}", e)))
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the directory holding the store file
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.dir = dir.into();
        self
    }

    /// Set the store file name
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.config.file_name = name.into();
        self
    }

    /// Set the durability of committed batches
    pub fn sync_mode(mut self, mode: SyncMode) -> Self {
        self.config.sync_mode = mode;
        self
    }

    /// Set the engine cache size (in bytes)
    pub fn cache_size_bytes(mut self, bytes: usize) -> Self {
        self.config.cache_size_bytes = bytes;
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
