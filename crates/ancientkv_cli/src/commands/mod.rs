//! CLI command implementations.

pub mod inspect;
pub mod serve;

use ancientkv_storage::{StorageConfig, DEFAULT_HANDLES, DEFAULT_NAMESPACE};
use clap::Args;
use std::path::PathBuf;

/// Location and tuning of the on-disk store.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Store directory holding the key-value log
    #[arg(long, env = "LEVELDB_PATH")]
    pub leveldb_path: PathBuf,

    /// Read buffer size in bytes (0 selects the minimum)
    #[arg(long, env = "LEVELDB_CACHE_SIZE", default_value_t = 0)]
    pub leveldb_cache_size: usize,

    /// Maximum number of file handles the store may open
    #[arg(long, env = "LEVELDB_HANDLES", default_value_t = DEFAULT_HANDLES)]
    pub leveldb_handles: usize,

    /// Ancient table directory [default: <leveldb-path>/ancient]
    #[arg(long, env = "LEVELDB_ANCIENT_PATH")]
    pub leveldb_ancient_path: Option<PathBuf>,

    /// Namespace prefix for reported statistics
    #[arg(long, env = "LEVELDB_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    pub leveldb_namespace: String,
}

impl StoreArgs {
    /// Builds the storage configuration.
    pub fn storage_config(&self) -> StorageConfig {
        let mut config = StorageConfig::new(&self.leveldb_path)
            .with_cache_size(self.leveldb_cache_size)
            .with_handles(self.leveldb_handles)
            .with_namespace(self.leveldb_namespace.clone());
        if let Some(ancient) = &self.leveldb_ancient_path {
            config = config.with_ancient_path(ancient);
        }
        config
    }
}
