//! Storage configuration.

use std::path::{Path, PathBuf};

/// Default storage namespace, used as the prefix of reported statistics.
pub const DEFAULT_NAMESPACE: &str = "eth/db/chaindata/";

/// Default number of file handles the store may hold open.
pub const DEFAULT_HANDLES: usize = 512;

/// Minimum read buffer used when scanning the key-value log.
pub const MIN_CACHE_SIZE: usize = 16 * 1024;

/// Parameters for opening an on-disk store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Directory holding the key-value log.
    pub path: PathBuf,
    /// In-memory read buffer size in bytes (0 selects the minimum).
    pub cache_size: usize,
    /// Maximum number of file handles the store may open.
    pub handles: usize,
    /// Directory holding the ancient tables. Defaults to `<path>/ancient`.
    pub ancient_path: Option<PathBuf>,
    /// Namespace prefix for reported statistics.
    pub namespace: String,
}

impl StorageConfig {
    /// Creates a configuration for the store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache_size: 0,
            handles: DEFAULT_HANDLES,
            ancient_path: None,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Sets the read buffer size.
    pub fn with_cache_size(mut self, bytes: usize) -> Self {
        self.cache_size = bytes;
        self
    }

    /// Sets the file handle allowance.
    pub fn with_handles(mut self, handles: usize) -> Self {
        self.handles = handles;
        self
    }

    /// Sets the ancient table directory.
    pub fn with_ancient_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ancient_path = Some(path.into());
        self
    }

    /// Sets the statistics namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Returns the directory of the ancient tables.
    pub fn ancient_dir(&self) -> PathBuf {
        self.ancient_path
            .clone()
            .unwrap_or_else(|| self.path.join("ancient"))
    }

    /// Returns the path of the key-value log.
    pub fn kv_log_path(&self) -> PathBuf {
        kv_log_path(&self.path)
    }

    /// Returns the effective read buffer size.
    pub fn buffer_size(&self) -> usize {
        self.cache_size.max(MIN_CACHE_SIZE)
    }
}

/// Returns the key-value log path inside a store directory.
pub fn kv_log_path(dir: &Path) -> PathBuf {
    dir.join("kv.log")
}
