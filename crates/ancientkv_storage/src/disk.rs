//! On-disk storage engine.

use crate::config::StorageConfig;
use crate::engine::{KvStats, StorageEngine, TableBounds};
use crate::error::{StorageError, StorageResult};
use crate::file::FileBackend;
use crate::freezer::{table_kinds, FreezerTable};
use crate::kvlog::{self, ValueRef};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// A read-only engine over a store directory.
///
/// Opening scans the key-value log once to locate every live value; values
/// themselves stay on disk and are read on demand. Every file is opened
/// read-only, so the engine cannot modify the store.
///
/// # Example
///
/// ```no_run
/// use ancientkv_storage::{FileEngine, StorageConfig, StorageEngine};
///
/// let engine = FileEngine::open(&StorageConfig::new("/var/lib/chaindata")).unwrap();
/// let frozen = engine.frozen().unwrap();
/// ```
#[derive(Debug)]
pub struct FileEngine {
    namespace: String,
    ancient_dir: String,
    state: RwLock<Option<DiskState>>,
}

#[derive(Debug)]
struct DiskState {
    log: FileBackend,
    index: BTreeMap<Vec<u8>, ValueRef>,
    tables: BTreeMap<String, FreezerTable>,
}

impl FileEngine {
    /// Opens the store described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key-value log is missing or corrupted, an
    /// ancient table cannot be opened, or the store needs more file
    /// handles than `config.handles` allows.
    pub fn open(config: &StorageConfig) -> StorageResult<Self> {
        let log_path = config.kv_log_path();
        let ancient_dir = config.ancient_dir();
        let kinds = table_kinds(&ancient_dir)?;

        // One handle for the log, two per table.
        let needed = 1 + kinds.len() * 2;
        if needed > config.handles {
            return Err(StorageError::HandleLimit {
                needed,
                allowed: config.handles,
            });
        }

        let index = kvlog::scan(&log_path, config.buffer_size())?;
        let log = FileBackend::open_read_only(&log_path)?;

        let mut tables = BTreeMap::new();
        for kind in kinds {
            let table = FreezerTable::open(&ancient_dir, &kind)?;
            tracing::debug!(kind = %kind, bounds = ?table.bounds(), "opened ancient table");
            tables.insert(kind, table);
        }

        tracing::info!(
            path = %config.path.display(),
            keys = index.len(),
            tables = tables.len(),
            "opened store"
        );

        Ok(Self {
            namespace: config.namespace.clone(),
            ancient_dir: ancient_dir.display().to_string(),
            state: RwLock::new(Some(DiskState { log, index, tables })),
        })
    }

    fn with_state<T>(&self, f: impl FnOnce(&DiskState) -> StorageResult<T>) -> StorageResult<T> {
        let state = self.state.read();
        let state = state.as_ref().ok_or(StorageError::Closed)?;
        f(state)
    }
}

impl DiskState {
    fn table(&self, kind: &str) -> StorageResult<&FreezerTable> {
        self.tables
            .get(kind)
            .ok_or_else(|| StorageError::UnknownTable(kind.to_string()))
    }
}

impl StorageEngine for FileEngine {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.with_state(|state| match state.index.get(key) {
            Some(value) => Ok(Some(state.log.read_at(value.offset, value.len as usize)?)),
            None => Ok(None),
        })
    }

    fn contains(&self, key: &[u8]) -> StorageResult<bool> {
        self.with_state(|state| Ok(state.index.contains_key(key)))
    }

    fn tables(&self) -> StorageResult<Vec<String>> {
        self.with_state(|state| Ok(state.tables.keys().cloned().collect()))
    }

    fn table_bounds(&self, kind: &str) -> StorageResult<TableBounds> {
        self.with_state(|state| Ok(state.table(kind)?.bounds()))
    }

    fn read_item(&self, kind: &str, index: u64) -> StorageResult<Vec<u8>> {
        self.with_state(|state| state.table(kind)?.read(index))
    }

    fn table_size(&self, kind: &str) -> StorageResult<u64> {
        self.with_state(|state| Ok(state.table(kind)?.size()))
    }

    fn kv_stats(&self) -> StorageResult<KvStats> {
        self.with_state(|state| {
            Ok(KvStats {
                entries: state.index.len() as u64,
                bytes: state
                    .index
                    .iter()
                    .map(|(k, v)| k.len() as u64 + u64::from(v.len))
                    .sum(),
            })
        })
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn ancient_dir(&self) -> Option<String> {
        Some(self.ancient_dir.clone())
    }

    fn close(&self) -> StorageResult<()> {
        if self.state.write().take().is_some() {
            tracing::info!(namespace = %self.namespace, "closed store");
        }
        Ok(())
    }
}
