//! In-memory storage engine for testing.

use crate::config::DEFAULT_NAMESPACE;
use crate::engine::{KvStats, StorageEngine, TableBounds};
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;
use std::collections::{BTreeMap, VecDeque};

/// An in-memory storage engine.
///
/// This engine keeps the key-value tier and every ancient table in memory
/// and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral stores that don't need persistence
///
/// The population methods ([`insert`](Self::insert),
/// [`append_ancient`](Self::append_ancient), ...) belong to the engine
/// itself and are not part of [`StorageEngine`].
///
/// # Example
///
/// ```rust
/// use ancientkv_storage::{InMemoryEngine, StorageEngine};
///
/// let engine = InMemoryEngine::new();
/// engine.insert(b"k1", b"v1");
/// engine.append_ancient("headers", b"genesis");
///
/// assert_eq!(engine.get(b"k1").unwrap(), Some(b"v1".to_vec()));
/// assert_eq!(engine.read_item("headers", 0).unwrap(), b"genesis");
/// ```
#[derive(Debug)]
pub struct InMemoryEngine {
    namespace: String,
    state: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    kv: BTreeMap<Vec<u8>, Vec<u8>>,
    tables: BTreeMap<String, MemoryTable>,
    closed: bool,
}

#[derive(Debug, Default)]
struct MemoryTable {
    tail: u64,
    items: VecDeque<Vec<u8>>,
}

impl MemoryTable {
    fn bounds(&self) -> TableBounds {
        TableBounds::new(self.tail, self.tail + self.items.len() as u64)
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEngine {
    /// Creates a new empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    /// Creates a new empty engine reporting statistics under `namespace`.
    #[must_use]
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            state: RwLock::new(MemoryState::default()),
        }
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn insert(&self, key: &[u8], value: &[u8]) {
        self.state.write().kv.insert(key.to_vec(), value.to_vec());
    }

    /// Removes `key`.
    pub fn remove(&self, key: &[u8]) {
        self.state.write().kv.remove(key);
    }

    /// Creates an empty table whose first index will be `tail`.
    ///
    /// Has no effect if the table already exists.
    pub fn create_table(&self, kind: &str, tail: u64) {
        self.state
            .write()
            .tables
            .entry(kind.to_string())
            .or_insert_with(|| MemoryTable {
                tail,
                items: VecDeque::new(),
            });
    }

    /// Appends an item to table `kind`, creating the table at index 0 if
    /// needed. Returns the index of the new item.
    pub fn append_ancient(&self, kind: &str, item: &[u8]) -> u64 {
        let mut state = self.state.write();
        let table = state.tables.entry(kind.to_string()).or_default();
        table.items.push_back(item.to_vec());
        table.tail + table.items.len() as u64 - 1
    }

    /// Drops every item of table `kind` below `tail`.
    pub fn prune_ancient(&self, kind: &str, tail: u64) {
        if let Some(table) = self.state.write().tables.get_mut(kind) {
            while table.tail < tail && !table.items.is_empty() {
                table.items.pop_front();
                table.tail += 1;
            }
        }
    }

    /// Returns true if the engine has been closed.
    pub fn is_closed(&self) -> bool {
        self.state.read().closed
    }
}

fn ensure_open(state: &MemoryState) -> StorageResult<()> {
    if state.closed {
        return Err(StorageError::Closed);
    }
    Ok(())
}

impl StorageEngine for InMemoryEngine {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let state = self.state.read();
        ensure_open(&state)?;
        Ok(state.kv.get(key).cloned())
    }

    fn contains(&self, key: &[u8]) -> StorageResult<bool> {
        let state = self.state.read();
        ensure_open(&state)?;
        Ok(state.kv.contains_key(key))
    }

    fn tables(&self) -> StorageResult<Vec<String>> {
        let state = self.state.read();
        ensure_open(&state)?;
        Ok(state.tables.keys().cloned().collect())
    }

    fn table_bounds(&self, kind: &str) -> StorageResult<TableBounds> {
        let state = self.state.read();
        ensure_open(&state)?;
        state
            .tables
            .get(kind)
            .map(MemoryTable::bounds)
            .ok_or_else(|| StorageError::UnknownTable(kind.to_string()))
    }

    fn read_item(&self, kind: &str, index: u64) -> StorageResult<Vec<u8>> {
        let state = self.state.read();
        ensure_open(&state)?;
        let table = state
            .tables
            .get(kind)
            .ok_or_else(|| StorageError::UnknownTable(kind.to_string()))?;
        if !table.bounds().contains(index) {
            return Err(StorageError::ItemOutOfBounds {
                kind: kind.to_string(),
                index,
            });
        }
        Ok(table.items[(index - table.tail) as usize].clone())
    }

    fn table_size(&self, kind: &str) -> StorageResult<u64> {
        let state = self.state.read();
        ensure_open(&state)?;
        let table = state
            .tables
            .get(kind)
            .ok_or_else(|| StorageError::UnknownTable(kind.to_string()))?;
        Ok(table.items.iter().map(|item| item.len() as u64).sum())
    }

    fn kv_stats(&self) -> StorageResult<KvStats> {
        let state = self.state.read();
        ensure_open(&state)?;
        Ok(KvStats {
            entries: state.kv.len() as u64,
            bytes: state
                .kv
                .iter()
                .map(|(k, v)| (k.len() + v.len()) as u64)
                .sum(),
        })
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn close(&self) -> StorageResult<()> {
        let mut state = self.state.write();
        state.closed = true;
        state.kv.clear();
        state.tables.clear();
        Ok(())
    }
}
