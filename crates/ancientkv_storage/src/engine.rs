//! Storage engine trait definition.

use crate::error::{StorageError, StorageResult};

/// The retained index range `[tail, head)` of an ancient table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableBounds {
    /// Oldest retained index.
    pub tail: u64,
    /// Next index to be written.
    pub head: u64,
}

impl TableBounds {
    /// Creates bounds for `[tail, head)`.
    pub fn new(tail: u64, head: u64) -> Self {
        Self { tail, head }
    }

    /// Returns true if `index` is retained.
    pub fn contains(&self, index: u64) -> bool {
        index >= self.tail && index < self.head
    }

    /// Returns the number of retained items.
    pub fn len(&self) -> u64 {
        self.head.saturating_sub(self.tail)
    }

    /// Returns true if no items are retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Aggregate figures for the key-value tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KvStats {
    /// Number of live keys.
    pub entries: u64,
    /// Total bytes of live keys and values.
    pub bytes: u64,
}

/// An ordered key-value store with an ancient (frozen) tier.
///
/// This is the read surface an engine offers to the rest of the system.
/// Engines may have their own ways of being populated, but nothing here
/// mutates stored data.
///
/// # Invariants
///
/// - `get` returns exactly the bytes last associated with the key
/// - `read_item` returns the item for any index inside `table_bounds`
/// - After `close`, every call fails with [`StorageError::Closed`]
/// - Engines must be `Send + Sync` for concurrent reads
pub trait StorageEngine: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Returns true if `key` is stored.
    fn contains(&self, key: &[u8]) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Returns the names of all ancient tables, sorted.
    fn tables(&self) -> StorageResult<Vec<String>>;

    /// Returns the retained range of table `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::UnknownTable`] if the table does not exist.
    fn table_bounds(&self, kind: &str) -> StorageResult<TableBounds>;

    /// Reads one item from table `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::ItemOutOfBounds`] if `index` is not retained.
    fn read_item(&self, kind: &str, index: u64) -> StorageResult<Vec<u8>>;

    /// Returns the number of bytes table `kind` occupies.
    fn table_size(&self, kind: &str) -> StorageResult<u64>;

    /// Returns aggregate figures for the key-value tier.
    fn kv_stats(&self) -> StorageResult<KvStats>;

    /// Returns the namespace prefix used in reported statistics.
    fn namespace(&self) -> &str;

    /// Returns the directory of the ancient tier, if it lives on disk.
    fn ancient_dir(&self) -> Option<String> {
        None
    }

    /// Releases the engine's resources.
    ///
    /// Closing twice is not an error.
    fn close(&self) -> StorageResult<()>;

    /// Returns the number of items frozen across the whole tier.
    ///
    /// This is the smallest head of all tables, since an item only counts
    /// as frozen once every table holds it.
    fn frozen(&self) -> StorageResult<u64> {
        let mut frozen: Option<u64> = None;
        for kind in self.tables()? {
            let head = self.table_bounds(&kind)?.head;
            frozen = Some(frozen.map_or(head, |f| f.min(head)));
        }
        Ok(frozen.unwrap_or(0))
    }

    /// Returns the oldest index still retained by every table.
    fn tail(&self) -> StorageResult<u64> {
        let mut tail = 0;
        for kind in self.tables()? {
            tail = tail.max(self.table_bounds(&kind)?.tail);
        }
        Ok(tail)
    }

    /// Returns an engine statistic by name.
    ///
    /// Recognised properties are `stats`, `kv.entries`, `kv.bytes`,
    /// `ancient.tables`, `ancient.frozen` and `ancient.tail`. Each may
    /// carry the engine namespace as a prefix.
    fn property(&self, name: &str) -> StorageResult<String> {
        let key = name.strip_prefix(self.namespace()).unwrap_or(name);
        match key {
            "kv.entries" => Ok(self.kv_stats()?.entries.to_string()),
            "kv.bytes" => Ok(self.kv_stats()?.bytes.to_string()),
            "ancient.tables" => Ok(self.tables()?.join(",")),
            "ancient.frozen" => Ok(self.frozen()?.to_string()),
            "ancient.tail" => Ok(self.tail()?.to_string()),
            "stats" => {
                let stats = self.kv_stats()?;
                let mut out = format!(
                    "{ns}kv.entries: {}\n{ns}kv.bytes: {}\n",
                    stats.entries,
                    stats.bytes,
                    ns = self.namespace()
                );
                for kind in self.tables()? {
                    let bounds = self.table_bounds(&kind)?;
                    out.push_str(&format!(
                        "{}ancient.{}: tail={} head={} size={}\n",
                        self.namespace(),
                        kind,
                        bounds.tail,
                        bounds.head,
                        self.table_size(&kind)?
                    ));
                }
                Ok(out)
            }
            _ => Err(StorageError::UnknownProperty(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_contains() {
        let bounds = TableBounds::new(5, 10);
        assert!(!bounds.contains(4));
        assert!(bounds.contains(5));
        assert!(bounds.contains(9));
        assert!(!bounds.contains(10));
        assert_eq!(bounds.len(), 5);
    }

    #[test]
    fn empty_bounds() {
        let bounds = TableBounds::new(3, 3);
        assert!(bounds.is_empty());
        assert!(!bounds.contains(3));
    }
}
