//! Read-only backend over a storage engine.

use crate::error::ServerResult;
use ancientkv_core::{
    empty_iterator, AncientReaderOp, AncientStore, AncientWriteOp, Batch, Capability, Database,
    DbError, DbResult, KeyValueReader, KeyValueStore, KeyValueWriter, KvIterator, Snapshot,
};
use ancientkv_storage::{FileEngine, StorageConfig, StorageEngine, StorageError, TableBounds};
use std::sync::Arc;

/// The server-side [`Database`] implementation.
///
/// Reads are forwarded to the engine. Every write, maintenance and
/// lifecycle call fails with [`DbError::WriteNotAllowed`] (or returns an
/// absent batch / empty iterator) without touching the engine, whatever
/// the engine itself would allow.
///
/// The backend owns the process's single engine handle. `close` is one of
/// the rejected calls; the service releases the handle on shutdown
/// through a crate-internal path.
pub struct Backend {
    engine: Arc<dyn StorageEngine>,
}

impl Backend {
    /// Wraps an already opened engine.
    pub fn new(engine: Arc<dyn StorageEngine>) -> Self {
        Self { engine }
    }

    /// Opens the on-disk store described by `config`.
    pub fn open(config: &StorageConfig) -> ServerResult<Self> {
        let engine = FileEngine::open(config)?;
        Ok(Self::new(Arc::new(engine)))
    }

    /// Releases the engine handle. Only the service shutdown path calls this.
    pub(crate) fn release(&self) -> ServerResult<()> {
        self.engine.close()?;
        Ok(())
    }

    fn reject(&self, operation: Capability) -> DbError {
        tracing::warn!(?operation, "rejected write on read-only backend");
        DbError::WriteNotAllowed
    }
}

impl KeyValueReader for Backend {
    fn has(&self, key: &[u8]) -> DbResult<bool> {
        Ok(self.engine.contains(key)?)
    }

    fn get(&self, key: &[u8]) -> DbResult<Vec<u8>> {
        self.engine.get(key)?.ok_or(DbError::NotFound)
    }
}

impl KeyValueWriter for Backend {
    fn put(&self, _key: &[u8], _value: &[u8]) -> DbResult<()> {
        Err(self.reject(Capability::Put))
    }

    fn delete(&self, _key: &[u8]) -> DbResult<()> {
        Err(self.reject(Capability::Delete))
    }
}

impl KeyValueStore for Backend {
    fn stat(&self, property: &str) -> DbResult<String> {
        Ok(self.engine.property(property)?)
    }

    fn compact(&self, _start: Option<&[u8]>, _limit: Option<&[u8]>) -> DbResult<()> {
        Err(self.reject(Capability::Compact))
    }

    fn new_batch(&self) -> Option<Box<dyn Batch>> {
        None
    }

    fn new_batch_with_size(&self, _size: usize) -> Option<Box<dyn Batch>> {
        None
    }

    fn new_iterator(&self, _prefix: &[u8], _start: &[u8]) -> KvIterator {
        empty_iterator()
    }

    fn new_snapshot(&self) -> DbResult<Box<dyn Snapshot>> {
        Err(self.reject(Capability::NewSnapshot))
    }
}

impl AncientReaderOp for Backend {
    fn has_ancient(&self, kind: &str, number: u64) -> DbResult<bool> {
        match self.engine.table_bounds(kind) {
            Ok(bounds) => Ok(bounds.contains(number)),
            Err(StorageError::UnknownTable(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn ancient(&self, kind: &str, number: u64) -> DbResult<Vec<u8>> {
        let bounds = self.engine.table_bounds(kind)?;
        check_tail(kind, number, bounds)?;
        if number >= bounds.head {
            return Err(DbError::NotFound);
        }
        Ok(self.engine.read_item(kind, number)?)
    }

    fn ancient_range(
        &self,
        kind: &str,
        start: u64,
        count: u64,
        max_bytes: u64,
    ) -> DbResult<Vec<Vec<u8>>> {
        let bounds = self.engine.table_bounds(kind)?;
        collect_range(kind, bounds, start, count, max_bytes, |number| {
            Ok(self.engine.read_item(kind, number)?)
        })
    }

    fn ancients(&self) -> DbResult<u64> {
        Ok(self.engine.frozen()?)
    }

    fn tail(&self) -> DbResult<u64> {
        Ok(self.engine.tail()?)
    }

    fn ancient_size(&self, kind: &str) -> DbResult<u64> {
        Ok(self.engine.table_size(kind)?)
    }
}

fn check_tail(kind: &str, number: u64, bounds: TableBounds) -> DbResult<()> {
    if number < bounds.tail {
        return Err(DbError::OutOfRange {
            kind: kind.to_string(),
            index: number,
            tail: bounds.tail,
        });
    }
    Ok(())
}

/// Reads consecutive items from `start` until `count` items are collected,
/// the head is reached, or the next item would push the total size past
/// `max_bytes`. The first item is always taken.
fn collect_range(
    kind: &str,
    bounds: TableBounds,
    start: u64,
    count: u64,
    max_bytes: u64,
    mut read: impl FnMut(u64) -> DbResult<Vec<u8>>,
) -> DbResult<Vec<Vec<u8>>> {
    check_tail(kind, start, bounds)?;
    if start >= bounds.head || count == 0 {
        return Ok(Vec::new());
    }

    let end = bounds.head.min(start.saturating_add(count));
    let mut items = Vec::new();
    let mut total = 0u64;
    for number in start..end {
        let item = read(number)?;
        let size = item.len() as u64;
        if !items.is_empty() && total.saturating_add(size) > max_bytes {
            break;
        }
        total = total.saturating_add(size);
        items.push(item);
    }
    Ok(items)
}

impl AncientStore for Backend {
    fn read_ancients(
        &self,
        f: &mut dyn FnMut(&dyn AncientReaderOp) -> DbResult<()>,
    ) -> DbResult<()> {
        f(self)
    }

    fn modify_ancients(
        &self,
        _f: &mut dyn FnMut(&mut dyn AncientWriteOp) -> DbResult<()>,
    ) -> DbResult<i64> {
        Err(self.reject(Capability::ModifyAncients))
    }

    fn truncate_head(&self, _n: u64) -> DbResult<u64> {
        Err(self.reject(Capability::TruncateHead))
    }

    fn truncate_tail(&self, _n: u64) -> DbResult<u64> {
        Err(self.reject(Capability::TruncateTail))
    }

    fn sync(&self) -> DbResult<()> {
        Err(self.reject(Capability::Sync))
    }

    fn migrate_table(
        &self,
        _kind: &str,
        _convert: &mut dyn FnMut(&[u8]) -> DbResult<Vec<u8>>,
    ) -> DbResult<()> {
        Err(self.reject(Capability::MigrateTable))
    }

    fn ancient_datadir(&self) -> DbResult<String> {
        Err(self.reject(Capability::AncientDatadir))
    }
}

impl Database for Backend {
    fn close(&self) -> DbResult<()> {
        Err(self.reject(Capability::Close))
    }
}
