//! The storage capability contract.
//!
//! [`Database`] is the full interface a store handle exposes: key-value
//! reads and writes, ancient-tier reads and writes, and lifecycle calls.
//! Every implementer must provide all of it, including the write half,
//! so a read-only implementer rejects writes explicitly instead of
//! leaving them out.

use crate::error::DbResult;

/// Iterator over key-value pairs.
pub type KvIterator = Box<dyn Iterator<Item = DbResult<(Vec<u8>, Vec<u8>)>> + Send>;

/// Returns an iterator that yields nothing.
pub fn empty_iterator() -> KvIterator {
    Box::new(std::iter::empty())
}

/// Read access to the key-value tier.
pub trait KeyValueReader {
    /// Returns true if `key` is present.
    fn has(&self, key: &[u8]) -> DbResult<bool>;

    /// Returns the value stored under `key`.
    ///
    /// Fails with [`crate::DbError::NotFound`] if the key is absent.
    fn get(&self, key: &[u8]) -> DbResult<Vec<u8>>;
}

/// Write access to the key-value tier.
pub trait KeyValueWriter {
    /// Stores `value` under `key`.
    fn put(&self, key: &[u8], value: &[u8]) -> DbResult<()>;

    /// Removes `key`.
    fn delete(&self, key: &[u8]) -> DbResult<()>;
}

/// A write-only batch of key-value changes.
pub trait Batch: KeyValueWriter + Send {
    /// Returns the amount of data queued.
    fn value_size(&self) -> usize;

    /// Flushes the queued changes to the store.
    fn write(&self) -> DbResult<()>;

    /// Discards the queued changes.
    fn reset(&mut self);
}

/// A point-in-time read view of the key-value tier.
pub trait Snapshot: KeyValueReader + Send + Sync {
    /// Releases the snapshot.
    fn release(&self);
}

/// The key-value tier, including its batch, iteration and maintenance calls.
pub trait KeyValueStore: KeyValueReader + KeyValueWriter {
    /// Returns an engine statistic.
    fn stat(&self, property: &str) -> DbResult<String>;

    /// Compacts the key range `[start, limit)`; `None` is unbounded.
    fn compact(&self, start: Option<&[u8]>, limit: Option<&[u8]>) -> DbResult<()>;

    /// Creates a write batch, if the implementer supports batching.
    fn new_batch(&self) -> Option<Box<dyn Batch>>;

    /// Creates a write batch with a preallocated size.
    fn new_batch_with_size(&self, size: usize) -> Option<Box<dyn Batch>>;

    /// Iterates keys with `prefix`, starting at `prefix + start`.
    fn new_iterator(&self, prefix: &[u8], start: &[u8]) -> KvIterator;

    /// Takes a snapshot of the key-value tier.
    fn new_snapshot(&self) -> DbResult<Box<dyn Snapshot>>;
}

/// Read access to the ancient tier.
pub trait AncientReaderOp {
    /// Returns true if item `number` of table `kind` is retained.
    fn has_ancient(&self, kind: &str, number: u64) -> DbResult<bool>;

    /// Returns item `number` of table `kind`.
    fn ancient(&self, kind: &str, number: u64) -> DbResult<Vec<u8>>;

    /// Returns up to `count` consecutive items of table `kind` starting at
    /// `start`, stopping before the total size would exceed `max_bytes`.
    /// At least one item is returned if `start` is retained.
    fn ancient_range(
        &self,
        kind: &str,
        start: u64,
        count: u64,
        max_bytes: u64,
    ) -> DbResult<Vec<Vec<u8>>>;

    /// Returns the number of items frozen in the ancient tier.
    fn ancients(&self) -> DbResult<u64>;

    /// Returns the oldest retained index of the ancient tier.
    fn tail(&self) -> DbResult<u64>;

    /// Returns the bytes occupied by table `kind`.
    fn ancient_size(&self, kind: &str) -> DbResult<u64>;
}

/// Write access handed to a [`AncientStore::modify_ancients`] callback.
pub trait AncientWriteOp {
    /// Appends `item` as number `number` of table `kind`.
    fn append(&mut self, kind: &str, number: u64, item: &[u8]) -> DbResult<()>;
}

/// The ancient tier, including its write and maintenance calls.
pub trait AncientStore: AncientReaderOp {
    /// Runs `f` against a read-only view of the ancient tier.
    fn read_ancients(
        &self,
        f: &mut dyn FnMut(&dyn AncientReaderOp) -> DbResult<()>,
    ) -> DbResult<()>;

    /// Runs `f` with write access, returning the bytes written.
    fn modify_ancients(
        &self,
        f: &mut dyn FnMut(&mut dyn AncientWriteOp) -> DbResult<()>,
    ) -> DbResult<i64>;

    /// Discards items from `n` onwards, returning the old head.
    fn truncate_head(&self, n: u64) -> DbResult<u64>;

    /// Discards items below `n`, returning the old tail.
    fn truncate_tail(&self, n: u64) -> DbResult<u64>;

    /// Flushes the ancient tier to disk.
    fn sync(&self) -> DbResult<()>;

    /// Rewrites every item of table `kind` through `convert`.
    fn migrate_table(
        &self,
        kind: &str,
        convert: &mut dyn FnMut(&[u8]) -> DbResult<Vec<u8>>,
    ) -> DbResult<()>;

    /// Returns the directory of the ancient tier.
    fn ancient_datadir(&self) -> DbResult<String>;
}

/// A complete store handle.
pub trait Database: KeyValueStore + AncientStore + Send + Sync {
    /// Closes the handle.
    fn close(&self) -> DbResult<()>;
}

/// One operation of the [`Database`] contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Capability {
    Has,
    Get,
    HasAncient,
    Ancient,
    AncientRange,
    ReadAncients,
    Ancients,
    Tail,
    AncientSize,
    Stat,
    Put,
    Delete,
    ModifyAncients,
    TruncateHead,
    TruncateTail,
    Sync,
    Compact,
    NewBatch,
    NewBatchWithSize,
    NewIterator,
    NewSnapshot,
    MigrateTable,
    AncientDatadir,
    Close,
}

impl Capability {
    /// Every operation of the contract.
    pub const ALL: [Capability; 24] = [
        Capability::Has,
        Capability::Get,
        Capability::HasAncient,
        Capability::Ancient,
        Capability::AncientRange,
        Capability::ReadAncients,
        Capability::Ancients,
        Capability::Tail,
        Capability::AncientSize,
        Capability::Stat,
        Capability::Put,
        Capability::Delete,
        Capability::ModifyAncients,
        Capability::TruncateHead,
        Capability::TruncateTail,
        Capability::Sync,
        Capability::Compact,
        Capability::NewBatch,
        Capability::NewBatchWithSize,
        Capability::NewIterator,
        Capability::NewSnapshot,
        Capability::MigrateTable,
        Capability::AncientDatadir,
        Capability::Close,
    ];

    /// Returns true for operations that mutate the store or manage its
    /// resources. These are never forwarded or executed.
    pub fn is_write(self) -> bool {
        !matches!(
            self,
            Capability::Has
                | Capability::Get
                | Capability::HasAncient
                | Capability::Ancient
                | Capability::AncientRange
                | Capability::ReadAncients
                | Capability::Ancients
                | Capability::Tail
                | Capability::AncientSize
                | Capability::Stat
        )
    }
}
