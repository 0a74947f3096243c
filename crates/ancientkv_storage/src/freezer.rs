//! Ancient (frozen) tables.
//!
//! Each table kind is stored as two files in the ancient directory:
//!
//! - `<kind>.idx`: a 16-byte header `| tail: u64 | base: u64 |` followed by
//!   one `u64` end offset per retained item
//! - `<kind>.dat`: the item bytes, back to back, starting at `base`
//!
//! All integers are big-endian. Item `i` spans from the end offset of item
//! `i - 1` (or `base` for the tail item) to its own end offset.

use crate::engine::TableBounds;
use crate::error::{StorageError, StorageResult};
use crate::file::FileBackend;
use std::path::{Path, PathBuf};

/// Length of the index file header.
pub const INDEX_HEADER_LEN: u64 = 16;

const ENTRY_LEN: u64 = 8;

/// One ancient table.
#[derive(Debug)]
pub struct FreezerTable {
    kind: String,
    index: FileBackend,
    data: FileBackend,
    tail: u64,
    base: u64,
}

impl FreezerTable {
    /// Opens or creates table `kind` in `dir` for appending.
    ///
    /// A new table starts at index `tail`; for an existing table the
    /// stored tail is kept and `tail` is ignored.
    pub fn create(dir: &Path, kind: &str, tail: u64) -> StorageResult<Self> {
        let index = FileBackend::open_with_create_dirs(&index_path(dir, kind))?;
        let data = FileBackend::open_with_create_dirs(&data_path(dir, kind))?;
        if index.size() == 0 {
            let mut header = Vec::with_capacity(INDEX_HEADER_LEN as usize);
            header.extend_from_slice(&tail.to_be_bytes());
            header.extend_from_slice(&data.size().to_be_bytes());
            index.append(&header)?;
        }
        Self::from_files(kind, index, data)
    }

    /// Opens an existing table read-only.
    pub fn open(dir: &Path, kind: &str) -> StorageResult<Self> {
        let index = FileBackend::open_read_only(&index_path(dir, kind))?;
        let data = FileBackend::open_read_only(&data_path(dir, kind))?;
        Self::from_files(kind, index, data)
    }

    fn from_files(kind: &str, index: FileBackend, data: FileBackend) -> StorageResult<Self> {
        let size = index.size();
        if size < INDEX_HEADER_LEN || (size - INDEX_HEADER_LEN) % ENTRY_LEN != 0 {
            return Err(StorageError::corrupted(format!(
                "index of table {kind} has invalid size {size}"
            )));
        }
        let tail = index.read_u64_at(0)?;
        let base = index.read_u64_at(8)?;
        if tail.checked_add((size - INDEX_HEADER_LEN) / ENTRY_LEN).is_none() {
            return Err(StorageError::corrupted(format!(
                "table {kind} tail {tail} overflows its head"
            )));
        }
        Ok(Self {
            kind: kind.to_string(),
            index,
            data,
            tail,
            base,
        })
    }

    /// Returns the table kind.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the retained range of the table.
    pub fn bounds(&self) -> TableBounds {
        let items = (self.index.size() - INDEX_HEADER_LEN) / ENTRY_LEN;
        TableBounds::new(self.tail, self.tail.saturating_add(items))
    }

    /// Returns the bytes the table occupies on disk.
    pub fn size(&self) -> u64 {
        self.index.size() + self.data.size()
    }

    /// Appends an item, returning its index.
    pub fn append(&self, item: &[u8]) -> StorageResult<u64> {
        let number = self.bounds().head;
        self.data.append(item)?;
        self.index.append(&self.data.size().to_be_bytes())?;
        Ok(number)
    }

    /// Reads the item at `number`.
    pub fn read(&self, number: u64) -> StorageResult<Vec<u8>> {
        if !self.bounds().contains(number) {
            return Err(StorageError::ItemOutOfBounds {
                kind: self.kind.clone(),
                index: number,
            });
        }
        let pos = number - self.tail;
        let start = if pos == 0 {
            self.base
        } else {
            self.index
                .read_u64_at(INDEX_HEADER_LEN + (pos - 1) * ENTRY_LEN)?
        };
        let end = self.index.read_u64_at(INDEX_HEADER_LEN + pos * ENTRY_LEN)?;
        if end < start {
            return Err(StorageError::corrupted(format!(
                "item {number} of table {} ends before it starts",
                self.kind
            )));
        }
        self.data.read_at(start, (end - start) as usize)
    }

    /// Syncs both files to disk.
    pub fn sync(&self) -> StorageResult<()> {
        self.index.sync()?;
        self.data.sync()
    }
}

fn index_path(dir: &Path, kind: &str) -> PathBuf {
    dir.join(format!("{kind}.idx"))
}

fn data_path(dir: &Path, kind: &str) -> PathBuf {
    dir.join(format!("{kind}.dat"))
}

/// Lists the table kinds present in `dir`, sorted.
///
/// A missing directory holds no tables.
pub fn table_kinds(dir: &Path) -> StorageResult<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut kinds = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("idx") {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            kinds.push(stem.to_string());
        }
    }
    kinds.sort();
    Ok(kinds)
}
