//! Flat key-value log.
//!
//! The key-value tier lives in a single append-only file of records:
//!
//! ```text
//! | key_len: u32 BE | key | value_len: u32 BE | value |
//! ```
//!
//! A `value_len` of [`TOMBSTONE`] marks a deletion and carries no value
//! bytes. Later records win over earlier ones.

use crate::error::{StorageError, StorageResult};
use crate::file::FileBackend;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

/// Value length marking a deleted key.
pub const TOMBSTONE: u32 = u32::MAX;

/// Location of a live value inside the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRef {
    /// Offset of the first value byte.
    pub offset: u64,
    /// Length of the value.
    pub len: u32,
}

/// Writer for the key-value log.
#[derive(Debug)]
pub struct KvLog {
    backend: FileBackend,
}

impl KvLog {
    /// Opens or creates the log at `path` for appending.
    pub fn create(path: &Path) -> StorageResult<Self> {
        Ok(Self {
            backend: FileBackend::open_with_create_dirs(path)?,
        })
    }

    /// Appends a record storing `value` under `key`.
    pub fn put(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let value_len = u32::try_from(value.len())
            .ok()
            .filter(|len| *len != TOMBSTONE)
            .ok_or_else(|| StorageError::corrupted("value too large for kv log"))?;
        let mut record = encode_key(key)?;
        record.extend_from_slice(&value_len.to_be_bytes());
        record.extend_from_slice(value);
        self.backend.append(&record)?;
        Ok(())
    }

    /// Appends a deletion record for `key`.
    pub fn delete(&self, key: &[u8]) -> StorageResult<()> {
        let mut record = encode_key(key)?;
        record.extend_from_slice(&TOMBSTONE.to_be_bytes());
        self.backend.append(&record)?;
        Ok(())
    }

    /// Syncs the log to disk.
    pub fn sync(&self) -> StorageResult<()> {
        self.backend.sync()
    }
}

fn encode_key(key: &[u8]) -> StorageResult<Vec<u8>> {
    let key_len =
        u32::try_from(key.len()).map_err(|_| StorageError::corrupted("key too large for kv log"))?;
    let mut record = Vec::with_capacity(8 + key.len());
    record.extend_from_slice(&key_len.to_be_bytes());
    record.extend_from_slice(key);
    Ok(record)
}

/// Scans the log at `path` and returns the location of every live value.
///
/// `buffer_size` is the read buffer used for the scan.
///
/// # Errors
///
/// Returns [`StorageError::Corrupted`] if the log ends inside a record.
pub fn scan(path: &Path, buffer_size: usize) -> StorageResult<BTreeMap<Vec<u8>, ValueRef>> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut reader = BufReader::with_capacity(buffer_size, file);
    let mut index = BTreeMap::new();
    let mut offset = 0u64;

    while let Some(key_len) = read_len_or_eof(&mut reader, offset)? {
        if offset + 8 + u64::from(key_len) > file_len {
            return Err(truncated(offset));
        }
        let mut key = vec![0u8; key_len as usize];
        read_exact(&mut reader, &mut key, offset)?;
        let value_len = read_len_or_eof(&mut reader, offset)?
            .ok_or_else(|| truncated(offset))?;
        let value_offset = offset + 8 + u64::from(key_len);

        if value_len == TOMBSTONE {
            index.remove(&key);
            offset = value_offset;
            continue;
        }

        let end = value_offset + u64::from(value_len);
        if end > file_len {
            return Err(truncated(offset));
        }
        reader.seek_relative(i64::from(value_len))?;
        index.insert(
            key,
            ValueRef {
                offset: value_offset,
                len: value_len,
            },
        );
        offset = end;
    }

    Ok(index)
}

fn truncated(offset: u64) -> StorageError {
    StorageError::corrupted(format!("kv log truncated in record at offset {offset}"))
}

fn read_exact(reader: &mut impl Read, buf: &mut [u8], record: u64) -> StorageResult<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => truncated(record),
        _ => StorageError::Io(e),
    })
}

fn read_len_or_eof(reader: &mut impl Read, record: u64) -> StorageResult<Option<u32>> {
    let mut buf = [0u8; 4];
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    match filled {
        0 => Ok(None),
        4 => Ok(Some(u32::from_be_bytes(buf))),
        _ => Err(truncated(record)),
    }
}
