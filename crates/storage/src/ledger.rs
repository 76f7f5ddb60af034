// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ledger: append-only CSV of every committed set
//!
//! The ledger is the single source of truth for history. Rows are only ever
//! appended; prior bytes are never rewritten. Durability is the caller's
//! decision: `append` leaves bytes in the OS page cache and `sync` makes them
//! durable, so a caller can coalesce many appends into one flush.

use crate::csv::{encode_row, header_line, split_rows, ColumnMap, RawRow};
use crate::fsutil::{copy_atomic, file_size, sync_parent_dir};
use crate::guard::TimestampGuard;
use crate::StorageError;
use setlog_core::SetRecord;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Append handle on the ledger file
pub struct Ledger {
    path: PathBuf,
    file: File,
    guard: TimestampGuard,
    unsynced: bool,
}

impl Ledger {
    /// Open or create the ledger, writing the header when the file is new
    /// or empty
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = Self::open_append(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            guard: TimestampGuard::new(),
            unsynced: false,
        })
    }

    fn open_append(path: &Path) -> Result<File, StorageError> {
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let len = file.metadata()?.len();
        if len == 0 {
            file.write_all(header_line().as_bytes())?;
            file.sync_all()?;
            sync_parent_dir(path)?;
            tracing::info!(path = %path.display(), "created ledger");
        } else {
            // Imported files may lack a final newline
            let mut last = [0u8; 1];
            file.seek(SeekFrom::Start(len - 1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                file.write_all(b"\n")?;
            }
        }
        Ok(file)
    }

    /// Append one record as a single write
    ///
    /// The record's timestamp is first made strictly greater than the last
    /// one appended for the same session. Returns the record as written.
    pub fn append(&mut self, record: SetRecord) -> Result<SetRecord, StorageError> {
        let proposed = record.timestamp();
        let admitted = self.guard.admit(&record.session_id, proposed);
        if admitted != proposed {
            tracing::debug!(
                session_id = %record.session_id,
                %proposed,
                %admitted,
                "bumped colliding ledger timestamp"
            );
        }
        let record = record.with_timestamp(admitted);
        self.file.write_all(encode_row(&record).as_bytes())?;
        self.unsynced = true;
        Ok(record)
    }

    /// Flush file contents and the directory entry to disk
    pub fn sync(&mut self) -> Result<(), StorageError> {
        self.file.sync_all()?;
        sync_parent_dir(&self.path)?;
        self.unsynced = false;
        Ok(())
    }

    /// True when appends happened since the last successful sync
    pub fn has_unsynced_writes(&self) -> bool {
        self.unsynced
    }

    /// Current size of the ledger file in bytes
    pub fn size(&self) -> Result<u64, StorageError> {
        Ok(file_size(&self.path)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record already written for a session
    pub fn session_records(&self, session_id: &str) -> Result<Vec<SetRecord>, StorageError> {
        let scan = read_ledger(&self.path)?;
        Ok(scan
            .records
            .into_iter()
            .filter(|r| r.session_id == session_id)
            .collect())
    }

    /// Replace the whole ledger with another file, e.g. an imported snapshot
    ///
    /// The timestamp guard starts over since the history it tracked is gone.
    pub fn replace_with(&mut self, src: &Path) -> Result<u64, StorageError> {
        if self.unsynced {
            self.sync()?;
        }
        let copied = copy_atomic(src, &self.path)?;
        self.file = Self::open_append(&self.path)?;
        self.guard.reset();
        self.unsynced = false;
        tracing::info!(src = %src.display(), bytes = copied, "ledger replaced");
        Ok(copied)
    }
}

/// Result of reading a whole ledger
#[derive(Debug, Default)]
pub struct LedgerScan {
    pub records: Vec<SetRecord>,
    /// Rows that could not be decoded
    pub skipped: usize,
}

/// Read every record in file order, skipping rows that fail to decode
///
/// Columns are matched by header name, so files with reordered columns
/// still parse. A missing file reads as empty.
pub fn read_ledger(path: &Path) -> Result<LedgerScan, StorageError> {
    let Some(text) = read_text(path)? else {
        return Ok(LedgerScan::default());
    };

    let mut rows = split_rows(&text).into_iter().peekable();
    let map = match rows.peek() {
        Some(first) if ColumnMap::is_header(&first.fields) => {
            let map = ColumnMap::from_header(&first.fields);
            rows.next();
            map
        }
        Some(_) => {
            tracing::warn!(path = %path.display(), "ledger has no header, assuming canonical columns");
            ColumnMap::canonical()
        }
        None => return Ok(LedgerScan::default()),
    };
    Ok(decode_rows(path, &map, rows))
}

/// Read only the records that follow byte `offset`
///
/// Used to catch up on rows appended after a known size. Returns `None`
/// when `offset` is past the end of the file or does not fall on a row
/// boundary; the caller should then read the whole ledger.
pub fn read_ledger_from(path: &Path, offset: u64) -> Result<Option<LedgerScan>, StorageError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let Ok(offset) = usize::try_from(offset) else {
        return Ok(None);
    };
    if offset == 0 || offset > bytes.len() || bytes[offset - 1] != b'\n' {
        return Ok(None);
    }

    let head = String::from_utf8_lossy(&bytes[..offset]);
    let first_line = head.lines().next().unwrap_or_default();
    let header = split_rows(first_line);
    let map = match header.first() {
        Some(row) if ColumnMap::is_header(&row.fields) => ColumnMap::from_header(&row.fields),
        _ => ColumnMap::canonical(),
    };

    let tail = String::from_utf8_lossy(&bytes[offset..]);
    Ok(Some(decode_rows(path, &map, split_rows(&tail).into_iter())))
}

/// Whole-file read that tolerates bytes that are not UTF-8
///
/// Invalid sequences become U+FFFD so one bad field cannot hide the rest
/// of the history.
fn read_text(path: &Path) -> Result<Option<String>, StorageError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    match String::from_utf8(bytes) {
        Ok(text) => Ok(Some(text)),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ledger contains invalid UTF-8, replacing");
            Ok(Some(String::from_utf8_lossy(e.as_bytes()).into_owned()))
        }
    }
}

fn decode_rows(path: &Path, map: &ColumnMap, rows: impl Iterator<Item = RawRow>) -> LedgerScan {
    let mut scan = LedgerScan::default();
    for row in rows {
        match map.decode(&row.fields) {
            Ok(record) => scan.records.push(record),
            Err(reason) => {
                let err = StorageError::MalformedRow {
                    line: row.line,
                    reason,
                };
                tracing::warn!(path = %path.display(), error = %err, "skipping ledger row");
                scan.skipped += 1;
            }
        }
    }
    scan
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
