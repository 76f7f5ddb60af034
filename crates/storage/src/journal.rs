// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session write-ahead journal of staged and undone sets
//!
//! One JSON object per line, tagged by `kind`:
//!
//! ```text
//! {"kind":"row","sequence":1,"savedAt":"2026-03-14T10:00:00Z","checksum":...,"sessionId":...}
//! {"kind":"tombstone","sequence":1}
//! ```
//!
//! The journal is advisory: session metadata is the primary recovery source.
//! Readers therefore skip lines they cannot decode instead of failing.

use crate::fsutil::sync_parent_dir;
use crate::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use setlog_core::SetRecord;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// A staged set as written to the journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalRow {
    pub sequence: u64,
    pub saved_at: DateTime<Utc>,
    /// CRC32 of the record's JSON
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<u32>,
    #[serde(flatten)]
    pub record: SetRecord,
}

impl JournalRow {
    pub fn new(sequence: u64, saved_at: DateTime<Utc>, record: SetRecord) -> Self {
        let checksum = Some(record_checksum(&record));
        Self {
            sequence,
            saved_at,
            checksum,
            record,
        }
    }

    /// Rows written without a checksum are trusted
    pub fn verify(&self) -> bool {
        self.checksum
            .map_or(true, |sum| sum == record_checksum(&self.record))
    }
}

fn record_checksum(record: &SetRecord) -> u32 {
    // SetRecord only holds strings, numbers, bools and chrono values, all of
    // which always serialize
    let json = serde_json::to_string(record).unwrap_or_default();
    crc32fast::hash(json.as_bytes())
}

/// One journal line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JournalEntry {
    Row(JournalRow),
    Tombstone { sequence: u64 },
}

impl JournalEntry {
    pub fn sequence(&self) -> u64 {
        match self {
            JournalEntry::Row(row) => row.sequence,
            JournalEntry::Tombstone { sequence } => *sequence,
        }
    }

    pub fn to_line(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(StorageError::from)
    }

    pub fn from_line(line: &str) -> Result<Self, StorageError> {
        serde_json::from_str(line).map_err(StorageError::from)
    }
}

/// Append handle on one session's journal file
pub struct Journal {
    path: PathBuf,
    file: File,
    unsynced: bool,
}

impl Journal {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            unsynced: false,
        })
    }

    fn append(&mut self, entry: &JournalEntry) -> Result<(), StorageError> {
        let mut line = entry.to_line()?;
        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.unsynced = true;
        Ok(())
    }

    pub fn append_row(
        &mut self,
        sequence: u64,
        saved_at: DateTime<Utc>,
        record: SetRecord,
    ) -> Result<(), StorageError> {
        self.append(&JournalEntry::Row(JournalRow::new(sequence, saved_at, record)))
    }

    pub fn append_tombstone(&mut self, sequence: u64) -> Result<(), StorageError> {
        self.append(&JournalEntry::Tombstone { sequence })
    }

    pub fn sync(&mut self) -> Result<(), StorageError> {
        self.file.sync_all()?;
        sync_parent_dir(&self.path)?;
        self.unsynced = false;
        Ok(())
    }

    pub fn has_unsynced_writes(&self) -> bool {
        self.unsynced
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Replay every decodable line in file order
///
/// Lines that fail to parse or fail their checksum are skipped. A missing
/// journal reads as empty.
pub fn read_journal(path: &Path) -> Result<Vec<JournalEntry>, StorageError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut entries = Vec::new();
    for (index, raw) in BufReader::new(file).split(b'\n').enumerate() {
        let raw = raw?;
        let Ok(line) = std::str::from_utf8(&raw) else {
            tracing::warn!(path = %path.display(), line = index + 1, "journal line is not UTF-8, skipping");
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }
        match JournalEntry::from_line(line) {
            Ok(JournalEntry::Row(row)) if !row.verify() => {
                tracing::warn!(path = %path.display(), line = index + 1, "journal checksum mismatch, skipping");
            }
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!(path = %path.display(), line = index + 1, error = %e, "undecodable journal line, skipping");
            }
        }
    }
    Ok(entries)
}

/// What a journal says about each sequence
#[derive(Debug, Default)]
pub struct JournalReplay {
    rows: BTreeMap<u64, JournalRow>,
    tombstoned: BTreeSet<u64>,
}

impl JournalReplay {
    pub fn from_entries(entries: impl IntoIterator<Item = JournalEntry>) -> Self {
        let mut replay = Self::default();
        for entry in entries {
            match entry {
                JournalEntry::Row(row) => {
                    replay.rows.insert(row.sequence, row);
                }
                JournalEntry::Tombstone { sequence } => {
                    replay.tombstoned.insert(sequence);
                }
            }
        }
        replay
    }

    /// Staged rows that were never undone, in sequence order
    pub fn live_rows(&self) -> impl Iterator<Item = &JournalRow> {
        self.rows
            .values()
            .filter(|row| !self.tombstoned.contains(&row.sequence))
    }

    pub fn is_tombstoned(&self, sequence: u64) -> bool {
        self.tombstoned.contains(&sequence)
    }

    /// Highest sequence mentioned by any entry
    pub fn max_sequence(&self) -> Option<u64> {
        let row_max = self.rows.keys().next_back().copied();
        let tomb_max = self.tombstoned.iter().next_back().copied();
        row_max.max(tomb_max)
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
