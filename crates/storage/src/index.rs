// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Last-two-completions cache per exercise
//!
//! Derived entirely from the ledger. Persisted as a JSON object mapping
//! exercise code to at most two entries, newest first, plus a sidecar
//! watermark holding the ledger size at the time of the last persist.

use crate::fsutil::write_atomic;
use crate::StorageError;
use chrono::{Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use setlog_core::SetRecord;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Entries kept per exercise
pub const MAX_ENTRIES: usize = 2;

/// One remembered completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub weight: String,
    pub unit: String,
    pub reps: String,
    pub effort: u8,
}

impl IndexEntry {
    pub fn from_record(record: &SetRecord) -> Self {
        Self {
            date: record.date,
            time: record.time,
            weight: record.weight.trim().to_string(),
            unit: record.unit.clone(),
            reps: record.reps.trim().to_string(),
            effort: record.effort,
        }
    }

    pub fn signature(&self) -> (NaiveDate, NaiveTime) {
        (self.date, self.time)
    }
}

/// Exercise code to its most recent completions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LastTwoIndex {
    entries: BTreeMap<String, Vec<IndexEntry>>,
}

impl LastTwoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incremental update from one freshly committed record
    ///
    /// Records without both weight and reps are ignored. An existing entry
    /// with the same `(date, time)` is replaced, never merged. Returns
    /// whether the index changed.
    pub fn apply_commit(&mut self, record: &SetRecord) -> bool {
        if !record.has_load() {
            return false;
        }
        let entry = IndexEntry::from_record(record);
        let list = self.entries.entry(record.ex_code.clone()).or_default();
        list.retain(|e| e.signature() != entry.signature());
        list.insert(0, entry);
        list.truncate(MAX_ENTRIES);
        true
    }

    /// Full rebuild from every ledger record
    ///
    /// Only rows with a positive numeric weight and a positive rep count
    /// qualify. Warmups are not filtered here.
    pub fn rebuild<'a>(records: impl IntoIterator<Item = &'a SetRecord>) -> Self {
        let mut entries: BTreeMap<String, Vec<IndexEntry>> = BTreeMap::new();
        for record in records {
            if !qualifies_for_rebuild(record) {
                continue;
            }
            let entry = IndexEntry::from_record(record);
            let list = entries.entry(record.ex_code.clone()).or_default();
            // Later rows win a signature tie, as they would incrementally
            list.retain(|e| e.signature() != entry.signature());
            list.push(entry);
        }
        for list in entries.values_mut() {
            list.sort_by(|a, b| b.signature().cmp(&a.signature()));
            list.truncate(MAX_ENTRIES);
        }
        Self { entries }
    }

    pub fn fetch_last_two(&self, code: &str) -> &[IndexEntry] {
        self.entries.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn latest(&self, code: &str) -> Option<&IndexEntry> {
        self.fetch_last_two(code).first()
    }

    /// Exercises whose latest completion falls within `within_days` of
    /// `today`, most recent first
    pub fn recent(
        &self,
        today: NaiveDate,
        within_days: u32,
        limit: usize,
    ) -> Vec<(String, IndexEntry)> {
        let cutoff = today
            .checked_sub_days(Days::new(u64::from(within_days)))
            .unwrap_or(NaiveDate::MIN);
        let mut recent: Vec<(String, IndexEntry)> = self
            .entries
            .iter()
            .filter_map(|(code, list)| list.first().map(|e| (code.clone(), e.clone())))
            .filter(|(_, e)| e.date >= cutoff)
            .collect();
        recent.sort_by(|(code_a, a), (code_b, b)| {
            b.signature()
                .cmp(&a.signature())
                .then_with(|| code_a.cmp(code_b))
        });
        recent.truncate(limit);
        recent
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of exercises tracked
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Deterministic serialized form; identical content gives identical bytes
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, StorageError> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

fn qualifies_for_rebuild(record: &SetRecord) -> bool {
    let weight_ok = record
        .weight
        .trim()
        .parse::<f64>()
        .is_ok_and(|w| w.is_finite() && w > 0.0);
    weight_ok && leading_count(&record.reps).is_some_and(|n| n > 0)
}

/// Leading integer of a rep string: "5" -> 5, "8-10" -> 8, "AMRAP" -> None
fn leading_count(reps: &str) -> Option<u32> {
    let digits: String = reps.trim().chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Ledger size recorded at the last index persist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watermark {
    pub ledger_bytes: u64,
}

/// Files backing the index
#[derive(Debug, Clone)]
pub struct IndexStore {
    index_path: PathBuf,
    watermark_path: PathBuf,
}

impl IndexStore {
    pub fn new(index_path: impl Into<PathBuf>, watermark_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            watermark_path: watermark_path.into(),
        }
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Load the cached index and watermark
    ///
    /// An unreadable or undecodable file loads as absent, which makes the
    /// caller rebuild from the ledger.
    pub fn load(&self) -> (LastTwoIndex, Option<Watermark>) {
        let index = read_json::<LastTwoIndex>(&self.index_path).unwrap_or_default();
        let watermark = read_json::<Watermark>(&self.watermark_path);
        (index, watermark)
    }

    /// Persist the index, then the watermark, each atomically
    pub fn persist(&self, index: &LastTwoIndex, ledger_bytes: u64) -> Result<(), StorageError> {
        write_atomic(&self.index_path, &index.to_json_bytes()?)?;
        let watermark = serde_json::to_vec(&Watermark { ledger_bytes })?;
        write_atomic(&self.watermark_path, &watermark)?;
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable index file");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "undecodable index file");
            None
        }
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
