// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Active session metadata: the authoritative list of pending commits

use crate::fsutil::write_atomic;
use crate::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use setlog_core::{PendingCommit, SessionContext};
use std::path::{Path, PathBuf};

/// Persisted state of the active session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMeta {
    #[serde(flatten)]
    pub context: SessionContext,
    pub started_at: DateTime<Utc>,
    /// Sequence the next staged set receives
    pub next_sequence: u64,
    /// Staged sets not yet committed or undone, in sequence order
    #[serde(default)]
    pub pending: Vec<PendingCommit>,
}

impl SessionMeta {
    pub fn new(context: SessionContext, started_at: DateTime<Utc>) -> Self {
        Self {
            context,
            started_at,
            next_sequence: 1,
            pending: Vec::new(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.context.session_id
    }

    pub fn take_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    pub fn push_pending(&mut self, pending: PendingCommit) {
        self.pending.push(pending);
        self.pending.sort_by_key(|p| p.sequence);
    }

    /// Drop a pending entry, returning it when present
    pub fn remove_pending(&mut self, sequence: u64) -> Option<PendingCommit> {
        let pos = self.pending.iter().position(|p| p.sequence == sequence)?;
        Some(self.pending.remove(pos))
    }
}

/// Outcome of loading `session.json`
#[derive(Debug)]
pub enum SessionLoad {
    Missing,
    Loaded(SessionMeta),
    /// The file exists but cannot be decoded
    Corrupt(String),
}

/// Reads and atomically rewrites the session metadata file
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<SessionLoad, StorageError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SessionLoad::Missing),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(meta) => Ok(SessionLoad::Loaded(meta)),
            Err(e) => Ok(SessionLoad::Corrupt(e.to_string())),
        }
    }

    pub fn save(&self, meta: &SessionMeta) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(meta)?;
        write_atomic(&self.path, &bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use setlog_core::{SetInput, DEFAULT_GRACE_PERIOD};

    fn meta() -> SessionMeta {
        let started = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
        SessionMeta::new(SessionContext::new("s-1", "5x5", "A"), started)
    }

    fn pending(sequence: u64) -> PendingCommit {
        let at = NaiveDate::from_ymd_opt(2026, 3, 14)
            .and_then(|d| d.and_hms_opt(10, 0, 0))
            .unwrap();
        let record = SessionContext::new("s-1", "5x5", "A").adlib_record(
            "BENCH",
            1,
            &SetInput::new("135", "5"),
            at,
        );
        PendingCommit::new(sequence, Utc.from_utc_datetime(&at), DEFAULT_GRACE_PERIOD, record)
    }

    #[test]
    fn sequences_start_at_one_and_increase() {
        let mut meta = meta();
        assert_eq!(meta.take_sequence(), 1);
        assert_eq!(meta.take_sequence(), 2);
        assert_eq!(meta.next_sequence, 3);
    }

    #[test]
    fn pending_stays_sorted_and_removable() {
        let mut meta = meta();
        meta.push_pending(pending(3));
        meta.push_pending(pending(1));
        let order: Vec<u64> = meta.pending.iter().map(|p| p.sequence).collect();
        assert_eq!(order, vec![1, 3]);

        assert!(meta.remove_pending(3).is_some());
        assert!(meta.remove_pending(3).is_none());
        assert_eq!(meta.pending.len(), 1);
    }

    #[test]
    fn store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        let mut meta = meta();
        meta.push_pending(pending(1));
        store.save(&meta).unwrap();

        match store.load().unwrap() {
            SessionLoad::Loaded(loaded) => assert_eq!(loaded, meta),
            other => panic!("unexpected load result {other:?}"),
        }
    }

    #[test]
    fn missing_and_corrupt_are_distinguished() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert!(matches!(store.load().unwrap(), SessionLoad::Missing));

        std::fs::write(store.path(), b"{\"sessionId\":").unwrap();
        assert!(matches!(store.load().unwrap(), SessionLoad::Corrupt(_)));
    }
}
