// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifier generation

use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Generates session identifiers
///
/// Session ids become part of every ledger row and name the session's
/// journal file, so they must be filesystem-safe.
pub trait IdGen: Clone + Send + Sync + 'static {
    fn session_id(&self, started: NaiveDateTime) -> String;
}

/// Date-prefixed random ids for production use, e.g. `20260314-1f3a9c02`
#[derive(Clone, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn session_id(&self, started: NaiveDateTime) -> String {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-{}", started.format("%Y%m%d"), &uuid[..8])
    }
}

/// Sequential ids for testing
#[derive(Clone)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("session")
    }
}

impl IdGen for SequentialIdGen {
    fn session_id(&self, _started: NaiveDateTime) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}
