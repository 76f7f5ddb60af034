// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Strictly increasing timestamps per session
//!
//! Two sets logged in the same wall-clock second would otherwise share an
//! identity. The guard remembers the last admitted timestamp per session id
//! and bumps a colliding one to exactly one second after it.

use chrono::{Duration, NaiveDateTime};
use setlog_core::record::truncate_to_second;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct TimestampGuard {
    last: HashMap<String, NaiveDateTime>,
}

impl TimestampGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a proposed timestamp, returning the one to use
    pub fn admit(&mut self, session_id: &str, proposed: NaiveDateTime) -> NaiveDateTime {
        let proposed = truncate_to_second(proposed);
        let admitted = match self.last.get(session_id) {
            Some(&last) if proposed <= last => last + Duration::seconds(1),
            _ => proposed,
        };
        self.last.insert(session_id.to_string(), admitted);
        admitted
    }

    /// Record a timestamp that is already fixed (e.g. recovered from disk)
    /// without changing it
    pub fn observe(&mut self, session_id: &str, ts: NaiveDateTime) {
        let entry = self.last.entry(session_id.to_string()).or_insert(ts);
        if ts > *entry {
            *entry = ts;
        }
    }

    pub fn last(&self, session_id: &str) -> Option<NaiveDateTime> {
        self.last.get(session_id).copied()
    }

    /// Forget everything, e.g. after the ledger was replaced
    pub fn reset(&mut self) {
        self.last.clear();
    }
}
