// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Staged, not yet committed sets

use crate::record::SetRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Undo window applied when nothing else is configured
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// A set inside its undo window
///
/// Ends either committed (written to ledger and index) or undone
/// (tombstoned in the journal). Both are terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCommit {
    /// Per-session, strictly increasing
    pub sequence: u64,
    pub staged_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub record: SetRecord,
}

impl PendingCommit {
    pub fn new(
        sequence: u64,
        staged_at: DateTime<Utc>,
        grace: Duration,
        record: SetRecord,
    ) -> Self {
        let grace = chrono::Duration::from_std(grace).unwrap_or(chrono::Duration::zero());
        Self {
            sequence,
            staged_at,
            deadline: staged_at + grace,
            record,
        }
    }

    /// Time left in the undo window, zero once the deadline passed
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.deadline - now).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }
}
