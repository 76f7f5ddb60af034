// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observable channel for swallowed I/O failures
//!
//! Storage failures in the commit pipeline never reach the caller that
//! staged the set. They are logged and broadcast here so data loss is at
//! least detectable. Nobody has to listen.

use thiserror::Error;
use tokio::sync::broadcast;

/// A storage failure that was absorbed to keep logging non-blocking
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("ledger append failed for session {session_id}: {error}")]
    LedgerAppend { session_id: String, error: String },
    #[error("ledger flush failed: {error}")]
    LedgerFlush { error: String },
    #[error("journal append failed for sequence {sequence}: {error}")]
    JournalAppend { sequence: u64, error: String },
    #[error("journal flush failed: {error}")]
    JournalFlush { error: String },
    #[error("index persist failed: {error}")]
    IndexPersist { error: String },
    #[error("session metadata write failed: {error}")]
    SessionPersist { error: String },
}

/// Sending side of the fault channel, shared by every component
#[derive(Clone)]
pub struct FaultSink {
    tx: broadcast::Sender<Fault>,
}

impl FaultSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Log the fault and publish it to current subscribers
    pub fn report(&self, fault: Fault) {
        tracing::error!(%fault, "storage fault");
        // No subscribers is fine
        let _ = self.tx.send(fault);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Fault> {
        self.tx.subscribe()
    }
}

impl Default for FaultSink {
    fn default() -> Self {
        Self::new(64)
    }
}
