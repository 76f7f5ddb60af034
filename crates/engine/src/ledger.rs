// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ledger task: sole owner of the ledger file
//!
//! Appends land in the page cache immediately; the fsync is debounced so a
//! burst of appends costs one flush. `sync_now` forces the flush before an
//! outside reader (export) looks at the file.

use crate::fault::{Fault, FaultSink};
use crate::flush_timer::FlushTimer;
use crate::mailbox::{call, FlushStats};
use crate::EngineError;
use setlog_core::SetRecord;
use setlog_storage::{Ledger, StorageError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

const COMPONENT: &str = "ledger";

enum LedgerMsg {
    Append {
        record: SetRecord,
        reply: oneshot::Sender<Result<SetRecord, StorageError>>,
    },
    SyncNow {
        reply: oneshot::Sender<Result<(), StorageError>>,
    },
    Size {
        reply: oneshot::Sender<Result<u64, StorageError>>,
    },
    SessionRecords {
        session_id: String,
        reply: oneshot::Sender<Result<Vec<SetRecord>, StorageError>>,
    },
    Replace {
        src: PathBuf,
        reply: oneshot::Sender<Result<u64, StorageError>>,
    },
    Stats {
        reply: oneshot::Sender<FlushStats>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to the ledger task
#[derive(Clone)]
pub struct LedgerHandle {
    tx: mpsc::UnboundedSender<LedgerMsg>,
    path: PathBuf,
}

impl LedgerHandle {
    /// Start the task that owns `ledger`
    pub fn spawn(ledger: Ledger, flush_window: Duration, faults: FaultSink) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let path = ledger.path().to_path_buf();
        let actor = LedgerActor {
            ledger,
            timer: FlushTimer::new(flush_window),
            faults,
            stats: FlushStats::default(),
        };
        tokio::spawn(actor.run(rx));
        Self { tx, path }
    }

    /// Path of the ledger file, for read-only consumers
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append and wait for the row to be written (not flushed)
    ///
    /// Returns the record as written, which may carry a bumped timestamp.
    pub async fn append(&self, record: SetRecord) -> Result<SetRecord, EngineError> {
        call(&self.tx, COMPONENT, |reply| LedgerMsg::Append { record, reply })
            .await?
            .map_err(EngineError::from)
    }

    /// Cancel the pending flush and flush now
    pub async fn sync_now(&self) -> Result<(), EngineError> {
        call(&self.tx, COMPONENT, |reply| LedgerMsg::SyncNow { reply })
            .await?
            .map_err(EngineError::from)
    }

    pub async fn size(&self) -> Result<u64, EngineError> {
        call(&self.tx, COMPONENT, |reply| LedgerMsg::Size { reply })
            .await?
            .map_err(EngineError::from)
    }

    /// Every committed record of one session, in file order
    pub async fn session_records(&self, session_id: &str) -> Result<Vec<SetRecord>, EngineError> {
        let session_id = session_id.to_string();
        call(&self.tx, COMPONENT, |reply| LedgerMsg::SessionRecords {
            session_id,
            reply,
        })
        .await?
        .map_err(EngineError::from)
    }

    /// Replace the ledger wholesale with `src`
    pub async fn replace_with(&self, src: &Path) -> Result<u64, EngineError> {
        let src = src.to_path_buf();
        call(&self.tx, COMPONENT, |reply| LedgerMsg::Replace { src, reply })
            .await?
            .map_err(EngineError::from)
    }

    pub async fn stats(&self) -> Result<FlushStats, EngineError> {
        call(&self.tx, COMPONENT, |reply| LedgerMsg::Stats { reply }).await
    }

    /// Flush outstanding writes and stop the task
    pub async fn shutdown(&self) {
        if call(&self.tx, COMPONENT, |reply| LedgerMsg::Shutdown { reply })
            .await
            .is_err()
        {
            tracing::debug!("ledger task already stopped");
        }
    }
}

struct LedgerActor {
    ledger: Ledger,
    timer: FlushTimer,
    faults: FaultSink,
    stats: FlushStats,
}

impl LedgerActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<LedgerMsg>) {
        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(LedgerMsg::Shutdown { reply }) => {
                        self.flush();
                        let _ = reply.send(());
                        break;
                    }
                    Some(msg) => self.handle(msg),
                    None => {
                        self.flush();
                        break;
                    }
                },
                () = self.timer.fired() => {
                    self.timer.cancel();
                    self.flush();
                }
            }
        }
        tracing::debug!(path = %self.ledger.path().display(), "ledger task stopped");
    }

    fn handle(&mut self, msg: LedgerMsg) {
        match msg {
            LedgerMsg::Append { record, reply } => {
                let session_id = record.session_id.clone();
                let result = self.ledger.append(record);
                match &result {
                    Ok(written) => {
                        self.stats.writes += 1;
                        self.timer.arm();
                        tracing::debug!(
                            session_id = %written.session_id,
                            ex_code = %written.ex_code,
                            time = %written.time,
                            "ledger row appended"
                        );
                    }
                    Err(e) => self.faults.report(Fault::LedgerAppend {
                        session_id,
                        error: e.to_string(),
                    }),
                }
                let _ = reply.send(result);
            }
            LedgerMsg::SyncNow { reply } => {
                self.timer.cancel();
                let result = self.ledger.sync();
                match &result {
                    Ok(()) => self.stats.flushes += 1,
                    Err(e) => self.flush_failed(e),
                }
                let _ = reply.send(result);
            }
            LedgerMsg::Size { reply } => {
                let _ = reply.send(self.ledger.size());
            }
            LedgerMsg::SessionRecords { session_id, reply } => {
                let result = self.ledger.session_records(&session_id);
                let _ = reply.send(result);
            }
            LedgerMsg::Replace { src, reply } => {
                self.timer.cancel();
                let _ = reply.send(self.ledger.replace_with(&src));
            }
            LedgerMsg::Stats { reply } => {
                let _ = reply.send(self.stats);
            }
            LedgerMsg::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    /// Flush if anything is outstanding; a failure waits for the next
    /// scheduled flush
    fn flush(&mut self) {
        if !self.ledger.has_unsynced_writes() {
            return;
        }
        match self.ledger.sync() {
            Ok(()) => {
                self.stats.flushes += 1;
                tracing::debug!("ledger flushed");
            }
            Err(e) => self.flush_failed(&e),
        }
    }

    fn flush_failed(&mut self, error: &StorageError) {
        self.stats.failed_flushes += 1;
        self.faults.report(Fault::LedgerFlush {
            error: error.to_string(),
        });
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
