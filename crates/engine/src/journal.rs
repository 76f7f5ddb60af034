// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal task: owns the write-ahead log of the active session
//!
//! One file per session. The task opens the file for whichever session the
//! incoming entry belongs to, flushing the previous one first.

use crate::fault::{Fault, FaultSink};
use crate::flush_timer::FlushTimer;
use crate::mailbox::{call, FlushStats};
use crate::EngineError;
use chrono::{DateTime, Utc};
use setlog_core::{Layout, SetRecord};
use setlog_storage::{read_journal, Journal, JournalEntry, StorageError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

const COMPONENT: &str = "journal";

type Reply = oneshot::Sender<Result<(), StorageError>>;

enum JournalMsg {
    Row {
        sequence: u64,
        saved_at: DateTime<Utc>,
        record: SetRecord,
        reply: Reply,
    },
    Tombstone {
        session_id: String,
        sequence: u64,
        reply: Reply,
    },
    ReadAll {
        session_id: String,
        reply: oneshot::Sender<Result<Vec<JournalEntry>, StorageError>>,
    },
    SyncNow {
        reply: Reply,
    },
    Stats {
        reply: oneshot::Sender<FlushStats>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

#[derive(Clone)]
pub struct JournalHandle {
    tx: mpsc::UnboundedSender<JournalMsg>,
}

impl JournalHandle {
    pub fn spawn(layout: Layout, flush_window: Duration, faults: FaultSink) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = JournalActor {
            layout,
            current: None,
            timer: FlushTimer::new(flush_window),
            faults,
            stats: FlushStats::default(),
        };
        tokio::spawn(actor.run(rx));
        Self { tx }
    }

    /// Record a staged set; acknowledged once written to the page cache
    pub async fn append_row(
        &self,
        sequence: u64,
        saved_at: DateTime<Utc>,
        record: SetRecord,
    ) -> Result<(), EngineError> {
        call(&self.tx, COMPONENT, |reply| JournalMsg::Row {
            sequence,
            saved_at,
            record,
            reply,
        })
        .await?
        .map_err(EngineError::from)
    }

    /// Record that a staged set was undone
    pub async fn append_tombstone(&self, session_id: &str, sequence: u64) -> Result<(), EngineError> {
        let session_id = session_id.to_string();
        call(&self.tx, COMPONENT, |reply| JournalMsg::Tombstone {
            session_id,
            sequence,
            reply,
        })
        .await?
        .map_err(EngineError::from)
    }

    /// Every decodable entry of a session's journal, in file order
    pub async fn read_all(&self, session_id: &str) -> Result<Vec<JournalEntry>, EngineError> {
        let session_id = session_id.to_string();
        call(&self.tx, COMPONENT, |reply| JournalMsg::ReadAll { session_id, reply })
            .await?
            .map_err(EngineError::from)
    }

    pub async fn sync_now(&self) -> Result<(), EngineError> {
        call(&self.tx, COMPONENT, |reply| JournalMsg::SyncNow { reply })
            .await?
            .map_err(EngineError::from)
    }

    pub async fn stats(&self) -> Result<FlushStats, EngineError> {
        call(&self.tx, COMPONENT, |reply| JournalMsg::Stats { reply }).await
    }

    pub async fn shutdown(&self) {
        if call(&self.tx, COMPONENT, |reply| JournalMsg::Shutdown { reply })
            .await
            .is_err()
        {
            tracing::debug!("journal task already stopped");
        }
    }
}

struct JournalActor {
    layout: Layout,
    current: Option<(String, Journal)>,
    timer: FlushTimer,
    faults: FaultSink,
    stats: FlushStats,
}

impl JournalActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<JournalMsg>) {
        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(JournalMsg::Shutdown { reply }) => {
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
        tracing::debug!("journal task stopped");
    }

    fn handle(&mut self, msg: JournalMsg) {
        match msg {
            JournalMsg::Row {
                sequence,
                saved_at,
                record,
                reply,
            } => {
                let result = self
                    .journal_for(&record.session_id.clone())
                    .and_then(|journal| journal.append_row(sequence, saved_at, record));
                let _ = reply.send(self.written(sequence, result));
            }
            JournalMsg::Tombstone {
                session_id,
                sequence,
                reply,
            } => {
                let result = self
                    .journal_for(&session_id)
                    .and_then(|journal| journal.append_tombstone(sequence));
                let _ = reply.send(self.written(sequence, result));
            }
            JournalMsg::ReadAll { session_id, reply } => {
                let _ = reply.send(read_journal(&self.layout.journal_path(&session_id)));
            }
            JournalMsg::SyncNow { reply } => {
                self.timer.cancel();
                let result = match &mut self.current {
                    Some((_, journal)) => journal.sync(),
                    None => Ok(()),
                };
                match &result {
                    Ok(()) => self.stats.flushes += 1,
                    Err(e) => self.flush_failed(e),
                }
                let _ = reply.send(result);
            }
            JournalMsg::Stats { reply } => {
                let _ = reply.send(self.stats);
            }
            JournalMsg::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    /// The open journal for `session_id`, switching files when needed
    fn journal_for(&mut self, session_id: &str) -> Result<&mut Journal, StorageError> {
        let switch = !matches!(&self.current, Some((id, _)) if id == session_id);
        if switch {
            self.flush();
            let journal = Journal::open(&self.layout.journal_path(session_id))?;
            tracing::debug!(session_id, path = %journal.path().display(), "journal opened");
            self.current = Some((session_id.to_string(), journal));
        }
        match &mut self.current {
            Some((_, journal)) => Ok(journal),
            None => Err(StorageError::Io(std::io::Error::other("journal not open"))),
        }
    }

    fn written(&mut self, sequence: u64, result: Result<(), StorageError>) -> Result<(), StorageError> {
        match &result {
            Ok(()) => {
                self.stats.writes += 1;
                self.timer.arm();
            }
            Err(e) => self.faults.report(Fault::JournalAppend {
                sequence,
                error: e.to_string(),
            }),
        }
        result
    }

    fn flush(&mut self) {
        let Some((_, journal)) = &mut self.current else {
            return;
        };
        if !journal.has_unsynced_writes() {
            return;
        }
        match journal.sync() {
            Ok(()) => self.stats.flushes += 1,
            Err(e) => self.flush_failed(&e),
        }
    }

    fn flush_failed(&mut self, error: &StorageError) {
        self.stats.failed_flushes += 1;
        self.faults.report(Fault::JournalFlush {
            error: error.to_string(),
        });
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
