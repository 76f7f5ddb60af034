// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Index task: serves last-two lookups from memory
//!
//! The index is a cache over the ledger. Commits update it in memory and
//! schedule a coalesced persist; on startup it is checked against the
//! ledger's size and caught up or rebuilt.

use crate::fault::{Fault, FaultSink};
use crate::flush_timer::FlushTimer;
use crate::mailbox::call;
use crate::EngineError;
use chrono::NaiveDate;
use setlog_core::SetRecord;
use setlog_storage::fsutil::file_size;
use setlog_storage::{
    read_ledger, read_ledger_from, IndexEntry, IndexStore, LastTwoIndex, StorageError, Watermark,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

const COMPONENT: &str = "index";

/// What startup validation had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexValidation {
    /// Watermark matched the ledger
    Fresh,
    /// The ledger grew; this many appended rows were applied
    CaughtUp { applied: usize },
    /// Rebuilt from the whole ledger
    Rebuilt { exercises: usize },
}

enum IndexMsg {
    Apply {
        record: SetRecord,
        reply: oneshot::Sender<bool>,
    },
    LastTwo {
        code: String,
        reply: oneshot::Sender<Vec<IndexEntry>>,
    },
    Recent {
        today: NaiveDate,
        within_days: u32,
        limit: usize,
        reply: oneshot::Sender<Vec<(String, IndexEntry)>>,
    },
    Validate {
        reply: oneshot::Sender<Result<IndexValidation, StorageError>>,
    },
    Rebuild {
        reply: oneshot::Sender<Result<usize, StorageError>>,
    },
    PersistNow {
        reply: oneshot::Sender<Result<(), StorageError>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

#[derive(Clone)]
pub struct IndexHandle {
    tx: mpsc::UnboundedSender<IndexMsg>,
}

impl IndexHandle {
    /// Load the cached index and start its task
    ///
    /// `ledger_path` is only read: for its size at persist time and for
    /// rebuilds.
    pub fn spawn(
        store: IndexStore,
        ledger_path: PathBuf,
        persist_window: Duration,
        faults: FaultSink,
    ) -> Self {
        let (index, watermark) = store.load();
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = IndexActor {
            store,
            ledger_path,
            index,
            watermark,
            dirty: false,
            timer: FlushTimer::new(persist_window),
            faults,
        };
        tokio::spawn(actor.run(rx));
        Self { tx }
    }

    /// Apply a committed record; true when the index changed
    pub async fn apply_commit(&self, record: SetRecord) -> Result<bool, EngineError> {
        call(&self.tx, COMPONENT, |reply| IndexMsg::Apply { record, reply })
            .await
    }

    /// Up to two completions for an exercise, newest first
    pub async fn fetch_last_two(&self, code: &str) -> Result<Vec<IndexEntry>, EngineError> {
        let code = code.to_string();
        call(&self.tx, COMPONENT, |reply| IndexMsg::LastTwo { code, reply }).await
    }

    pub async fn latest_completion(&self, code: &str) -> Result<Option<IndexEntry>, EngineError> {
        Ok(self.fetch_last_two(code).await?.into_iter().next())
    }

    /// Weight string of the latest completion, if any
    pub async fn latest_weight(&self, code: &str) -> Result<Option<String>, EngineError> {
        Ok(self.latest_completion(code).await?.map(|e| e.weight))
    }

    pub async fn recent_exercises(
        &self,
        today: NaiveDate,
        within_days: u32,
        limit: usize,
    ) -> Result<Vec<(String, IndexEntry)>, EngineError> {
        call(&self.tx, COMPONENT, |reply| IndexMsg::Recent {
            today,
            within_days,
            limit,
            reply,
        })
        .await
    }

    /// Compare the cached index with the ledger and repair it
    pub async fn ensure_valid_against_ledger(&self) -> Result<IndexValidation, EngineError> {
        call(&self.tx, COMPONENT, |reply| IndexMsg::Validate { reply })
            .await?
            .map_err(EngineError::from)
    }

    /// Discard the index and rebuild it from the ledger; returns the number
    /// of exercises indexed
    pub async fn rebuild_from_ledger(&self) -> Result<usize, EngineError> {
        call(&self.tx, COMPONENT, |reply| IndexMsg::Rebuild { reply })
            .await?
            .map_err(EngineError::from)
    }

    pub async fn persist_now(&self) -> Result<(), EngineError> {
        call(&self.tx, COMPONENT, |reply| IndexMsg::PersistNow { reply })
            .await?
            .map_err(EngineError::from)
    }

    pub async fn shutdown(&self) {
        if call(&self.tx, COMPONENT, |reply| IndexMsg::Shutdown { reply })
            .await
            .is_err()
        {
            tracing::debug!("index task already stopped");
        }
    }
}

struct IndexActor {
    store: IndexStore,
    ledger_path: PathBuf,
    index: LastTwoIndex,
    watermark: Option<Watermark>,
    dirty: bool,
    timer: FlushTimer,
    faults: FaultSink,
}

impl IndexActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<IndexMsg>) {
        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(IndexMsg::Shutdown { reply }) => {
                        self.persist_if_dirty();
                        let _ = reply.send(());
                        break;
                    }
                    Some(msg) => self.handle(msg),
                    None => {
                        self.persist_if_dirty();
                        break;
                    }
                },
                () = self.timer.fired() => {
                    self.timer.cancel();
                    self.persist_if_dirty();
                }
            }
        }
        tracing::debug!("index task stopped");
    }

    fn handle(&mut self, msg: IndexMsg) {
        match msg {
            IndexMsg::Apply { record, reply } => {
                let changed = self.index.apply_commit(&record);
                if changed {
                    self.dirty = true;
                    self.timer.arm();
                }
                let _ = reply.send(changed);
            }
            IndexMsg::LastTwo { code, reply } => {
                let _ = reply.send(self.index.fetch_last_two(&code).to_vec());
            }
            IndexMsg::Recent {
                today,
                within_days,
                limit,
                reply,
            } => {
                let _ = reply.send(self.index.recent(today, within_days, limit));
            }
            IndexMsg::Validate { reply } => {
                let _ = reply.send(self.validate());
            }
            IndexMsg::Rebuild { reply } => {
                let _ = reply.send(self.rebuild());
            }
            IndexMsg::PersistNow { reply } => {
                self.timer.cancel();
                let result = self.persist();
                if let Err(e) = &result {
                    self.persist_failed(e);
                }
                let _ = reply.send(result);
            }
            IndexMsg::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn validate(&mut self) -> Result<IndexValidation, StorageError> {
        let size = file_size(&self.ledger_path)?;
        let watermark = match self.watermark {
            Some(w) if !self.index.is_empty() => w.ledger_bytes,
            _ => {
                tracing::info!("index cache missing, rebuilding");
                return self.rebuild().map(|exercises| IndexValidation::Rebuilt { exercises });
            }
        };

        if size == watermark {
            return Ok(IndexValidation::Fresh);
        }
        if size > watermark {
            if let Some(tail) = read_ledger_from(&self.ledger_path, watermark)? {
                let applied = tail
                    .records
                    .iter()
                    .filter(|r| self.index.apply_commit(r))
                    .count();
                self.persist()?;
                tracing::info!(applied, from = watermark, to = size, "index caught up with ledger");
                return Ok(IndexValidation::CaughtUp { applied });
            }
        }

        tracing::warn!(watermark, size, "ledger does not match index watermark, rebuilding");
        self.rebuild().map(|exercises| IndexValidation::Rebuilt { exercises })
    }

    fn rebuild(&mut self) -> Result<usize, StorageError> {
        let scan = read_ledger(&self.ledger_path)?;
        self.index = LastTwoIndex::rebuild(&scan.records);
        self.persist()?;
        tracing::info!(
            rows = scan.records.len(),
            skipped = scan.skipped,
            exercises = self.index.len(),
            "index rebuilt from ledger"
        );
        Ok(self.index.len())
    }

    fn persist(&mut self) -> Result<(), StorageError> {
        let ledger_bytes = file_size(&self.ledger_path)?;
        self.store.persist(&self.index, ledger_bytes)?;
        self.watermark = Some(Watermark { ledger_bytes });
        self.dirty = false;
        Ok(())
    }

    /// A failed persist stays dirty and is retried by the next one
    fn persist_if_dirty(&mut self) {
        if !self.dirty {
            return;
        }
        if let Err(e) = self.persist() {
            self.persist_failed(&e);
        }
    }

    fn persist_failed(&self, error: &StorageError) {
        self.faults.report(Fault::IndexPersist {
            error: error.to_string(),
        });
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
