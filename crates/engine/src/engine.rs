// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine: the interface the logging UI talks to
//!
//! Owns the data directory lock and the four component tasks. Staging
//! returns as soon as the set is journaled; everything slower happens
//! behind the undo window.

use crate::coordinator::{Components, CoordinatorHandle, Recovery, StageRequest, Staged};
use crate::fault::{Fault, FaultSink};
use crate::index::{IndexHandle, IndexValidation};
use crate::journal::JournalHandle;
use crate::ledger::LedgerHandle;
use crate::mailbox::FlushStats;
use crate::EngineError;
use fs2::FileExt;
use setlog_core::{
    Clock, Config, IdGen, Layout, PendingCommit, PrescribedItem, SessionContext, SetInput,
    SetRecord, SystemClock,
};
use setlog_storage::fsutil::copy_atomic;
use setlog_storage::{read_ledger, IndexEntry, IndexStore, Ledger};
use std::fs::File;
use std::path::Path;
use tokio::sync::broadcast;

/// Result of replacing the ledger with an external file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub rows: usize,
    pub skipped: usize,
    pub exercises: usize,
}

pub struct Engine<C: Clock = SystemClock> {
    layout: Layout,
    clock: C,
    faults: FaultSink,
    ledger: LedgerHandle,
    journal: JournalHandle,
    index: IndexHandle,
    coordinator: CoordinatorHandle,
    recovery: Recovery,
    validation: IndexValidation,
    // Held for the lifetime of the engine
    _lock: File,
}

impl<C: Clock> Engine<C> {
    /// Lock the data directory, start the components, repair the index and
    /// recover the previous session
    pub async fn open<I: IdGen>(
        layout: Layout,
        config: Config,
        clock: C,
        ids: I,
    ) -> Result<Self, EngineError> {
        std::fs::create_dir_all(layout.root())?;
        let lock = acquire_lock(&layout)?;

        let faults = FaultSink::default();
        let ledger = LedgerHandle::spawn(
            Ledger::open(&layout.ledger_path())?,
            config.ledger_flush,
            faults.clone(),
        );
        let journal = JournalHandle::spawn(layout.clone(), config.journal_flush, faults.clone());
        let index = IndexHandle::spawn(
            IndexStore::new(layout.index_path(), layout.watermark_path()),
            layout.ledger_path(),
            config.index_persist,
            faults.clone(),
        );
        let validation = index.ensure_valid_against_ledger().await?;

        let coordinator = CoordinatorHandle::spawn(
            layout.clone(),
            config.grace_period,
            clock.clone(),
            ids,
            Components {
                ledger: ledger.clone(),
                journal: journal.clone(),
                index: index.clone(),
                faults: faults.clone(),
            },
        );
        let recovery = coordinator.load().await?;

        tracing::info!(
            root = %layout.root().display(),
            ?validation,
            session_id = ?recovery.session_id,
            "engine opened"
        );
        Ok(Self {
            layout,
            clock,
            faults,
            ledger,
            journal,
            index,
            coordinator,
            recovery,
            validation,
            _lock: lock,
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// What loading the previous session did
    pub fn recovery(&self) -> &Recovery {
        &self.recovery
    }

    /// What startup validation did to the index
    pub fn index_validation(&self) -> IndexValidation {
        self.validation
    }

    pub fn faults(&self) -> broadcast::Receiver<Fault> {
        self.faults.subscribe()
    }

    pub async fn begin_session(
        &self,
        plan_name: &str,
        day_label: &str,
    ) -> Result<SessionContext, EngineError> {
        self.coordinator.begin_session(plan_name, day_label).await
    }

    pub async fn session(&self) -> Result<Option<SessionContext>, EngineError> {
        self.coordinator.context().await
    }

    /// Log a prescribed set
    pub async fn save(&self, item: PrescribedItem, input: SetInput) -> Result<Staged, EngineError> {
        self.stage_request(StageRequest::Prescribed { item, input })
            .await
    }

    /// Log a set of an exercise outside the plan
    pub async fn save_adlib(&self, ex_code: &str, input: SetInput) -> Result<Staged, EngineError> {
        self.stage_request(StageRequest::Adlib {
            ex_code: ex_code.to_string(),
            input,
        })
        .await
    }

    /// Stage a prebuilt record under the active session
    pub async fn stage(&self, record: SetRecord) -> Result<Staged, EngineError> {
        self.stage_request(StageRequest::Record(record)).await
    }

    async fn stage_request(&self, request: StageRequest) -> Result<Staged, EngineError> {
        self.coordinator.stage(request).await
    }

    /// Undo the most recent set still inside its undo window
    pub async fn undo_last(&self) -> Result<Option<PendingCommit>, EngineError> {
        self.coordinator.undo().await
    }

    pub async fn pending(&self) -> Result<Vec<PendingCommit>, EngineError> {
        self.coordinator.pending().await
    }

    /// Wait until every staged set has been committed or undone
    pub async fn settle(&self) -> Result<(), EngineError> {
        self.coordinator.settle().await
    }

    pub async fn latest_weight(&self, ex_code: &str) -> Result<Option<String>, EngineError> {
        self.index.latest_weight(ex_code).await
    }

    pub async fn last_two(&self, ex_code: &str) -> Result<Vec<IndexEntry>, EngineError> {
        self.index.fetch_last_two(ex_code).await
    }

    /// Exercises completed in the last `within_days` days, newest first
    pub async fn recent_exercises(
        &self,
        within_days: u32,
        limit: usize,
    ) -> Result<Vec<(String, IndexEntry)>, EngineError> {
        let today = self.clock.local_now().date();
        self.index.recent_exercises(today, within_days, limit).await
    }

    /// Flush the ledger and journal and persist the index now
    pub async fn sync_now(&self) -> Result<(), EngineError> {
        self.ledger.sync_now().await?;
        self.journal.sync_now().await?;
        self.index.persist_now().await
    }

    /// Copy the flushed ledger to `dest`; returns bytes copied
    pub async fn export_ledger(&self, dest: &Path) -> Result<u64, EngineError> {
        self.ledger.sync_now().await?;
        let bytes = copy_atomic(self.ledger.path(), dest)?;
        tracing::info!(dest = %dest.display(), bytes, "ledger exported");
        Ok(bytes)
    }

    /// Replace the ledger with `src` and rebuild the index from it
    pub async fn import_ledger(&self, src: &Path) -> Result<ImportSummary, EngineError> {
        std::fs::metadata(src)?;
        let scan = read_ledger(src)?;
        self.ledger.replace_with(src).await?;
        let exercises = self.index.rebuild_from_ledger().await?;
        let summary = ImportSummary {
            rows: scan.records.len(),
            skipped: scan.skipped,
            exercises,
        };
        tracing::info!(src = %src.display(), ?summary, "ledger imported");
        Ok(summary)
    }

    /// Rebuild the index from the ledger; returns exercises indexed
    pub async fn rebuild_index(&self) -> Result<usize, EngineError> {
        self.index.rebuild_from_ledger().await
    }

    /// Write and flush counters of the ledger and journal tasks
    pub async fn flush_stats(&self) -> Result<(FlushStats, FlushStats), EngineError> {
        Ok((self.ledger.stats().await?, self.journal.stats().await?))
    }

    /// Stop every task, flushing what is outstanding
    ///
    /// Sets still inside their undo window stay pending on disk and are
    /// recovered by the next `open`.
    pub async fn shutdown(self) {
        self.coordinator.shutdown().await;
        self.index.shutdown().await;
        self.journal.shutdown().await;
        self.ledger.shutdown().await;
        tracing::info!(root = %self.layout.root().display(), "engine stopped");
    }
}

fn acquire_lock(layout: &Layout) -> Result<File, EngineError> {
    let path = layout.lock_path();
    let file = File::create(&path)?;
    file.try_lock_exclusive()
        .map_err(|_| EngineError::Locked(layout.root().to_path_buf()))?;
    Ok(file)
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
