// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commit coordinator: the undo window between staging and committing
//!
//! A staged set is journaled and held as pending until its deadline; only
//! then does it reach the ledger and the index. Undo removes the most
//! recent pending set before that happens. Session metadata on disk is
//! the authoritative pending list and is rewritten on every change.
//!
//! ```text
//! stage ──► journal Row ──► pending + session.json ──► deadline timer
//!                                                        │
//! undo ──► journal Tombstone ◄── abort timer             ▼
//!                                   ledger append ──► index apply ──► session.json
//! ```

use crate::fault::{Fault, FaultSink};
use crate::index::IndexHandle;
use crate::journal::JournalHandle;
use crate::ledger::LedgerHandle;
use crate::mailbox::call;
use crate::EngineError;
use setlog_core::{
    Clock, IdGen, Layout, PendingCommit, PrescribedItem, SessionContext, SetInput, SetRecord,
};
use setlog_storage::{JournalReplay, SessionLoad, SessionMeta, SessionStore, TimestampGuard};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const COMPONENT: &str = "coordinator";

/// What to stage
#[derive(Debug, Clone)]
pub enum StageRequest {
    /// The next set of the plan
    Prescribed { item: PrescribedItem, input: SetInput },
    /// An exercise outside the plan; set numbers count up per exercise
    Adlib { ex_code: String, input: SetInput },
    /// A fully built record; session fields and timestamp are replaced
    Record(SetRecord),
}

/// A set that entered its undo window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staged {
    pub sequence: u64,
    pub record: SetRecord,
}

/// Outcome of loading the session at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recovery {
    pub session_id: Option<String>,
    /// Pending sets whose deadline had passed, committed during load
    pub committed: usize,
    /// Pending sets given a timer for their remaining window
    pub rearmed: usize,
    /// Pending sets already present in the ledger
    pub dropped: usize,
    /// Pending sets the journal shows as undone
    pub undone: usize,
    /// Metadata was unreadable and the journal was used instead
    pub from_journal: bool,
}

enum CoordinatorMsg {
    Load {
        reply: oneshot::Sender<Result<Recovery, EngineError>>,
    },
    Begin {
        plan_name: String,
        day_label: String,
        reply: oneshot::Sender<Result<SessionContext, EngineError>>,
    },
    Stage {
        request: StageRequest,
        reply: oneshot::Sender<Result<Staged, EngineError>>,
    },
    Undo {
        reply: oneshot::Sender<Option<PendingCommit>>,
    },
    Deadline {
        session_id: String,
        sequence: u64,
    },
    Pending {
        reply: oneshot::Sender<Vec<PendingCommit>>,
    },
    Settle {
        reply: oneshot::Sender<()>,
    },
    CommitAllNow {
        reply: oneshot::Sender<usize>,
    },
    Context {
        reply: oneshot::Sender<Option<SessionContext>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Collaborators the coordinator drives
pub struct Components {
    pub ledger: LedgerHandle,
    pub journal: JournalHandle,
    pub index: IndexHandle,
    pub faults: FaultSink,
}

#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<CoordinatorMsg>,
}

impl CoordinatorHandle {
    pub fn spawn<C: Clock, I: IdGen>(
        layout: Layout,
        grace_period: Duration,
        clock: C,
        ids: I,
        components: Components,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let actor = Coordinator {
            store: SessionStore::new(layout.session_path()),
            layout,
            grace_period,
            clock,
            ids,
            ledger: components.ledger,
            journal: components.journal,
            index: components.index,
            faults: components.faults,
            meta: None,
            guard: TimestampGuard::new(),
            adlib_counts: HashMap::new(),
            timers: HashMap::new(),
            settle_waiters: Vec::new(),
            mailbox: tx.downgrade(),
        };
        tokio::spawn(actor.run(rx));
        Self { tx }
    }

    /// Load `session.json` and recover its pending sets
    pub async fn load(&self) -> Result<Recovery, EngineError> {
        call(&self.tx, COMPONENT, |reply| CoordinatorMsg::Load { reply }).await?
    }

    /// Start a new session, committing whatever the previous one left pending
    pub async fn begin_session(
        &self,
        plan_name: &str,
        day_label: &str,
    ) -> Result<SessionContext, EngineError> {
        let plan_name = plan_name.to_string();
        let day_label = day_label.to_string();
        call(&self.tx, COMPONENT, |reply| CoordinatorMsg::Begin {
            plan_name,
            day_label,
            reply,
        })
        .await?
    }

    pub async fn stage(&self, request: StageRequest) -> Result<Staged, EngineError> {
        call(&self.tx, COMPONENT, |reply| CoordinatorMsg::Stage { request, reply }).await?
    }

    /// Undo the most recently staged set still inside its window
    pub async fn undo(&self) -> Result<Option<PendingCommit>, EngineError> {
        call(&self.tx, COMPONENT, |reply| CoordinatorMsg::Undo { reply }).await
    }

    pub async fn pending(&self) -> Result<Vec<PendingCommit>, EngineError> {
        call(&self.tx, COMPONENT, |reply| CoordinatorMsg::Pending { reply }).await
    }

    /// Resolves once nothing is pending
    pub async fn settle(&self) -> Result<(), EngineError> {
        call(&self.tx, COMPONENT, |reply| CoordinatorMsg::Settle { reply }).await
    }

    /// Commit every pending set now, skipping the rest of their windows
    pub async fn commit_all_now(&self) -> Result<usize, EngineError> {
        call(&self.tx, COMPONENT, |reply| CoordinatorMsg::CommitAllNow { reply }).await
    }

    pub async fn context(&self) -> Result<Option<SessionContext>, EngineError> {
        call(&self.tx, COMPONENT, |reply| CoordinatorMsg::Context { reply }).await
    }

    /// Stop timers; pending sets stay in `session.json` for the next load
    pub async fn shutdown(&self) {
        if call(&self.tx, COMPONENT, |reply| CoordinatorMsg::Shutdown { reply })
            .await
            .is_err()
        {
            tracing::debug!("coordinator already stopped");
        }
    }
}

struct Coordinator<C: Clock, I: IdGen> {
    layout: Layout,
    store: SessionStore,
    grace_period: Duration,
    clock: C,
    ids: I,
    ledger: LedgerHandle,
    journal: JournalHandle,
    index: IndexHandle,
    faults: FaultSink,
    meta: Option<SessionMeta>,
    /// Staging-side timestamp guard, so journaled records carry final times
    guard: TimestampGuard,
    adlib_counts: HashMap<String, u32>,
    timers: HashMap<u64, JoinHandle<()>>,
    settle_waiters: Vec<oneshot::Sender<()>>,
    mailbox: mpsc::WeakUnboundedSender<CoordinatorMsg>,
}

impl<C: Clock, I: IdGen> Coordinator<C, I> {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<CoordinatorMsg>) {
        while let Some(msg) = rx.recv().await {
            match msg {
                CoordinatorMsg::Load { reply } => {
                    let _ = reply.send(self.load().await);
                }
                CoordinatorMsg::Begin {
                    plan_name,
                    day_label,
                    reply,
                } => {
                    let _ = reply.send(self.begin(plan_name, day_label).await);
                }
                CoordinatorMsg::Stage { request, reply } => {
                    let _ = reply.send(self.stage(request).await);
                }
                CoordinatorMsg::Undo { reply } => {
                    let _ = reply.send(self.undo().await);
                }
                CoordinatorMsg::Deadline {
                    session_id,
                    sequence,
                } => {
                    if self.active_session() == Some(session_id.as_str()) {
                        self.commit(sequence).await;
                    } else {
                        tracing::debug!(session_id, sequence, "ignoring deadline of a finished session");
                    }
                }
                CoordinatorMsg::Pending { reply } => {
                    let pending = self.meta.as_ref().map(|m| m.pending.clone()).unwrap_or_default();
                    let _ = reply.send(pending);
                }
                CoordinatorMsg::Settle { reply } => {
                    self.settle_waiters.push(reply);
                    self.notify_settled();
                }
                CoordinatorMsg::CommitAllNow { reply } => {
                    let _ = reply.send(self.commit_all_now().await);
                }
                CoordinatorMsg::Context { reply } => {
                    let _ = reply.send(self.meta.as_ref().map(|m| m.context.clone()));
                }
                CoordinatorMsg::Shutdown { reply } => {
                    self.abort_timers();
                    let _ = reply.send(());
                    break;
                }
            }
        }
        self.abort_timers();
        tracing::debug!("coordinator stopped");
    }

    fn active_session(&self) -> Option<&str> {
        self.meta.as_ref().map(SessionMeta::session_id)
    }

    async fn begin(
        &mut self,
        plan_name: String,
        day_label: String,
    ) -> Result<SessionContext, EngineError> {
        let carried = self.commit_all_now().await;
        if carried > 0 {
            tracing::info!(committed = carried, "committed pending sets of the previous session");
        }

        let session_id = self.ids.session_id(self.clock.local_now());
        let context = SessionContext::new(session_id, plan_name, day_label);
        let meta = SessionMeta::new(context.clone(), self.clock.now());
        self.store.save(&meta)?;
        self.meta = Some(meta);
        self.adlib_counts.clear();
        tracing::info!(
            session_id = %context.session_id,
            plan = %context.plan_name,
            day = %context.day_label,
            "session started"
        );
        Ok(context)
    }

    async fn stage(&mut self, request: StageRequest) -> Result<Staged, EngineError> {
        let context = match &self.meta {
            Some(meta) => meta.context.clone(),
            None => return Err(EngineError::NoSession),
        };
        let now = self.clock.local_now();
        let record = match request {
            StageRequest::Prescribed { item, input } => context.record_for(&item, &input, now),
            StageRequest::Adlib { ex_code, input } => {
                let count = self.adlib_counts.entry(ex_code.clone()).or_default();
                *count += 1;
                context.adlib_record(&ex_code, *count, &input, now)
            }
            StageRequest::Record(record) => SetRecord {
                session_id: context.session_id.clone(),
                plan_name: context.plan_name.clone(),
                day_label: context.day_label.clone(),
                ..record
            }
            .with_timestamp(now),
        };
        let admitted = self.guard.admit(&context.session_id, record.timestamp());
        let record = record.with_timestamp(admitted);

        let staged_at = self.clock.now();
        let sequence = match self.meta.as_mut() {
            Some(meta) => meta.take_sequence(),
            None => return Err(EngineError::NoSession),
        };

        // The journal task reports its own faults; staging carries on
        if let Err(e) = self.journal.append_row(sequence, staged_at, record.clone()).await {
            tracing::warn!(sequence, error = %e, "staged set not journaled");
        }

        let pending = PendingCommit::new(sequence, staged_at, self.grace_period, record.clone());
        if let Some(meta) = self.meta.as_mut() {
            meta.push_pending(pending);
        }
        self.persist_meta();
        self.arm(context.session_id.clone(), sequence, self.grace_period);

        tracing::info!(
            session_id = %context.session_id,
            sequence,
            ex_code = %record.ex_code,
            time = %record.time,
            "set staged"
        );
        Ok(Staged { sequence, record })
    }

    async fn undo(&mut self) -> Option<PendingCommit> {
        let meta = self.meta.as_mut()?;
        let sequence = meta.pending.iter().map(|p| p.sequence).max()?;
        let undone = meta.remove_pending(sequence)?;
        let session_id = meta.session_id().to_string();

        if let Some(timer) = self.timers.remove(&sequence) {
            timer.abort();
        }
        self.persist_meta();
        if let Err(e) = self.journal.append_tombstone(&session_id, sequence).await {
            tracing::warn!(sequence, error = %e, "undo not journaled");
        }

        let record = &undone.record;
        if record.adlib {
            if let Some(count) = self.adlib_counts.get_mut(&record.ex_code) {
                if *count == record.set_num {
                    *count -= 1;
                }
            }
        }
        tracing::info!(session_id, sequence, ex_code = %record.ex_code, "set undone");
        self.notify_settled();
        Some(undone)
    }

    /// Move one pending set into the ledger and the index
    ///
    /// Failures are logged and faulted but the set leaves the pending list
    /// either way. Unknown sequences are ignored.
    async fn commit(&mut self, sequence: u64) {
        self.timers.remove(&sequence);
        let Some(pending) = self.meta.as_mut().and_then(|m| m.remove_pending(sequence)) else {
            return;
        };

        match self.ledger.append(pending.record).await {
            Ok(written) => {
                tracing::info!(
                    session_id = %written.session_id,
                    sequence,
                    ex_code = %written.ex_code,
                    time = %written.time,
                    "set committed"
                );
                if let Err(e) = self.index.apply_commit(written).await {
                    tracing::error!(sequence, error = %e, "committed set not indexed");
                }
            }
            Err(e) => tracing::error!(sequence, error = %e, "commit lost"),
        }

        self.persist_meta();
        self.notify_settled();
    }

    async fn commit_all_now(&mut self) -> usize {
        let sequences: Vec<u64> = match &self.meta {
            Some(meta) => meta.pending.iter().map(|p| p.sequence).collect(),
            None => return 0,
        };
        for &sequence in &sequences {
            if let Some(timer) = self.timers.remove(&sequence) {
                timer.abort();
            }
            self.commit(sequence).await;
        }
        sequences.len()
    }

    async fn load(&mut self) -> Result<Recovery, EngineError> {
        match self.store.load()? {
            SessionLoad::Missing => Ok(Recovery::default()),
            SessionLoad::Loaded(meta) => self.recover(meta, false).await,
            SessionLoad::Corrupt(reason) => {
                tracing::warn!(
                    path = %self.store.path().display(),
                    reason,
                    "session metadata unreadable, reconstructing from journal"
                );
                match self.meta_from_journal().await? {
                    Some(meta) => self.recover(meta, true).await,
                    None => Ok(Recovery::default()),
                }
            }
        }
    }

    /// Re-stage pending sets after a restart
    ///
    /// Sets already in the ledger are dropped, so a commit interrupted
    /// between the ledger append and the metadata write is not repeated.
    /// Sets the journal tombstoned stay undone.
    async fn recover(&mut self, mut meta: SessionMeta, from_journal: bool) -> Result<Recovery, EngineError> {
        let session_id = meta.session_id().to_string();
        let committed = self.ledger.session_records(&session_id).await?;
        let identities: HashSet<_> = committed.iter().map(SetRecord::signature).collect();
        let replay = JournalReplay::from_entries(self.journal.read_all(&session_id).await?);

        self.adlib_counts.clear();
        for record in &committed {
            self.guard.observe(&session_id, record.timestamp());
            self.count_adlib(record);
        }

        let mut report = Recovery {
            session_id: Some(session_id.clone()),
            from_journal,
            ..Recovery::default()
        };
        let pending = std::mem::take(&mut meta.pending);
        for entry in pending {
            if identities.contains(&entry.record.signature()) {
                tracing::info!(session_id, sequence = entry.sequence, "pending set already committed");
                report.dropped += 1;
                continue;
            }
            if replay.is_tombstoned(entry.sequence) {
                tracing::info!(session_id, sequence = entry.sequence, "pending set was undone");
                report.undone += 1;
                continue;
            }
            self.guard.observe(&session_id, entry.record.timestamp());
            self.count_adlib(&entry.record);
            meta.next_sequence = meta.next_sequence.max(entry.sequence + 1);
            meta.push_pending(entry);
        }

        let now = self.clock.now();
        let (due, waiting): (Vec<PendingCommit>, Vec<PendingCommit>) =
            meta.pending.iter().cloned().partition(|p| p.is_due(now));
        self.meta = Some(meta);
        self.persist_meta();

        for entry in waiting {
            self.arm(session_id.clone(), entry.sequence, entry.remaining(now));
            report.rearmed += 1;
        }
        for entry in due {
            self.commit(entry.sequence).await;
            report.committed += 1;
        }

        tracing::info!(
            session_id,
            committed = report.committed,
            rearmed = report.rearmed,
            dropped = report.dropped,
            undone = report.undone,
            from_journal,
            "session recovered"
        );
        Ok(report)
    }

    /// Rebuild session metadata from the most recently written journal
    async fn meta_from_journal(&self) -> Result<Option<SessionMeta>, EngineError> {
        let Some(path) = latest_journal(&self.layout.journals_dir())? else {
            return Ok(None);
        };
        let Some(session_id) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            return Ok(None);
        };

        let replay = JournalReplay::from_entries(self.journal.read_all(&session_id).await?);
        let rows: Vec<_> = replay.live_rows().cloned().collect();
        let Some(first) = rows.first() else {
            return Ok(None);
        };

        let context = SessionContext::new(
            session_id.clone(),
            first.record.plan_name.clone(),
            first.record.day_label.clone(),
        );
        let mut meta = SessionMeta::new(context, first.saved_at);
        meta.next_sequence = replay.max_sequence().map_or(1, |s| s + 1);
        for row in rows {
            meta.push_pending(PendingCommit::new(
                row.sequence,
                row.saved_at,
                self.grace_period,
                row.record,
            ));
        }
        Ok(Some(meta))
    }

    fn count_adlib(&mut self, record: &SetRecord) {
        if record.adlib {
            let count = self.adlib_counts.entry(record.ex_code.clone()).or_default();
            *count = (*count).max(record.set_num);
        }
    }

    /// Start (or restart) the deadline timer for one sequence
    fn arm(&mut self, session_id: String, sequence: u64, delay: Duration) {
        if let Some(previous) = self.timers.remove(&sequence) {
            previous.abort();
        }
        let mailbox = self.mailbox.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = mailbox.upgrade() {
                let _ = tx.send(CoordinatorMsg::Deadline {
                    session_id,
                    sequence,
                });
            }
        });
        self.timers.insert(sequence, timer);
    }

    fn abort_timers(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
    }

    fn persist_meta(&self) {
        let Some(meta) = &self.meta else {
            return;
        };
        if let Err(e) = self.store.save(meta) {
            self.faults.report(Fault::SessionPersist {
                error: e.to_string(),
            });
        }
    }

    fn notify_settled(&mut self) {
        let busy = self.meta.as_ref().is_some_and(|m| !m.pending.is_empty());
        if !busy {
            for waiter in self.settle_waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
    }
}

/// The journal file modified most recently, if any
fn latest_journal(dir: &std::path::Path) -> Result<Option<PathBuf>, EngineError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut latest = None;
    for entry in entries {
        let path = entry?.path();
        if !path.extension().is_some_and(|ext| ext == "jsonl") {
            continue;
        }
        let modified = std::fs::metadata(&path)?.modified()?;
        let newer = match &latest {
            Some((at, _)) => modified > *at,
            None => true,
        };
        if newer {
            latest = Some((modified, path));
        }
    }
    Ok(latest.map(|(_, path)| path))
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
