// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! setlog-engine: the durability core of the workout logger
//!
//! Four tasks, each the single owner of its file:
//!
//! - ledger: append-only history, flushes debounced
//! - journal: per-session write-ahead log of staged and undone sets
//! - index: last two completions per exercise, persisted on a debounce
//! - coordinator: holds staged sets for the undo window, then commits

mod coordinator;
mod engine;
mod error;
mod fault;
mod flush_timer;
mod index;
mod journal;
mod ledger;
mod mailbox;

pub use coordinator::{Recovery, StageRequest, Staged};
pub use engine::{Engine, ImportSummary};
pub use error::EngineError;
pub use fault::{Fault, FaultSink};
pub use flush_timer::FlushTimer;
pub use index::{IndexHandle, IndexValidation};
pub use journal::JournalHandle;
pub use ledger::LedgerHandle;
pub use mailbox::FlushStats;
pub use setlog_storage::IndexEntry;
