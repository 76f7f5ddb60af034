// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! setlog-storage: on-disk formats for the setlog workout ledger
//!
//! Everything here is synchronous and single-owner. Scheduling of flushes
//! and persists is left to the caller.
//!
//! ```text
//! ledger.csv              append-only history (source of truth)
//! journals/<session>.jsonl  write-ahead log of staged and undone sets
//! session.json            pending commits of the active session
//! index.json              last two completions per exercise (derived)
//! ```

pub mod csv;
mod error;
pub mod fsutil;
pub mod guard;
pub mod index;
pub mod journal;
pub mod ledger;
pub mod session;

pub use error::StorageError;
pub use guard::TimestampGuard;
pub use index::{IndexEntry, IndexStore, LastTwoIndex, Watermark};
pub use journal::{read_journal, Journal, JournalEntry, JournalReplay, JournalRow};
pub use ledger::{read_ledger, read_ledger_from, Ledger, LedgerScan};
pub use session::{SessionLoad, SessionMeta, SessionStore};
