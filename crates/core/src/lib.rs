// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! setlog-core: data model for the setlog workout ledger
//!
//! This crate provides:
//! - Set records and the staged (pending) form they take before commit
//! - Plan and user inputs consumed when logging a set
//! - Clock and session id abstractions for deterministic tests
//! - Configuration and on-disk layout

pub mod clock;
pub mod config;
pub mod id;
pub mod pending;
pub mod plan;
pub mod record;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{Config, ConfigError, Layout};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use pending::{PendingCommit, DEFAULT_GRACE_PERIOD};
pub use plan::{PlanCursor, PrescribedItem, SetInput, ADLIB_SEGMENT};
pub use record::{SessionContext, SetRecord, MAX_EFFORT};
