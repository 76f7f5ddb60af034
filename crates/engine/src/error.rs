// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine

use setlog_core::ConfigError;
use setlog_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by engine calls
///
/// Failures inside the commit pipeline never show up here; they are logged
/// and published on the fault channel instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("data directory {0} is in use by another setlog process")]
    Locked(PathBuf),
    #[error("{0} task has stopped")]
    ActorGone(&'static str),
    #[error("no active session")]
    NoSession,
}
