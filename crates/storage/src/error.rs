// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage error type

use thiserror::Error;

/// Errors that can occur reading or writing setlog files
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed ledger row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
}
