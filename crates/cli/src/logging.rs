// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File logging for the CLI
//!
//! Logs go to `setlog.log` in the data directory so they never interleave
//! with the interactive session on stdout. `RUST_LOG` overrides the level.

use anyhow::{anyhow, Result};
use setlog_core::Layout;
use tracing_appender::non_blocking::WorkerGuard;

/// Install the global subscriber; keep the guard alive until exit so
/// buffered lines are written
pub fn setup_logging(layout: &Layout) -> Result<WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_path = layout.log_path();
    let dir = log_path
        .parent()
        .ok_or_else(|| anyhow!("log path has no parent: {}", log_path.display()))?;
    let file_name = log_path
        .file_name()
        .ok_or_else(|| anyhow!("log path has no file name: {}", log_path.display()))?;
    std::fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()?;

    Ok(guard)
}
