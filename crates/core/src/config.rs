// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration and on-disk layout
//!
//! Timing knobs come from an optional `setlog.toml` in the data directory.
//! Every key is optional; a missing file means all defaults.

use crate::pending::DEFAULT_GRACE_PERIOD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides the default data directory
pub const DATA_DIR_ENV: &str = "SETLOG_DATA_DIR";

/// Name of the optional config file inside the data directory
pub const CONFIG_FILE: &str = "setlog.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a data directory; set {DATA_DIR_ENV}")]
    NoDataDir,
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Timing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Undo window between staging a set and committing it
    #[serde(with = "humantime_serde")]
    pub grace_period: Duration,
    /// Coalescing window for ledger fsyncs
    #[serde(with = "humantime_serde")]
    pub ledger_flush: Duration,
    /// Coalescing window for journal fsyncs
    #[serde(with = "humantime_serde")]
    pub journal_flush: Duration,
    /// Coalescing window for index persists
    #[serde(with = "humantime_serde")]
    pub index_persist: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            ledger_flush: Duration::from_secs(1),
            journal_flush: Duration::from_secs(1),
            index_persist: Duration::from_millis(500),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `setlog.toml` from the layout's data directory, or defaults
    pub fn load(layout: &Layout) -> Result<Self, ConfigError> {
        let path = layout.config_path();
        match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_toml(&text, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }
}

/// File paths under one data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the data directory: explicit path, then `SETLOG_DATA_DIR`,
    /// then the platform data directory.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(root) = explicit {
            return Ok(Self::new(root));
        }
        if let Some(root) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(PathBuf::from(root)));
        }
        dirs::data_dir()
            .map(|d| Self::new(d.join("setlog")))
            .ok_or(ConfigError::NoDataDir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join("ledger.csv")
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    pub fn watermark_path(&self) -> PathBuf {
        self.root.join("index.watermark.json")
    }

    pub fn session_path(&self) -> PathBuf {
        self.root.join("session.json")
    }

    pub fn journals_dir(&self) -> PathBuf {
        self.root.join("journals")
    }

    pub fn journal_path(&self, session_id: &str) -> PathBuf {
        self.journals_dir().join(format!("{session_id}.jsonl"))
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join("setlog.log")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(".lock")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
