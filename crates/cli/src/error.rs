// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-friendly error display with context and suggestions.

use setlog_core::ConfigError;
use setlog_engine::EngineError;
use std::fmt;

/// Error with context and recovery suggestions for user-friendly display.
#[derive(Debug)]
pub struct CliError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Pick the most helpful rendering for a top-level failure
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        if let Some(engine_err) = err.downcast_ref::<EngineError>() {
            return Self::from_engine(engine_err);
        }
        if let Some(config_err) = err.downcast_ref::<ConfigError>() {
            return Self::from_config(config_err);
        }
        CliError::new(format!("{err:#}"))
    }

    fn from_config(err: &ConfigError) -> Self {
        match err {
            ConfigError::NoDataDir => CliError::new(err.to_string())
                .with_suggestion("Pass --data-dir <path>"),
            _ => CliError::new(err.to_string())
                .with_suggestion("Check setlog.toml in the data directory"),
        }
    }

    /// Explain an engine failure in terms of what the user can do about it
    pub fn from_engine(err: &EngineError) -> Self {
        match err {
            EngineError::Locked(root) => {
                CliError::new(format!("data directory {} is in use", root.display()))
                    .with_context("Another setlog process holds the lock")
                    .with_suggestion("Finish or quit the other session first")
                    .with_suggestion("Use a different directory with --data-dir")
            }
            EngineError::Config(e) => Self::from_config(e),
            EngineError::NoSession => CliError::new("no active session")
                .with_suggestion("Start one with: setlog session"),
            other => CliError::new(other.to_string()),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for CliError {}
