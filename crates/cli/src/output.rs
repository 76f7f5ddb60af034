// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use clap::ValueEnum;
use serde::Serialize;
use setlog_engine::IndexEntry;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a list of items
pub fn print_list<T: Serialize + fmt::Display>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            for item in items {
                println!("{}", item);
            }
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(items) {
                println!("{}", json);
            }
        }
    }
}

/// One completion of one exercise, as shown to the user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub ex_code: String,
    #[serde(flatten)]
    pub entry: IndexEntry,
}

impl Completion {
    pub fn new(ex_code: impl Into<String>, entry: IndexEntry) -> Self {
        Self {
            ex_code: ex_code.into(),
            entry,
        }
    }
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = &self.entry;
        write!(f, "{:<12} {} {}  {}", self.ex_code, e.date, e.time, e.weight)?;
        if !e.unit.is_empty() {
            write!(f, " {}", e.unit)?;
        }
        write!(f, " x {}", e.reps)?;
        if e.effort > 0 {
            write!(f, "  effort {}", e.effort)?;
        }
        Ok(())
    }
}
