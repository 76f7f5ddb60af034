// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inputs from the plan and UI collaborators
//!
//! The plan model resolves weeks and variants elsewhere; here a session only
//! sees an ordered list of prescribed items.

use serde::{Deserialize, Serialize};

/// Segment id given to sets logged outside the plan
pub const ADLIB_SEGMENT: &str = "adlib";

/// One prescribed set from the plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescribedItem {
    pub ex_code: String,
    pub set_index: u32,
    pub segment_id: String,
    #[serde(default)]
    pub superset_id: Option<String>,
    #[serde(default)]
    pub target_unit: String,
}

/// What the user entered for a set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetInput {
    pub reps: String,
    pub weight: String,
    /// Overrides the prescribed unit when set
    pub unit: Option<String>,
    pub warmup: bool,
    pub effort: u8,
    pub rest_sec: Option<u32>,
    pub tags: String,
    pub notes: String,
}

impl SetInput {
    pub fn new(weight: impl Into<String>, reps: impl Into<String>) -> Self {
        Self {
            weight: weight.into(),
            reps: reps.into(),
            ..Self::default()
        }
    }

    pub fn effort(mut self, effort: u8) -> Self {
        self.effort = effort;
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn warmup(mut self) -> Self {
        self.warmup = true;
        self
    }
}

/// Cursor over a session's prescribed items
#[derive(Debug, Clone, Default)]
pub struct PlanCursor {
    items: Vec<PrescribedItem>,
    position: usize,
}

impl PlanCursor {
    pub fn new(items: Vec<PrescribedItem>) -> Self {
        Self { items, position: 0 }
    }

    /// Parse a JSON array of prescribed items
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// The item the next save applies to
    pub fn current(&self) -> Option<&PrescribedItem> {
        self.items.get(self.position)
    }

    /// Move past the current item
    pub fn advance(&mut self) -> Option<&PrescribedItem> {
        let item = self.items.get(self.position)?;
        self.position += 1;
        Some(item)
    }

    /// Step back after an undo
    pub fn rewind(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.position)
    }
}
