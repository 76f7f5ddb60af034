// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Set records: one completed (or skipped) set
//!
//! A `SetRecord` is immutable once it reaches the ledger. Its identity within
//! the ledger is `(session_id, date, time)`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Highest effort value; 0 means unset
pub const MAX_EFFORT: u8 = 5;

/// One logged set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRecord {
    pub session_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub plan_name: String,
    pub day_label: String,
    pub segment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superset_id: Option<String>,
    pub ex_code: String,
    #[serde(default)]
    pub adlib: bool,
    pub set_num: u32,
    /// Kept as text so "AMRAP" and rep ranges survive
    pub reps: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_sec: Option<u32>,
    /// Signed, unit-less text exactly as entered
    pub weight: String,
    pub unit: String,
    #[serde(default)]
    pub is_warmup: bool,
    #[serde(default)]
    pub rpe: String,
    #[serde(default)]
    pub rir: String,
    #[serde(default)]
    pub tempo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_sec: Option<u32>,
    #[serde(default)]
    pub effort: u8,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub pr_types: String,
}

impl SetRecord {
    /// The `(date, time)` pair as a single timestamp
    pub fn timestamp(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Replace the record's date and time, truncated to whole seconds
    pub fn with_timestamp(mut self, ts: NaiveDateTime) -> Self {
        let ts = truncate_to_second(ts);
        self.date = ts.date();
        self.time = ts.time();
        self
    }

    /// `(date, time)` signature used for ordering and deduplication
    pub fn signature(&self) -> (NaiveDate, NaiveTime) {
        (self.date, self.time)
    }

    /// True when both weight and reps carry something
    pub fn has_load(&self) -> bool {
        !self.weight.trim().is_empty() && !self.reps.trim().is_empty()
    }
}

/// Drop sub-second precision; the ledger stores `HH:MM:SS`
pub fn truncate_to_second(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

/// Clamp an effort rating into `0..=MAX_EFFORT`
pub fn clamp_effort(effort: u8) -> u8 {
    effort.min(MAX_EFFORT)
}

/// Who is logging: the active session's identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub session_id: String,
    pub plan_name: String,
    pub day_label: String,
}

impl SessionContext {
    pub fn new(
        session_id: impl Into<String>,
        plan_name: impl Into<String>,
        day_label: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            plan_name: plan_name.into(),
            day_label: day_label.into(),
        }
    }

    /// Build a record for a prescribed plan item
    pub fn record_for(
        &self,
        item: &crate::plan::PrescribedItem,
        input: &crate::plan::SetInput,
        at: NaiveDateTime,
    ) -> SetRecord {
        let unit = input
            .unit
            .clone()
            .unwrap_or_else(|| item.target_unit.clone());
        self.build(
            &item.ex_code,
            item.set_index,
            item.segment_id.clone(),
            item.superset_id.clone(),
            false,
            unit,
            input,
            at,
        )
    }

    /// Build a record for an exercise that is not part of the plan
    pub fn adlib_record(
        &self,
        ex_code: &str,
        set_num: u32,
        input: &crate::plan::SetInput,
        at: NaiveDateTime,
    ) -> SetRecord {
        let unit = input.unit.clone().unwrap_or_default();
        self.build(
            ex_code,
            set_num,
            crate::plan::ADLIB_SEGMENT.to_string(),
            None,
            true,
            unit,
            input,
            at,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        ex_code: &str,
        set_num: u32,
        segment_id: String,
        superset_id: Option<String>,
        adlib: bool,
        unit: String,
        input: &crate::plan::SetInput,
        at: NaiveDateTime,
    ) -> SetRecord {
        let at = truncate_to_second(at);
        SetRecord {
            session_id: self.session_id.clone(),
            date: at.date(),
            time: at.time(),
            plan_name: self.plan_name.clone(),
            day_label: self.day_label.clone(),
            segment_id,
            superset_id,
            ex_code: ex_code.to_string(),
            adlib,
            set_num,
            reps: input.reps.trim().to_string(),
            time_sec: None,
            weight: input.weight.trim().to_string(),
            unit,
            is_warmup: input.warmup,
            rpe: String::new(),
            rir: String::new(),
            tempo: String::new(),
            rest_sec: input.rest_sec,
            effort: clamp_effort(input.effort),
            tags: input.tags.clone(),
            notes: input.notes.clone(),
            pr_types: String::new(),
        }
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
