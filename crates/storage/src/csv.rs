// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ledger row codec
//!
//! Comma-separated, RFC 4180 quoting. Fields that contain a comma, quote,
//! CR or LF are wrapped in quotes with inner quotes doubled.

use chrono::{NaiveDate, NaiveTime};
use setlog_core::record::clamp_effort;
use setlog_core::SetRecord;
use std::collections::HashMap;

/// The fixed ledger header, in column order
pub const COLUMNS: [&str; 23] = [
    "session_id",
    "date",
    "time",
    "plan_name",
    "day_label",
    "segment_id",
    "superset_id",
    "ex_code",
    "adlib",
    "set_num",
    "reps",
    "time_sec",
    "weight",
    "unit",
    "is_warmup",
    "rpe",
    "rir",
    "tempo",
    "rest_sec",
    "effort_1to5",
    "tags",
    "notes",
    "pr_types",
];

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Header line including the trailing newline
pub fn header_line() -> String {
    let mut line = COLUMNS.join(",");
    line.push('\n');
    line
}

fn push_field(line: &mut String, value: &str) {
    if value.contains([',', '"', '\n', '\r']) {
        line.push('"');
        line.push_str(&value.replace('"', "\"\""));
        line.push('"');
    } else {
        line.push_str(value);
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn opt_num(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Encode one record as a newline-terminated ledger row
pub fn encode_row(record: &SetRecord) -> String {
    let effort = if record.effort == 0 {
        String::new()
    } else {
        record.effort.to_string()
    };
    let fields: [String; 23] = [
        record.session_id.clone(),
        record.date.format(DATE_FORMAT).to_string(),
        record.time.format(TIME_FORMAT).to_string(),
        record.plan_name.clone(),
        record.day_label.clone(),
        record.segment_id.clone(),
        record.superset_id.clone().unwrap_or_default(),
        record.ex_code.clone(),
        flag(record.adlib).to_string(),
        record.set_num.to_string(),
        record.reps.clone(),
        opt_num(record.time_sec),
        record.weight.clone(),
        record.unit.clone(),
        flag(record.is_warmup).to_string(),
        record.rpe.clone(),
        record.rir.clone(),
        record.tempo.clone(),
        opt_num(record.rest_sec),
        effort,
        record.tags.clone(),
        record.notes.clone(),
        record.pr_types.clone(),
    ];

    let mut line = String::with_capacity(128);
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        push_field(&mut line, field);
    }
    line.push('\n');
    line
}

/// A parsed row with the 1-based line it started on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Split CSV text into rows, honoring quoted fields that span lines
///
/// Blank lines are dropped. An unterminated quote swallows the rest of the
/// input into its field, which the record decoder then rejects by arity.
pub fn split_rows(text: &str) -> Vec<RawRow> {
    let mut rows = Vec::new();
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut row_start = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut field));
                if !(fields.len() == 1 && fields[0].is_empty()) {
                    rows.push(RawRow {
                        line: row_start,
                        fields: std::mem::take(&mut fields),
                    });
                }
                fields.clear();
                line += 1;
                row_start = line;
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !fields.is_empty() {
        fields.push(field);
        rows.push(RawRow {
            line: row_start,
            fields,
        });
    }
    rows
}

/// Maps column names to positions in a particular file's header
#[derive(Debug, Clone)]
pub struct ColumnMap {
    positions: HashMap<String, usize>,
}

impl ColumnMap {
    /// The canonical column order
    pub fn canonical() -> Self {
        Self::from_header(&COLUMNS.map(String::from))
    }

    pub fn from_header(header: &[String]) -> Self {
        let positions = header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();
        Self { positions }
    }

    /// True when the row looks like a header we understand
    pub fn is_header(fields: &[String]) -> bool {
        fields.iter().any(|f| f.trim() == "session_id")
            && fields.iter().any(|f| f.trim() == "ex_code")
    }

    fn get<'a>(&self, fields: &'a [String], column: &str) -> &'a str {
        self.positions
            .get(column)
            .and_then(|&i| fields.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Decode a row into a record
    pub fn decode(&self, fields: &[String]) -> Result<SetRecord, String> {
        for required in ["session_id", "date", "time", "ex_code"] {
            if !self.positions.contains_key(required) {
                return Err(format!("missing column {required}"));
            }
        }
        if fields.len() < self.positions.len() {
            return Err(format!(
                "expected {} fields, found {}",
                self.positions.len(),
                fields.len()
            ));
        }

        let get = |column: &str| self.get(fields, column);
        let date = NaiveDate::parse_from_str(get("date"), DATE_FORMAT)
            .map_err(|e| format!("bad date {:?}: {e}", get("date")))?;
        let time = NaiveTime::parse_from_str(get("time"), TIME_FORMAT)
            .map_err(|e| format!("bad time {:?}: {e}", get("time")))?;
        let superset = get("superset_id");

        Ok(SetRecord {
            session_id: get("session_id").to_string(),
            date,
            time,
            plan_name: get("plan_name").to_string(),
            day_label: get("day_label").to_string(),
            segment_id: get("segment_id").to_string(),
            superset_id: (!superset.is_empty()).then(|| superset.to_string()),
            ex_code: get("ex_code").to_string(),
            adlib: parse_flag(get("adlib")),
            set_num: get("set_num").trim().parse().unwrap_or(0),
            reps: get("reps").to_string(),
            time_sec: get("time_sec").trim().parse().ok(),
            weight: get("weight").to_string(),
            unit: get("unit").to_string(),
            is_warmup: parse_flag(get("is_warmup")),
            rpe: get("rpe").to_string(),
            rir: get("rir").to_string(),
            tempo: get("tempo").to_string(),
            rest_sec: get("rest_sec").trim().parse().ok(),
            effort: clamp_effort(get("effort_1to5").trim().parse().unwrap_or(0)),
            tags: get("tags").to_string(),
            notes: get("notes").to_string(),
            pr_types: get("pr_types").to_string(),
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "TRUE" | "True" | "yes")
}

#[cfg(test)]
#[path = "csv_tests.rs"]
mod tests;
