// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::plan::{PrescribedItem, SetInput};
use proptest::prelude::*;

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 14)
        .and_then(|d| d.and_hms_opt(h, m, s))
        .unwrap()
}

fn context() -> SessionContext {
    SessionContext::new("s-1", "5x5", "Day A")
}

fn bench_item() -> PrescribedItem {
    PrescribedItem {
        ex_code: "BENCH".to_string(),
        set_index: 2,
        segment_id: "main".to_string(),
        superset_id: Some("ss1".to_string()),
        target_unit: "lb".to_string(),
    }
}

#[test]
fn record_for_copies_plan_item() {
    let record = context().record_for(&bench_item(), &SetInput::new(" 135 ", "5"), at(10, 0, 0));

    assert_eq!(record.session_id, "s-1");
    assert_eq!(record.ex_code, "BENCH");
    assert_eq!(record.set_num, 2);
    assert_eq!(record.superset_id.as_deref(), Some("ss1"));
    assert_eq!(record.unit, "lb");
    assert_eq!(record.weight, "135");
    assert!(!record.adlib);
}

#[test]
fn unit_override_beats_target_unit() {
    let input = SetInput::new("60", "5").unit("kg");
    let record = context().record_for(&bench_item(), &input, at(10, 0, 0));
    assert_eq!(record.unit, "kg");
}

#[test]
fn adlib_records_are_flagged() {
    let record = context().adlib_record("CURL", 1, &SetInput::new("25", "12"), at(10, 0, 0));
    assert!(record.adlib);
    assert_eq!(record.segment_id, crate::plan::ADLIB_SEGMENT);
    assert_eq!(record.superset_id, None);
}

#[test]
fn effort_is_clamped() {
    let input = SetInput::new("135", "5").effort(9);
    let record = context().record_for(&bench_item(), &input, at(10, 0, 0));
    assert_eq!(record.effort, MAX_EFFORT);
}

#[test]
fn subsecond_precision_is_dropped() {
    let precise = at(10, 0, 0) + chrono::Duration::milliseconds(750);
    let record = context().record_for(&bench_item(), &SetInput::new("135", "5"), precise);
    assert_eq!(record.time.to_string(), "10:00:00");
}

#[test]
fn has_load_requires_weight_and_reps() {
    let base = context().record_for(&bench_item(), &SetInput::new("135", "5"), at(10, 0, 0));
    assert!(base.has_load());

    let mut no_weight = base.clone();
    no_weight.weight = " ".to_string();
    assert!(!no_weight.has_load());

    let mut no_reps = base;
    no_reps.reps.clear();
    assert!(!no_reps.has_load());
}

#[test]
fn journal_json_uses_camel_case() {
    let record = context().record_for(&bench_item(), &SetInput::new("135", "5"), at(10, 0, 0));
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["exCode"], "BENCH");
    assert_eq!(json["date"], "2026-03-14");
    assert_eq!(json["time"], "10:00:00");
    assert_eq!(json["isWarmup"], false);
}

proptest! {
    #[test]
    fn with_timestamp_roundtrips_whole_seconds(secs in 0u32..86_400) {
        let ts = at(0, 0, 0) + chrono::Duration::seconds(i64::from(secs));
        let record = context().record_for(&bench_item(), &SetInput::new("1", "1"), at(0, 0, 0));
        prop_assert_eq!(record.with_timestamp(ts).timestamp(), ts);
    }
}
