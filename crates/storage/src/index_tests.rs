// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use setlog_core::{SessionContext, SetInput};
use yare::parameterized;

fn record(code: &str, day: u32, s: u32, weight: &str, reps: &str) -> SetRecord {
    let at = NaiveDate::from_ymd_opt(2026, 3, day)
        .and_then(|d| d.and_hms_opt(10, 0, s))
        .unwrap();
    SessionContext::new("s-1", "5x5", "A").adlib_record(code, 1, &SetInput::new(weight, reps), at)
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

#[test]
fn apply_commit_keeps_newest_two_first() {
    let mut index = LastTwoIndex::new();
    index.apply_commit(&record("BENCH", 1, 0, "125", "5"));
    index.apply_commit(&record("BENCH", 2, 0, "130", "5"));
    index.apply_commit(&record("BENCH", 3, 0, "135", "5"));

    let last = index.fetch_last_two("BENCH");
    assert_eq!(last.len(), 2);
    assert_eq!(last[0].weight, "135");
    assert_eq!(last[1].weight, "130");
    assert_eq!(index.latest("BENCH").map(|e| e.date), Some(day(3)));
}

#[test]
fn apply_commit_dedups_by_signature() {
    let mut index = LastTwoIndex::new();
    index.apply_commit(&record("BENCH", 1, 0, "125", "5"));
    index.apply_commit(&record("BENCH", 2, 0, "130", "5"));
    index.apply_commit(&record("BENCH", 2, 0, "140", "3"));

    let last = index.fetch_last_two("BENCH");
    assert_eq!(last.len(), 2);
    assert_eq!(last[0].weight, "140");
    assert_eq!(last[0].reps, "3");
    assert_eq!(last[1].weight, "125");
    let same_sig = last.iter().filter(|e| e.date == day(2)).count();
    assert_eq!(same_sig, 1);
}

#[parameterized(
    no_weight = { "", "5" },
    blank_weight = { "  ", "5" },
    no_reps = { "135", "" },
)]
fn apply_commit_ignores_unloaded_sets(weight: &str, reps: &str) {
    let mut index = LastTwoIndex::new();
    assert!(!index.apply_commit(&record("BENCH", 1, 0, weight, reps)));
    assert!(index.is_empty());
}

#[test]
fn apply_commit_accepts_text_reps() {
    let mut index = LastTwoIndex::new();
    assert!(index.apply_commit(&record("PULLUP", 1, 0, "-20", "AMRAP")));
    assert_eq!(index.latest("PULLUP").map(|e| e.reps.as_str()), Some("AMRAP"));
}

#[parameterized(
    zero_weight = { "0", "5", false },
    negative_weight = { "-20", "5", false },
    text_weight = { "bw", "5", false },
    text_reps = { "135", "AMRAP", false },
    zero_reps = { "135", "0", false },
    range_reps = { "135", "8-10", true },
    decimal_weight = { "62.5", "5", true },
)]
fn rebuild_qualification(weight: &str, reps: &str, kept: bool) {
    let records = [record("BENCH", 1, 0, weight, reps)];
    let index = LastTwoIndex::rebuild(&records);
    assert_eq!(!index.is_empty(), kept);
}

#[test]
fn rebuild_orders_by_timestamp_not_file_order() {
    let records = [
        record("SQUAT", 5, 0, "225", "5"),
        record("SQUAT", 9, 0, "235", "5"),
        record("SQUAT", 2, 0, "215", "5"),
        record("SQUAT", 7, 0, "230", "5"),
    ];
    let index = LastTwoIndex::rebuild(&records);
    let last = index.fetch_last_two("SQUAT");
    assert_eq!(last[0].weight, "235");
    assert_eq!(last[1].weight, "230");
}

#[test]
fn rebuild_includes_warmups() {
    let mut warmup = record("SQUAT", 5, 0, "95", "5");
    warmup.is_warmup = true;
    let index = LastTwoIndex::rebuild([&warmup]);
    assert_eq!(index.latest("SQUAT").map(|e| e.weight.as_str()), Some("95"));
}

#[test]
fn rebuild_is_byte_deterministic() {
    let records = [
        record("SQUAT", 5, 0, "225", "5"),
        record("BENCH", 5, 30, "135", "5"),
        record("DEAD", 6, 0, "315", "3"),
    ];
    let a = LastTwoIndex::rebuild(&records).to_json_bytes().unwrap();
    let b = LastTwoIndex::rebuild(&records).to_json_bytes().unwrap();
    assert_eq!(a, b);
}

#[test]
fn recent_filters_window_and_sorts() {
    let mut index = LastTwoIndex::new();
    index.apply_commit(&record("OLD", 1, 0, "50", "5"));
    index.apply_commit(&record("BENCH", 10, 0, "135", "5"));
    index.apply_commit(&record("SQUAT", 12, 0, "225", "5"));
    index.apply_commit(&record("DEAD", 12, 0, "315", "5"));

    let recent = index.recent(day(14), 7, 10);
    let codes: Vec<&str> = recent.iter().map(|(c, _)| c.as_str()).collect();
    assert_eq!(codes, vec!["DEAD", "SQUAT", "BENCH"]);

    let limited = index.recent(day(14), 7, 1);
    assert_eq!(limited.len(), 1);
}

#[test]
fn persisted_format_maps_code_to_entries() {
    let mut index = LastTwoIndex::new();
    index.apply_commit(&record("BENCH", 1, 0, "135", "5"));
    let value: serde_json::Value = serde_json::from_slice(&index.to_json_bytes().unwrap()).unwrap();

    let entry = &value["BENCH"][0];
    assert_eq!(entry["date"], "2026-03-01");
    assert_eq!(entry["time"], "10:00:00");
    assert_eq!(entry["weight"], "135");
    assert_eq!(entry["reps"], "5");
    assert_eq!(entry["effort"], 0);
}

#[test]
fn store_roundtrips_index_and_watermark() {
    let dir = tempfile::tempdir().unwrap();
    let store = IndexStore::new(dir.path().join("index.json"), dir.path().join("wm.json"));
    let mut index = LastTwoIndex::new();
    index.apply_commit(&record("BENCH", 1, 0, "135", "5"));

    store.persist(&index, 4096).unwrap();
    let (loaded, watermark) = store.load();
    assert_eq!(loaded, index);
    assert_eq!(watermark, Some(Watermark { ledger_bytes: 4096 }));
}

#[test]
fn corrupt_index_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = IndexStore::new(dir.path().join("index.json"), dir.path().join("wm.json"));
    std::fs::write(store.index_path(), b"{not json").unwrap();

    let (loaded, watermark) = store.load();
    assert!(loaded.is_empty());
    assert_eq!(watermark, None);
}
