// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{NaiveDate, NaiveDateTime};
use setlog_core::{SessionContext, SetInput};
use tempfile::TempDir;

fn at(s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 14)
        .and_then(|d| d.and_hms_opt(10, 0, s))
        .unwrap()
}

fn squat(session: &str, s: u32) -> SetRecord {
    SessionContext::new(session, "5x5", "A").adlib_record("SQUAT", 1, &SetInput::new("225", "5"), at(s))
}

fn spawn_ledger() -> (TempDir, LedgerHandle) {
    let dir = TempDir::new().unwrap();
    let ledger = Ledger::open(&dir.path().join("ledger.csv")).unwrap();
    let handle = LedgerHandle::spawn(ledger, Duration::from_secs(1), FaultSink::default());
    (dir, handle)
}

#[tokio::test(start_paused = true)]
async fn burst_of_appends_costs_one_flush() {
    let (_dir, ledger) = spawn_ledger();
    for s in 0..5 {
        ledger.append(squat("s-1", s * 10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    let stats = ledger.stats().await.unwrap();
    assert_eq!(stats.writes, 5);
    assert_eq!(stats.flushes, 0);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let stats = ledger.stats().await.unwrap();
    assert_eq!(stats.flushes, 1);
    assert_eq!(stats.failed_flushes, 0);
}

#[tokio::test(start_paused = true)]
async fn sync_now_flushes_without_waiting() {
    let (_dir, ledger) = spawn_ledger();
    ledger.append(squat("s-1", 0)).await.unwrap();
    ledger.sync_now().await.unwrap();
    assert_eq!(ledger.stats().await.unwrap().flushes, 1);

    // The cancelled timer does not flush again
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(ledger.stats().await.unwrap().flushes, 1);
}

#[tokio::test]
async fn append_returns_bumped_record() {
    let (_dir, ledger) = spawn_ledger();
    let first = ledger.append(squat("s-1", 0)).await.unwrap();
    let second = ledger.append(squat("s-1", 0)).await.unwrap();
    assert_eq!(first.time.to_string(), "10:00:00");
    assert_eq!(second.time.to_string(), "10:00:01");
}

#[tokio::test]
async fn session_records_filter_by_session() {
    let (_dir, ledger) = spawn_ledger();
    ledger.append(squat("s-1", 0)).await.unwrap();
    ledger.append(squat("s-2", 5)).await.unwrap();
    ledger.append(squat("s-1", 10)).await.unwrap();

    let records = ledger.session_records("s-1").await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.session_id == "s-1"));
}

#[tokio::test]
async fn shutdown_flushes_outstanding_writes() {
    let (_dir, ledger) = spawn_ledger();
    ledger.append(squat("s-1", 0)).await.unwrap();
    let handle = ledger.clone();
    ledger.shutdown().await;
    assert!(matches!(handle.size().await, Err(EngineError::ActorGone("ledger"))));
}

#[tokio::test]
async fn replace_swaps_the_file() {
    let (dir, ledger) = spawn_ledger();
    ledger.append(squat("s-1", 0)).await.unwrap();
    ledger.append(squat("s-1", 10)).await.unwrap();

    let snapshot = dir.path().join("snapshot.csv");
    {
        let mut other = Ledger::open(&snapshot).unwrap();
        other.append(squat("s-9", 0)).unwrap();
        other.sync().unwrap();
    }

    ledger.replace_with(&snapshot).await.unwrap();
    assert!(ledger.session_records("s-1").await.unwrap().is_empty());
    assert_eq!(ledger.session_records("s-9").await.unwrap().len(), 1);
}
