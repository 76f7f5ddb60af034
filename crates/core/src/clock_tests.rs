// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::NaiveDate;
use std::time::Duration as StdDuration;

fn ten_am() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 14)
        .and_then(|d| d.and_hms_opt(10, 0, 0))
        .unwrap()
}

#[test]
fn system_clock_returns_increasing_time() {
    let clock = SystemClock;
    let t1 = clock.now();
    std::thread::sleep(StdDuration::from_millis(2));
    let t2 = clock.now();
    assert!(t2 > t1);
}

#[test]
fn fake_clock_can_be_advanced() {
    let clock = FakeClock::at(ten_am());
    clock.advance(StdDuration::from_secs(60));
    assert_eq!(clock.local_now().to_string(), "2026-03-14 10:01:00");
}

#[test]
fn fake_clock_is_cloneable_and_shared() {
    let clock1 = FakeClock::at(ten_am());
    let clock2 = clock1.clone();
    clock2.advance(StdDuration::from_secs(30));
    assert_eq!(clock1.local_now(), clock2.local_now());
    assert_eq!(clock1.local_now().to_string(), "2026-03-14 10:00:30");
}

#[test]
fn fake_clock_utc_matches_local() {
    let clock = FakeClock::at(ten_am());
    assert_eq!(clock.now().naive_utc(), ten_am());
}
