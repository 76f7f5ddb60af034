//! Crash recovery specs
//!
//! A crash is simulated by leaving session metadata with a pending set
//! behind, as an interrupted process would.

use crate::prelude::*;

const PENDING_SESSION: &str = r#"{
  "sessionId": "20260314-crashed",
  "planName": "5x5",
  "dayLabel": "A",
  "startedAt": "2026-03-14T10:00:00Z",
  "nextSequence": 2,
  "pending": [
    {
      "sequence": 1,
      "stagedAt": "2026-03-14T10:05:00Z",
      "deadline": "2026-03-14T10:05:05Z",
      "record": {
        "sessionId": "20260314-crashed",
        "date": "2026-03-14",
        "time": "10:05:00",
        "planName": "5x5",
        "dayLabel": "A",
        "segmentId": "adlib",
        "exCode": "SQUAT",
        "adlib": true,
        "setNum": 1,
        "reps": "5",
        "weight": "225",
        "unit": "lb",
        "effort": 3
      }
    }
  ]
}"#;

#[test]
fn recover_commits_expired_pending_sets() {
    let data = DataDir::new();
    data.file("session.json", PENDING_SESSION);

    data.setlog()
        .args(&["recover"])
        .passes()
        .stdout_has("Session 20260314-crashed: 1 committed");

    let rows = ledger_rows(&data);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].starts_with("20260314-crashed,2026-03-14,10:05:00,"));
}

#[test]
fn recovery_is_idempotent() {
    let data = DataDir::new();
    data.file("session.json", PENDING_SESSION);

    data.setlog().args(&["recover"]).passes();
    data.setlog()
        .args(&["recover"])
        .passes()
        .stdout_has("0 committed");
    assert_eq!(ledger_rows(&data).len(), 1);
}

#[test]
fn recover_without_session_is_a_no_op() {
    let data = DataDir::new();
    data.setlog()
        .args(&["recover"])
        .passes()
        .stdout_eq("No session to recover\n");
}

#[test]
fn resumed_session_keeps_its_id() {
    let data = DataDir::new();
    data.file("session.json", PENDING_SESSION);
    data.setlog()
        .args(&["session", "--resume"])
        .stdin("save SQUAT 230 5\n")
        .passes()
        .stdout_has("Session 20260314-crashed resumed")
        .stdout_has("Staged #2 SQUAT set 2: 230 x 5");

    let rows = ledger_rows(&data);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.starts_with("20260314-crashed,")));
}
