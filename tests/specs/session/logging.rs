//! Interactive session specs

use crate::prelude::*;

#[test]
fn saved_sets_reach_the_ledger_after_quit() {
    let data = DataDir::new();
    data.session("save SQUAT 225 5 4\nsave BENCH 135 8\nquit\n")
        .stdout_has("Session ")
        .stdout_has("Staged #1 SQUAT set 1: 225 x 5")
        .stdout_has("Staged #2 BENCH set 1: 135 x 8")
        .stdout_has("closed");

    let rows = ledger_rows(&data);
    assert_eq!(rows.len(), 2);
    assert!(rows[0].contains(",SQUAT,"));
    assert!(rows[1].contains(",BENCH,"));
}

#[test]
fn end_of_input_behaves_like_quit() {
    let data = DataDir::new();
    data.session("save DL 315 3\n").stdout_has("closed");
    assert_eq!(ledger_rows(&data).len(), 1);
}

#[test]
fn undo_keeps_the_set_out_of_the_ledger() {
    let data = DataDir::new();
    data.session("save SQUAT 225 5\nsave SQUAT 230 5\nundo\nundo\nundo\n")
        .stdout_has("Undone #2 SQUAT")
        .stdout_has("Undone #1 SQUAT")
        .stdout_has("Nothing to undo");

    assert!(ledger_rows(&data).is_empty());
}

#[test]
fn repeated_sets_in_one_second_get_distinct_times() {
    let data = DataDir::new();
    data.session("save CURL 30 10\nsave CURL 30 10\nsave CURL 30 10\n");

    let rows = ledger_rows(&data);
    assert_eq!(rows.len(), 3);
    let times: std::collections::HashSet<&str> = rows
        .iter()
        .map(|r| r.split(',').nth(2).unwrap())
        .collect();
    assert_eq!(times.len(), 3);
}

#[test]
fn next_walks_the_prescribed_items() {
    let data = DataDir::new();
    data.file(
        "day.json",
        r#"[
  {"exCode": "SQUAT", "setIndex": 1, "segmentId": "main", "targetUnit": "lb"},
  {"exCode": "SQUAT", "setIndex": 2, "segmentId": "main", "targetUnit": "lb"}
]"#,
    );
    let items = data.join("day.json");
    data.setlog()
        .args(&["session", "--plan", "5x5", "--day", "A", "--items"])
        .args(&[items.to_str().unwrap()])
        .stdin("next 225 5\nundo\nnext 220 5\nnext 220 5\nnext 220 5\n")
        .passes()
        .stdout_has("Staged #1 SQUAT set 1: 225 x 5")
        .stdout_has("Staged #2 SQUAT set 1: 220 x 5")
        .stdout_has("Staged #3 SQUAT set 2: 220 x 5")
        .stdout_has("Plan complete");

    let rows = ledger_rows(&data);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.contains(",5x5,A,main,")));
}

#[test]
fn last_inside_a_session_sees_committed_history() {
    let data = DataDir::new();
    data.session("save OHP 95 5\n");
    data.session("last OHP\n")
        .stdout_has("OHP")
        .stdout_has("95 x 5");
}
