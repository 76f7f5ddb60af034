//! History query specs

use crate::prelude::*;

#[test]
fn last_with_no_history() {
    let data = DataDir::new();
    data.setlog()
        .args(&["last", "squat"])
        .passes()
        .stdout_eq("No history for SQUAT\n");
}

#[test]
fn last_shows_two_most_recent_completions() {
    let data = DataDir::new();
    data.session("save SQUAT 215 5\nsave SQUAT 220 5\nsave SQUAT 225 5\n");

    let run = data.setlog().args(&["last", "SQUAT"]).passes();
    let lines: Vec<&str> = run.stdout.lines().collect();
    assert_eq!(lines.len(), 2, "stdout:\n{}", run.stdout);
    assert!(lines[0].ends_with("225 x 5"));
    assert!(lines[1].ends_with("220 x 5"));
}

#[test]
fn last_as_json() {
    let data = DataDir::new();
    data.session("save BENCH 135 8 4\n");

    let run = data.setlog().args(&["last", "BENCH", "-o", "json"]).passes();
    let json: serde_json::Value = serde_json::from_str(&run.stdout).unwrap();
    assert_eq!(json[0]["exCode"], "BENCH");
    assert_eq!(json[0]["weight"], "135");
    assert_eq!(json[0]["effort"], 4);
}

#[test]
fn recent_lists_newest_first() {
    let data = DataDir::new();
    data.session("save ROW 95 8\nsave DL 315 3\n");

    let run = data.setlog().args(&["recent"]).passes();
    let codes: Vec<&str> = run
        .stdout
        .lines()
        .filter_map(|l| l.split_whitespace().next())
        .collect();
    assert_eq!(codes, vec!["DL", "ROW"]);
}

#[test]
fn recent_on_empty_ledger() {
    let data = DataDir::new();
    data.setlog()
        .args(&["recent", "--days", "3"])
        .passes()
        .stdout_eq("Nothing in the last 3 days\n");
}
