//! Error reporting specs

use crate::prelude::*;

#[test]
fn unknown_command_fails() {
    let data = DataDir::new();
    data.setlog().args(&["lift"]).fails();
}

#[test]
fn invalid_config_is_reported_with_suggestion() {
    let data = DataDir::new();
    data.file("setlog.toml", "grace = 3\n");
    data.setlog()
        .args(&["last", "SQUAT"])
        .fails()
        .stderr_has("error: invalid config")
        .stderr_has("Check setlog.toml");
}

#[test]
fn import_of_missing_file_fails() {
    let data = DataDir::new();
    data.setlog()
        .args(&["import", "/nonexistent/ledger.csv"])
        .fails()
        .stderr_has("error:");
}

#[test]
fn bad_session_lines_are_reported_and_skipped() {
    let data = DataDir::new();
    let run = data.session("save SQUAT\nsave SQUAT 225 5\n");
    let run = run.stdout_has("Staged #1 SQUAT");
    assert!(run.stderr.contains("usage: save"), "stderr:\n{}", run.stderr);
}
