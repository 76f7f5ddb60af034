//! Help output specs

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    let data = DataDir::new();
    data.setlog()
        .args(&["--help"])
        .passes()
        .stdout_has("session")
        .stdout_has("last")
        .stdout_has("recent")
        .stdout_has("export")
        .stdout_has("import")
        .stdout_has("rebuild-index")
        .stdout_has("recover");
}

#[test]
fn session_help_describes_items_file() {
    let data = DataDir::new();
    data.setlog()
        .args(&["session", "--help"])
        .passes()
        .stdout_has("--items")
        .stdout_has("--resume");
}
