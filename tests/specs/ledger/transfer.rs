//! Export, import and index rebuild specs

use crate::prelude::*;

const IMPORTED: &str = "\
session_id,date,time,plan_name,day_label,segment_id,superset_id,ex_code,adlib,set_num,reps,time_sec,weight,unit,is_warmup,rpe,rir,tempo,rest_sec,effort_1to5,tags,notes,pr_types
old-1,2025-01-06,18:00:00,SS,A,main,,PRESS,0,1,5,,95,lb,0,,,,,,,,
old-1,2025-01-06,18:03:00,SS,A,main,,PRESS,0,2,5,,100,lb,0,,,,,,,,
old-1,2025-01-06,18:06:00,SS,A,main,,PRESS,0,3,5,,105,lb,0,,,,,,,,
";

#[test]
fn export_writes_a_readable_copy() {
    let data = DataDir::new();
    data.session("save SQUAT 225 5\n");

    let dest = data.join("backup/export.csv");
    std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
    data.setlog()
        .args(&["export", dest.to_str().unwrap()])
        .passes()
        .stdout_has("Exported");

    assert_eq!(std::fs::read_to_string(&dest).unwrap(), data.read("ledger.csv"));
}

#[test]
fn import_replaces_history() {
    let data = DataDir::new();
    data.session("save SQUAT 225 5\n");
    data.file("import.csv", IMPORTED);
    let src = data.join("import.csv");

    data.setlog()
        .args(&["import", src.to_str().unwrap()])
        .passes()
        .stdout_eq("Imported 3 rows (0 skipped), 1 exercises indexed\n");

    data.setlog()
        .args(&["last", "SQUAT"])
        .passes()
        .stdout_has("No history for SQUAT");
    let run = data.setlog().args(&["last", "PRESS"]).passes();
    let lines: Vec<&str> = run.stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("105 lb x 5"));
    assert!(lines[1].contains("100 lb x 5"));
}

#[test]
fn rebuild_index_after_external_edit() {
    let data = DataDir::new();
    data.file("ledger.csv", IMPORTED);

    data.setlog()
        .args(&["rebuild-index"])
        .passes()
        .stdout_eq("Index rebuilt: 1 exercises\n");
    data.setlog()
        .args(&["last", "PRESS"])
        .passes()
        .stdout_has("105 lb x 5");
}

#[test]
fn shrunken_ledger_is_detected_on_startup() {
    let data = DataDir::new();
    data.session("save SQUAT 225 5\n");
    let header = IMPORTED.lines().next().unwrap();
    data.file("ledger.csv", &format!("{header}\n"));

    // No explicit rebuild: startup notices the ledger no longer matches
    data.setlog()
        .args(&["last", "SQUAT"])
        .passes()
        .stdout_has("No history for SQUAT");
}
