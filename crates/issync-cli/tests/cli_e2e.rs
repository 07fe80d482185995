use std::fs;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::tempdir;

fn issync(root: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("issync").expect("binary builds");
    cmd.arg("--root").arg(root);
    cmd
}

#[test]
fn init_creates_the_workspace_layout_and_config() {
    let td = tempdir().unwrap();
    let root = td.path().join(".issues");

    issync(&root).arg("init").assert().success();

    assert!(root.join("open").is_dir());
    assert!(root.join("closed").is_dir());
    assert!(root.join(".sync").join("config.json").is_file());
}

#[test]
fn init_is_idempotent() {
    let td = tempdir().unwrap();
    let root = td.path().join(".issues");

    issync(&root).arg("init").assert().success();
    issync(&root).arg("init").assert().success();
}

#[test]
fn new_writes_a_local_draft_file_under_open() {
    let td = tempdir().unwrap();
    let root = td.path().join(".issues");
    issync(&root).arg("init").assert().success();

    issync(&root).args(["new", "Investigate flaky build"]).assert().success();

    let entries: Vec<_> = fs::read_dir(root.join("open")).unwrap().map(|e| e.unwrap().file_name().to_string_lossy().into_owned()).collect();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].starts_with("L-"));
    assert!(entries[0].ends_with("-investigate-flaky-build.md"));
}

#[test]
fn view_prints_the_created_draft_contents() {
    let td = tempdir().unwrap();
    let root = td.path().join(".issues");
    issync(&root).arg("init").assert().success();
    issync(&root).args(["new", "Triage login bug"]).assert().success();

    let path = fs::read_dir(root.join("open")).unwrap().next().unwrap().unwrap().path();
    let contents = fs::read_to_string(&path).unwrap();
    let key_line = contents.lines().find(|l| l.starts_with("key: ")).unwrap();
    let key = key_line.trim_start_matches("key: ").trim_matches('"');

    issync(&root).args(["view", key]).assert().success().stdout(contains("Triage login bug"));
}

#[test]
fn list_reports_every_issue_file() {
    let td = tempdir().unwrap();
    let root = td.path().join(".issues");
    issync(&root).arg("init").assert().success();
    issync(&root).args(["new", "First draft"]).assert().success();
    issync(&root).args(["new", "Second draft"]).assert().success();

    issync(&root).args(["--json", "list"]).assert().success().stdout(contains("\"processed\":2"));
}

#[test]
fn json_mode_emits_exactly_one_envelope_line() {
    let td = tempdir().unwrap();
    let root = td.path().join(".issues");
    issync(&root).arg("init").assert().success();

    let output = issync(&root).args(["--json", "list"]).output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines.len(), 1);
    assert!(serde_json::from_str::<serde_json::Value>(lines[0]).is_ok());
}

#[test]
fn status_on_a_pristine_pull_snapshot_reports_no_modified_issues() {
    let td = tempdir().unwrap();
    let root = td.path().join(".issues");
    issync(&root).arg("init").assert().success();
    issync(&root).args(["new", "Fresh draft"]).assert().success();

    // A fresh local-draft file with no base snapshot is reported `new`, not `modified`.
    issync(&root).args(["--json", "status", "--all"]).assert().success().stdout(contains("\"action\":\"status\""));
}
