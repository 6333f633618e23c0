//! Exit codes and output of the `lintpilot` binary.

use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

fn lintpilot() -> Command {
    let mut cmd = Command::cargo_bin("lintpilot").unwrap();
    cmd.env_remove("RUST_LOG").env_remove("LINTPILOT_STATE_DIR");
    cmd
}

#[test]
fn explain_prints_classification() {
    let output = lintpilot()
        .args(["explain", "F401", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["classification"]["category"], "safe");
    assert_eq!(value["mechanical_fix"], true);
}

#[test]
fn explain_rejects_unknown_language() {
    lintpilot()
        .args(["explain", "F401", "--language", "cobol"])
        .assert()
        .failure();
}

#[test]
fn init_writes_config_once() {
    let dir = TempDir::new().unwrap();
    lintpilot().current_dir(dir.path()).arg("init").assert().success();
    assert!(dir.path().join(".lintpilot.toml").exists());

    lintpilot().current_dir(dir.path()).arg("init").assert().failure();
    lintpilot()
        .current_dir(dir.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

#[test]
fn stats_on_empty_state_dir_succeeds() {
    let state = TempDir::new().unwrap();
    let output = lintpilot()
        .args(["stats", "--format", "json", "--state-dir"])
        .arg(state.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["total_runs"], 0);
}

#[test]
fn invalid_config_fails_before_touching_files() {
    let repo = TempDir::new().unwrap();
    let state = TempDir::new().unwrap();
    fs::write(repo.path().join(".lintpilot.toml"), "[fix]\nmax_shrink_ratio = 7.0\n").unwrap();
    fs::write(repo.path().join("a.py"), "x = 1  \n").unwrap();

    lintpilot()
        .arg("run")
        .arg(repo.path())
        .arg("--apply")
        .arg("--state-dir")
        .arg(state.path())
        .assert()
        .failure();

    assert_eq!(fs::read_to_string(repo.path().join("a.py")).unwrap(), "x = 1  \n");
}

#[test]
fn missing_repository_is_an_error() {
    let state = TempDir::new().unwrap();
    lintpilot()
        .args(["run", "/definitely/not/a/repo", "--state-dir"])
        .arg(state.path())
        .assert()
        .failure();
}

#[test]
fn unknown_config_key_is_rejected() {
    let repo = TempDir::new().unwrap();
    fs::write(repo.path().join("lintpilot.toml"), "[fix]\nmax_isues = 3\n").unwrap();

    lintpilot()
        .arg("run")
        .arg(repo.path())
        .arg("--config")
        .arg(repo.path().join("lintpilot.toml"))
        .assert()
        .failure();
}
