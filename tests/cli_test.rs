//! Integration tests for the prereqs binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn setup_project(manifest: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("prereqs.yml"), manifest).unwrap();
    temp
}

fn prereqs(temp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("prereqs"));
    cmd.current_dir(temp.path());
    cmd.env("SHELL", "/bin/sh");
    cmd.env("NO_COLOR", "1");
    cmd
}

const SIMPLE_MANIFEST: &str = r#"
settings:
  tick_interval_ms: 50
steps:
  - name: Say hello
    message: Saying hello
    commands: ["echo hello"]
  - name: Nothing here
    command_template: "install {version}"
"#;

const NODE_MANIFEST: &str = r#"
constraints:
  - family: node@18
    min_version: 18
  - family: node@20
    min_version: 20
    preferred: "20.11"
steps:
  - name: Install Node {version}
    strategy: synthetic
    estimated_duration_ms: 30000
    command_template: "fnm install {version}"
    family: node
"#;

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("prereqs"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Usage: prereqs"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("schema"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin("prereqs"));
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
#[cfg(unix)]
fn cli_no_args_runs_manifest() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(SIMPLE_MANIFEST);
    prereqs(&temp)
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Say hello"))
        .stdout(predicate::str::contains("⊘ Nothing here (nothing to run)"))
        .stdout(predicate::str::contains("1 step(s) completed, 1 skipped"));
    Ok(())
}

#[test]
#[cfg(unix)]
fn cli_run_failure_exits_with_1() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project("steps:\n  - name: Broken\n    commands: [\"exit 3\"]\n");
    prereqs(&temp)
        .arg("run")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("✗ Broken"))
        .stderr(predicate::str::contains("exited with code 3"));
    Ok(())
}

#[test]
#[cfg(unix)]
fn cli_run_quiet_prints_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(SIMPLE_MANIFEST);
    prereqs(&temp)
        .args(["run", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    Ok(())
}

#[test]
fn cli_missing_manifest_exits_with_2() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    prereqs(&temp)
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No manifest found"));
    Ok(())
}

#[test]
fn cli_invalid_manifest_exits_with_2() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project("steps:\n  - name: Slow\n    strategy: synthetic\n");
    prereqs(&temp)
        .arg("plan")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid step 'Slow'"));
    Ok(())
}

#[test]
fn cli_plan_lists_expanded_steps() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(NODE_MANIFEST);
    prereqs(&temp)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("node@18 18"))
        .stdout(predicate::str::contains("[1/2] Install Node 18 (synthetic)"))
        .stdout(predicate::str::contains("fnm install 20.11"));
    Ok(())
}

#[test]
fn cli_plan_json() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(NODE_MANIFEST);
    let output = prereqs(&temp).args(["plan", "--json"]).output()?;
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["versions"]["families"]["node@20"], "20.11");
    assert_eq!(json["steps"][0]["commands"][0], "fnm install 18");
    Ok(())
}

#[test]
fn cli_plan_reports_conflict() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(
        "constraints:\n  - family: node\n    min_version: 20\n  - family: node\n    min_version: 16\n    max_version: 18\n",
    );
    prereqs(&temp)
        .arg("plan")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("node"));
    Ok(())
}

#[test]
fn cli_custom_manifest_path() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("tools.json"), r#"{"steps": [{"name": "Listed"}]}"#)?;
    prereqs(&temp)
        .args(["plan", "--config", "tools.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Listed"));
    Ok(())
}

#[test]
fn cli_schema_is_json() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let output = prereqs(&temp).arg("schema").output()?;
    assert!(output.status.success());

    let schema: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert!(schema["properties"]["steps"].is_object());
    Ok(())
}
