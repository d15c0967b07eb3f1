#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn o2d(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("o2d").unwrap();
    cmd.current_dir(dir.path())
        .env("O2D_ROOT", dir.path())
        .env_remove("O2D_SCENARIO");
    cmd
}

fn write_scenario(dir: &TempDir, yaml: &str) {
    std::fs::create_dir_all(dir.path().join(".o2d")).unwrap();
    std::fs::write(dir.path().join(".o2d/scenario.yaml"), yaml).unwrap();
}

const TWO_STAGE: &str = r#"
name: two-stage
title: Dock drill
stages:
  - name: A
    completion_message: A done
    delays:
      - reason: low-stock
        action: restock
        duration: 1
        touchpoints: 1
      - reason: no-dock
        action: find a dock
        duration: 2
        touchpoints: 1
  - name: B
    completion_message: B done
"#;

// ---------------------------------------------------------------------------
// o2d init
// ---------------------------------------------------------------------------

#[test]
fn init_writes_default_scenario() {
    let dir = TempDir::new().unwrap();
    o2d(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote scenario 'o2d-default'"));

    let content = std::fs::read_to_string(dir.path().join(".o2d/scenario.yaml")).unwrap();
    assert!(content.contains("Customer funds unavailable"));
    let parsed: serde_yaml::Value = serde_yaml::from_str(&content).unwrap();
    assert_eq!(parsed["name"].as_str(), Some("o2d-default"));
}

#[test]
fn init_does_not_overwrite_without_force() {
    let dir = TempDir::new().unwrap();
    write_scenario(&dir, TWO_STAGE);

    o2d(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    let content = std::fs::read_to_string(dir.path().join(".o2d/scenario.yaml")).unwrap();
    assert!(content.contains("two-stage"));

    o2d(&dir).args(["init", "--force"]).assert().success();
    let content = std::fs::read_to_string(dir.path().join(".o2d/scenario.yaml")).unwrap();
    assert!(content.contains("o2d-default"));
}

// ---------------------------------------------------------------------------
// o2d scenario show / validate
// ---------------------------------------------------------------------------

#[test]
fn scenario_show_builtin() {
    let dir = TempDir::new().unwrap();
    o2d(&dir)
        .args(["scenario", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1: Order processing"))
        .stdout(predicate::str::contains("Step 4: Reached Customer"))
        .stdout(predicate::str::contains("POD entry delayed"));
}

#[test]
fn scenario_show_json_uses_file() {
    let dir = TempDir::new().unwrap();
    write_scenario(&dir, TWO_STAGE);
    let output = o2d(&dir)
        .args(["--json", "scenario", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["name"], "two-stage");
    assert_eq!(json["stages"][0]["delays"][1]["reason"], "no-dock");
    assert_eq!(json["policy"], "strict");
}

#[test]
fn scenario_flag_overrides_root_file() {
    let dir = TempDir::new().unwrap();
    write_scenario(&dir, TWO_STAGE);
    let other = dir.path().join("other.yaml");
    std::fs::write(&other, "name: other\nstages:\n  - name: Solo\n").unwrap();

    o2d(&dir)
        .args(["scenario", "show", "--scenario"])
        .arg(&other)
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1: Solo"));
}

#[test]
fn scenario_validate_reports_errors() {
    let dir = TempDir::new().unwrap();
    write_scenario(
        &dir,
        r#"
name: dupes
stages:
  - name: A
    delays:
      - reason: x
        action: a
        duration: 1
      - reason: x
        action: b
        duration: 1
"#,
    );
    o2d(&dir)
        .args(["scenario", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error] duplicate delay reason 'x'"));
}

#[test]
fn scenario_validate_prints_each_warning_once() {
    let dir = TempDir::new().unwrap();
    write_scenario(&dir, "name: quiet\nstages:\n  - name: Solo\n");
    let warning = "stage 'Solo' has no delays";
    o2d(&dir)
        .args(["scenario", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("[warning] {warning}")))
        .stderr(predicate::str::contains(warning).not());

    o2d(&dir)
        .arg("run")
        .assert()
        .success()
        .stderr(predicate::str::contains(warning));
}

#[test]
fn scenario_validate_builtin_is_clean() {
    let dir = TempDir::new().unwrap();
    o2d(&dir)
        .args(["scenario", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn missing_scenario_file_fails() {
    let dir = TempDir::new().unwrap();
    o2d(&dir)
        .args(["scenario", "show", "--scenario", "missing.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("scenario not found"));
}

// ---------------------------------------------------------------------------
// o2d play
// ---------------------------------------------------------------------------

#[test]
fn play_two_stage_walkthrough() {
    let dir = TempDir::new().unwrap();
    write_scenario(&dir, TWO_STAGE);
    o2d(&dir)
        .arg("play")
        .write_stdin("advance\nfix low-stock\nadvance\nfix no-dock\nadvance\nadvance\nadvance\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome to Dock drill"))
        .stdout(predicate::str::contains("Step 2: B"))
        .stdout(predicate::str::contains("Total: 3 hours, 2 touchpoint(s)"))
        .stdout(predicate::str::contains("error: order already delivered"));
}

#[test]
fn play_strict_blocks_then_permissive_pushes() {
    let dir = TempDir::new().unwrap();
    write_scenario(&dir, TWO_STAGE);
    o2d(&dir)
        .arg("play")
        .write_stdin("advance\nadvance\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("must be fixed before advancing"));

    o2d(&dir)
        .args(["play", "--permissive"])
        .write_stdin("advance\nadvance\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Delay in A: no-dock"));
}

#[test]
fn play_fixes_reason_with_colon() {
    let dir = TempDir::new().unwrap();
    write_scenario(
        &dir,
        r#"
name: traffic
stages:
  - name: A
    delays:
      - reason: "Traffic: road blocks"
        action: reroute
        duration: 2
        touchpoints: 1
  - name: B
"#,
    );
    o2d(&dir)
        .arg("play")
        .write_stdin("advance\nfix Traffic: road blocks\nadvance\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fixed: Traffic: road blocks in A -> +2 hrs"))
        .stdout(predicate::str::contains("Step 2: B"))
        .stdout(predicate::str::contains("error:").not());
}

#[test]
fn play_json_lines() {
    let dir = TempDir::new().unwrap();
    write_scenario(&dir, TWO_STAGE);
    let output = o2d(&dir)
        .args(["play", "--json"])
        .write_stdin("advance\nfix never-seen\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["outcome"], "delay_surfaced");
    assert!(lines[1]["error"]
        .as_str()
        .unwrap()
        .contains("unknown stage or reason"));
}

// ---------------------------------------------------------------------------
// o2d run
// ---------------------------------------------------------------------------

#[test]
fn run_builtin_to_delivery() {
    let dir = TempDir::new().unwrap();
    o2d(&dir)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1: Order processing"))
        .stdout(predicate::str::contains("Fixed: Underload in FO and vehicle placement -> +12 hrs"))
        .stdout(predicate::str::contains("Total: 54 hours, 18 touchpoint(s)"))
        .stdout(predicate::str::contains("Delivered at 03-Aug-2025 03:00 PM"));
}

#[test]
fn run_json_report() {
    let dir = TempDir::new().unwrap();
    write_scenario(&dir, TWO_STAGE);
    let output = o2d(&dir).args(["run", "--json"]).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["summary"]["total_elapsed"], 3);
    assert_eq!(json["summary"]["total_touchpoints"], 2);
    assert_eq!(json["summary"]["status"], "delivered");
    assert_eq!(json["events"][0]["event"], "advanced");
    assert_eq!(json["events"][1]["event"], "fixed");
}

#[test]
fn run_skip_fixes_requires_permissive() {
    let dir = TempDir::new().unwrap();
    o2d(&dir)
        .args(["run", "--skip-fixes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires the permissive policy"));

    o2d(&dir)
        .args(["run", "--skip-fixes", "--permissive"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total: 0 hours, 0 touchpoint(s)"))
        .stdout(predicate::str::contains("Underload in FO and vehicle placement -> not fixed"));
}

#[test]
fn invalid_scenario_is_not_playable() {
    let dir = TempDir::new().unwrap();
    write_scenario(&dir, "name: empty\nstages: []\n");
    o2d(&dir)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("scenario has no stages"));
}
