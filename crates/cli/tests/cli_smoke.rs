//! CLI smoke tests for xcpack.
//!
//! These tests run the binary against temporary project trees. None of them
//! need a Go toolchain: they only use tasks that never invoke the compiler.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the xcpack binary with target filters cleared.
fn xcpack_cmd() -> Command {
  let mut cmd = cargo_bin_cmd!("xcpack");
  cmd.env_remove("GOOS").env_remove("GOARCH").env_remove("GOARM");
  cmd
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  xcpack_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  xcpack_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("xcpack"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["run", "tasks", "platforms", "config"] {
    xcpack_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// tasks
// =============================================================================

#[test]
fn tasks_lists_tasks_and_aliases() {
  xcpack_cmd()
    .arg("tasks")
    .assert()
    .success()
    .stdout(predicate::str::contains("pkg-build"))
    .stdout(predicate::str::contains("archive-tar-gz"))
    .stdout(predicate::str::contains("Aliases"));
}

#[test]
fn tasks_json_output() {
  let output = xcpack_cmd().args(["tasks", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let tasks = json["tasks"].as_array().unwrap();
  assert_eq!(tasks.len(), 15);
  let xc = tasks.iter().find(|t| t["name"] == "xc").unwrap();
  assert_eq!(xc["defaults"]["verifyExe"], serde_json::json!(true));
  assert_eq!(json["aliases"]["validate"], serde_json::json!(["go-vet", "go-test"]));
}

// =============================================================================
// platforms
// =============================================================================

#[test]
fn platforms_filter_by_os_and_arch() {
  xcpack_cmd()
    .args(["platforms", "--os", "linux", "--arch", "arm,arm64"])
    .assert()
    .success()
    .stdout(predicate::str::contains("linux_arm"))
    .stdout(predicate::str::contains("linux_arm64"))
    .stdout(predicate::str::contains("windows").not());
}

#[test]
fn platforms_json_output() {
  let output = xcpack_cmd()
    .args(["platforms", "--os", "windows", "--arch", "amd64", "-o", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json, serde_json::json!(["windows_amd64"]));
}

#[test]
fn platforms_reject_unknown_os() {
  xcpack_cmd()
    .args(["platforms", "--os", "plan9"])
    .assert()
    .failure();
}

// =============================================================================
// run
// =============================================================================

#[test]
fn run_unknown_task_fails_before_running_anything() {
  let temp = TempDir::new().unwrap();
  let version_dir = temp.path().join("out/1.0");
  std::fs::create_dir_all(&version_dir).unwrap();

  xcpack_cmd()
    .args(["run", "clean-destination", "no-such-task", "--dest", "out", "--pv", "1.0"])
    .arg("--wd")
    .arg(temp.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("does not exist"));

  assert!(version_dir.exists());
}

#[test]
fn run_clean_destination_removes_version_dir() {
  let temp = TempDir::new().unwrap();
  let version_dir = temp.path().join("out/1.0");
  std::fs::create_dir_all(&version_dir).unwrap();
  std::fs::write(version_dir.join("stale.zip"), b"old").unwrap();

  xcpack_cmd()
    .args(["run", "clean-destination", "--dest", "out", "--pv", "1.0", "--os", "linux"])
    .arg("--wd")
    .arg(temp.path())
    .assert()
    .success()
    .stdout(predicate::str::contains("Finished 1 task(s)"));

  assert!(!version_dir.exists());
}

#[test]
fn run_copies_resources_and_writes_downloads_page() {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("README.md"), "readme").unwrap();
  std::fs::write(temp.path().join("main.go"), "package main\n\nfunc main() {}\n").unwrap();

  xcpack_cmd()
    .args([
      "run",
      "copy-resources",
      "--tasks-plus",
      "downloads-page",
      "--dest",
      "out",
      "--pv",
      "2.0",
      "--pr",
      "beta",
      "--os",
      "linux",
      "--arch",
      "amd64",
    ])
    .arg("--wd")
    .arg(temp.path())
    .assert()
    .success();

  let version_dir = temp.path().join("out/2.0-beta");
  assert!(version_dir.join("linux_amd64/README.md").is_file());
  assert!(!version_dir.join("linux_amd64/main.go").exists());
  let page = std::fs::read_to_string(version_dir.join("downloads.md")).unwrap();
  assert!(page.contains(" * [README.md](linux_amd64/README.md)"));
}

#[test]
fn run_respects_tasks_minus() {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join("LICENSE"), "license").unwrap();

  xcpack_cmd()
    .args([
      "run",
      "copy-resources",
      "downloads-page",
      "--tasks-minus",
      "downloads-page",
      "--dest",
      "out",
      "--os",
      "darwin",
    ])
    .arg("--wd")
    .arg(temp.path())
    .assert()
    .success();

  let version_dir = temp.path().join("out/snapshot");
  assert!(version_dir.join("darwin_arm64/LICENSE").is_file());
  assert!(!version_dir.join("downloads.md").exists());
}

#[test]
fn run_missing_working_dir_fails() {
  let temp = TempDir::new().unwrap();

  xcpack_cmd()
    .args(["run", "clean-destination", "--wd"])
    .arg(temp.path().join("missing"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("Working directory not found"));
}

// =============================================================================
// config
// =============================================================================

#[test]
fn config_writes_merged_settings() {
  let temp = TempDir::new().unwrap();
  std::fs::write(
    temp.path().join(".xcpack.json"),
    r#"{ "packageVersion": "3.1", "taskSettings": { "xc": { "GOARM": "7" } } }"#,
  )
  .unwrap();

  xcpack_cmd()
    .arg("config")
    .arg("--wd")
    .arg(temp.path())
    .assert()
    .success()
    .stdout(predicate::str::contains("Settings written"));

  let text = std::fs::read_to_string(temp.path().join(".xcpack.json")).unwrap();
  let json: serde_json::Value = serde_json::from_str(&text).unwrap();
  assert_eq!(json["packageVersion"], "3.1");
  assert_eq!(json["taskSettings"]["xc"]["GOARM"], "7");
  assert_eq!(json["taskSettings"]["xc"]["verifyExe"], true);
  assert_eq!(json["taskSettings"]["downloads-page"]["filename"], "downloads.md");
  assert_eq!(json["resourcesInclude"], "INSTALL*,README*,LICENSE*");
  assert!(json["tasks"].as_array().unwrap().iter().any(|t| t == "pkg-build"));
}

#[test]
fn config_leaves_local_overrides_out_of_shared_file() {
  let temp = TempDir::new().unwrap();
  std::fs::write(temp.path().join(".xcpack.json"), r#"{ "packageVersion": "1.0" }"#).unwrap();
  std::fs::write(
    temp.path().join(".xcpack.local.json"),
    r#"{ "packageVersion": "local", "artifactsDest": "/tmp/mine" }"#,
  )
  .unwrap();

  xcpack_cmd().arg("config").arg("--wd").arg(temp.path()).assert().success();

  let text = std::fs::read_to_string(temp.path().join(".xcpack.json")).unwrap();
  let json: serde_json::Value = serde_json::from_str(&text).unwrap();
  assert_eq!(json["packageVersion"], "1.0");
  assert_eq!(json["artifactsDest"], "");
  assert!(temp.path().join(".xcpack.local.json").is_file());
}
