//! End-to-end tests for the uvrepin CLI
//!
//! These tests verify:
//! - Dry-run mode leaves files unchanged
//! - CLI produces the documented table and JSON schema
//! - Exit codes are correct for various scenarios
//!
//! A shell script stands in for uv: it logs every invocation and serves an
//! outdated report, so `--source outdated` runs fully offline.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

// Writing an executable while another test forks can fail with ETXTBSY
static SERIAL: Mutex<()> = Mutex::new(());

const PYPROJECT: &str = r#"[project]
name = "test-project"
version = "1.0.0"
dependencies = [
    "requests==2.28.0",
    "httpx>=0.24",
]

[project.optional-dependencies]
dev = [
    "pytest==8.0.0",
]
"#;

const OUTDATED_REPORT: &str = "Package    Version    Latest     Type
requests   2.28.0     2.31.0     wheel
pytest     8.0.0      8.2.0      wheel";

fn uvrepin() -> Command {
    let mut cmd = Command::cargo_bin("uvrepin").expect("binary should build");
    cmd.env_remove("CI")
        .env_remove("RUST_LOG")
        .env_remove("UVREPIN_UV")
        .env_remove("UVREPIN_PYPI_URL");
    cmd
}

/// Create a test directory with a pyproject.toml
fn create_test_project() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    fs::write(temp_dir.path().join("pyproject.toml"), PYPROJECT).unwrap();
    temp_dir
}

/// Install a fake uv that exits with `add_exit` for `uv add`
#[cfg(unix)]
fn install_fake_uv(dir: &Path, add_exit: i32) -> (PathBuf, PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let bin_dir = dir.join("bin");
    fs::create_dir_all(&bin_dir).unwrap();
    let log = dir.join("uv.log");
    let script = bin_dir.join("uv");
    let body = format!(
        r#"#!/bin/sh
echo "$*" >> "{log}"
case "$1" in
  --version) echo "uv 0.5.0" ;;
  pip) cat <<'EOF'
{report}
EOF
  ;;
  add) exit {add_exit} ;;
esac
exit 0
"#,
        log = log.display(),
        report = OUTDATED_REPORT,
        add_exit = add_exit,
    );
    fs::write(&script, body).unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    (script, log)
}

fn read_log(log: &Path) -> String {
    fs::read_to_string(log).unwrap_or_default()
}

#[test]
fn test_help() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    uvrepin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("uvrepin"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--only-groups"));
}

#[test]
fn test_version() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    uvrepin()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_policy_is_rejected() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    uvrepin()
        .args(["--policy", "newest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("newest"));
}

#[test]
fn test_missing_uv_fails() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let project = create_test_project();
    uvrepin()
        .arg(project.path())
        .args(["--uv", "/nonexistent/uv"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not found on PATH"));
}

#[cfg(unix)]
#[test]
fn test_missing_manifest_fails() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempfile::tempdir().unwrap();
    let (uv, _) = install_fake_uv(dir.path(), 0);
    uvrepin()
        .arg(dir.path())
        .arg("--uv")
        .arg(&uv)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("couldn't find"));
}

#[cfg(unix)]
#[test]
fn test_dry_run_leaves_files_unchanged() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let project = create_test_project();
    let (uv, log) = install_fake_uv(project.path(), 0);

    uvrepin()
        .arg(project.path())
        .args(["--dry-run", "--source", "outdated", "--no-color"])
        .arg("--uv")
        .arg(&uv)
        .assert()
        .success()
        .stdout(predicate::str::contains("GROUP"))
        .stdout(predicate::str::is_match(r"main\s+requests\s+2\.28\.0\s+2\.31\.0").unwrap())
        .stdout(predicate::str::is_match(r"dev\s+pytest\s+8\.0\.0\s+8\.2\.0").unwrap())
        .stdout(predicate::str::contains("(No files changed.)"));

    let content = fs::read_to_string(project.path().join("pyproject.toml")).unwrap();
    assert_eq!(content, PYPROJECT);
    let calls = read_log(&log);
    assert!(calls.contains("pip list --outdated"));
    assert!(!calls.contains("add"));
}

#[cfg(unix)]
#[test]
fn test_json_dry_run_schema() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let project = create_test_project();
    let (uv, _) = install_fake_uv(project.path(), 0);

    let output = uvrepin()
        .arg(project.path())
        .args(["-n", "--json", "--source", "outdated"])
        .arg("--uv")
        .arg(&uv)
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["dry_run"], true);
    assert_eq!(json["count"], 2);
    assert_eq!(json["updates"][0]["package"], "requests");
    assert_eq!(json["updates"][0]["spec"], "requests==2.31.0");
    assert_eq!(json["updates"][1]["group"], "dev");
}

#[cfg(unix)]
#[test]
fn test_update_runs_add_then_lock() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let project = create_test_project();
    let (uv, log) = install_fake_uv(project.path(), 0);

    uvrepin()
        .arg(project.path())
        .args(["--source", "outdated", "--sync"])
        .arg("--uv")
        .arg(&uv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Running: "))
        .stdout(predicate::str::contains(
            "Done. pyproject.toml updated and environment synced.",
        ));

    let calls: Vec<String> = read_log(&log).lines().map(str::to_string).collect();
    assert_eq!(
        calls,
        vec![
            "--version",
            "pip list --outdated",
            "add --frozen requests==2.31.0",
            "add --frozen --optional dev pytest==8.2.0",
            "lock",
            "sync",
        ]
    );
}

#[cfg(unix)]
#[test]
fn test_failed_add_propagates_exit_code() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let project = create_test_project();
    let (uv, log) = install_fake_uv(project.path(), 3);

    uvrepin()
        .arg(project.path())
        .args(["--source", "outdated", "--quiet"])
        .arg("--uv")
        .arg(&uv)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Failed to update main dependencies"))
        .stderr(predicate::str::contains(
            "One or more uv add commands failed. See output above.",
        ));

    assert!(!read_log(&log).lines().any(|l| l == "lock"));
}

#[cfg(unix)]
#[test]
fn test_quiet_nothing_to_do() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let project = tempfile::tempdir().unwrap();
    fs::write(
        project.path().join("pyproject.toml"),
        "[project]\nname = \"app\"\ndependencies = [\"httpx>=0.24\"]\n",
    )
    .unwrap();
    let (uv, _) = install_fake_uv(project.path(), 0);

    uvrepin()
        .arg(project.path())
        .arg("-q")
        .arg("--uv")
        .arg(&uv)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
