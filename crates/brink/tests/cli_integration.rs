//! CLI integration tests for the brink command-line interface.
//!
//! None of these reach the real portal. Commands that need the network
//! point at an unreachable local address.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the brink binary with an isolated config directory.
fn brink(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("brink").unwrap();
    cmd.env("BRINK_CONFIG_DIR", config_dir.path())
        .env_remove("BRINK_USERNAME")
        .env_remove("BRINK_PASSWORD")
        .env_remove("BRINK_BASE_URL");
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let dir = TempDir::new().unwrap();
    brink(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Brink Home"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    brink(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("brink"));
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    brink(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("systems"))
        .stdout(predicate::str::contains("params"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_password_env_value_hidden_in_help() {
    let dir = TempDir::new().unwrap();
    brink(&dir)
        .env("BRINK_PASSWORD", "hunter2")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("hunter2").not());
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument Validation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_params_requires_system_id() {
    let dir = TempDir::new().unwrap();
    brink(&dir)
        .arg("params")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SYSTEM_ID"));
}

#[test]
fn test_set_rejects_non_numeric_id() {
    let dir = TempDir::new().unwrap();
    brink(&dir)
        .args(["set", "level", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_missing_username_is_reported() {
    let dir = TempDir::new().unwrap();
    brink(&dir)
        .arg("systems")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing username"));
}

#[test]
fn test_unreachable_service_fails() {
    let dir = TempDir::new().unwrap();
    brink(&dir)
        .args([
            "--base-url",
            "http://127.0.0.1:1",
            "--username",
            "me@example.com",
            "--password",
            "secret",
            "login",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Login failed"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Config Command
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_path_uses_override() {
    let dir = TempDir::new().unwrap();
    brink(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"))
        .stdout(predicate::str::contains(
            dir.path().to_string_lossy().to_string(),
        ));
}

#[test]
fn test_config_init_writes_template_once() {
    let dir = TempDir::new().unwrap();
    brink(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let content = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(content.contains("[account]"));

    brink(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_config_commands_ignore_broken_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[account\n").unwrap();

    brink(&dir).args(["config", "path"]).assert().success();
    brink(&dir)
        .arg("systems")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}
