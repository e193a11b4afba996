//! Integration tests for the `trustguard` CLI binary.
//!
//! Everything runs against the simulated engine with configuration and
//! state redirected into a temporary directory.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

const TUNNEL: &str = "[Interface]\nPrivateKey = a2V5\nAddress = 10.8.0.2/32\n\n\
                      [Peer]\nPublicKey = cGVlcg==\nEndpoint = 127.0.0.1:51820\n\
                      AllowedIPs = 0.0.0.0/0\n";

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `trustguard` binary with env isolation.
///
/// Clears all `TRUSTGUARD_*` env vars and points config and state
/// directories into `home` so tests never touch the user's real files.
fn trustguard_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("trustguard");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("TRUSTGUARD_STATE_DIR", home.join("state"))
        .env("NO_COLOR", "1")
        .env_remove("TRUSTGUARD_BACKEND")
        .env_remove("TRUSTGUARD_TUNNEL_NAME")
        .env_remove("TRUSTGUARD_POLL_INTERVAL_MS")
        .env_remove("RUST_LOG");
    cmd
}

fn write_tunnel(home: &Path, text: &str) -> std::path::PathBuf {
    let path = home.join("wg0.conf");
    std::fs::write(&path, text).unwrap();
    path
}

fn intent(action: &str, config: Option<&str>) -> String {
    let mut value = serde_json::json!({ "action": action });
    if let Some(config) = config {
        value["config"] = config.into();
    }
    format!("{value}\n")
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let home = tempfile::tempdir().unwrap();
    let output = trustguard_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = tempfile::tempdir().unwrap();
    trustguard_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("encrypted tunnel")
                .and(predicate::str::contains("up"))
                .and(predicate::str::contains("serve"))
                .and(predicate::str::contains("load")),
        );
}

#[test]
fn test_version_flag() {
    let home = tempfile::tempdir().unwrap();
    trustguard_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("trustguard"));
}

#[test]
fn test_invalid_subcommand() {
    let home = tempfile::tempdir().unwrap();
    trustguard_cmd(home.path())
        .arg("teleport")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_invalid_backend() {
    let home = tempfile::tempdir().unwrap();
    trustguard_cmd(home.path())
        .args(["--backend", "openvpn", "config", "show"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unknown backend"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash_zsh_fish() {
    let home = tempfile::tempdir().unwrap();
    for shell in ["bash", "zsh", "fish"] {
        trustguard_cmd(home.path())
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::contains("trustguard"));
    }
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path() {
    let home = tempfile::tempdir().unwrap();
    trustguard_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_applies_overrides() {
    let home = tempfile::tempdir().unwrap();
    trustguard_cmd(home.path())
        .args(["--backend", "simulated", "config", "show"])
        .env("TRUSTGUARD_TUNNEL_NAME", "office")
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#"backend = "simulated""#)
                .and(predicate::str::contains(r#"tunnel_name = "office""#))
                .and(predicate::str::contains("poll_interval_ms = 1000")),
        );
}

#[test]
fn test_config_show_rejects_bad_tunnel_name() {
    let home = tempfile::tempdir().unwrap();
    trustguard_cmd(home.path())
        .args(["config", "show"])
        .env("TRUSTGUARD_TUNNEL_NAME", "a-name-that-is-far-too-long")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tunnel_name"));
}

// ── Load ────────────────────────────────────────────────────────────

#[test]
fn test_load_persists_configuration() {
    let home = tempfile::tempdir().unwrap();
    let file = write_tunnel(home.path(), TUNNEL);

    trustguard_cmd(home.path())
        .args(["--backend", "simulated", "load"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Config loaded successfully"));

    let saved = std::fs::read_to_string(home.path().join("state/tunnel.conf")).unwrap();
    assert_eq!(saved, TUNNEL);
}

#[test]
fn test_load_empty_file() {
    let home = tempfile::tempdir().unwrap();
    let file = write_tunnel(home.path(), "  \n");

    trustguard_cmd(home.path())
        .args(["--backend", "simulated", "load"])
        .arg(&file)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Config is empty"));
    assert!(!home.path().join("state/tunnel.conf").exists());
}

#[test]
fn test_load_missing_file() {
    let home = tempfile::tempdir().unwrap();
    trustguard_cmd(home.path())
        .args(["load", "/nonexistent/wg0.conf"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Could not read"));
}

// ── Up ──────────────────────────────────────────────────────────────

#[test]
fn test_up_without_configuration() {
    let home = tempfile::tempdir().unwrap();
    trustguard_cmd(home.path())
        .args(["--backend", "simulated", "-y", "up"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("No tunnel configuration"));
}

#[test]
fn test_up_without_consent_is_denied() {
    let home = tempfile::tempdir().unwrap();
    let file = write_tunnel(home.path(), TUNNEL);

    trustguard_cmd(home.path())
        .args(["--backend", "simulated", "up", "--duration", "1"])
        .arg(&file)
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("consent"));
    assert!(!home.path().join("state/consent.toml").exists());
}

#[test]
fn test_up_connects_and_disconnects() {
    let home = tempfile::tempdir().unwrap();
    let file = write_tunnel(home.path(), TUNNEL);

    let output = trustguard_cmd(home.path())
        .args(["--backend", "simulated", "-y", "up", "--duration", "2"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[connected] UP"), "{stdout}");
    assert!(stdout.contains("127.0.0.1:51820"), "{stdout}");
    assert!(
        stdout.trim_end().ends_with("[disconnected] DOWN"),
        "{stdout}"
    );
    // Consent given once is remembered.
    assert!(home.path().join("state/consent.toml").exists());
}

#[test]
fn test_up_reuses_saved_configuration_and_consent() {
    let home = tempfile::tempdir().unwrap();
    let file = write_tunnel(home.path(), TUNNEL);

    trustguard_cmd(home.path())
        .args(["--backend", "simulated", "-y", "up", "--duration", "1"])
        .arg(&file)
        .assert()
        .success();

    // No file and no --yes: both come from the state directory. The
    // restored configuration is not reported as a transition.
    let output = trustguard_cmd(home.path())
        .args(["--backend", "simulated", "up", "--duration", "1"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[connected] UP"), "{stdout}");
    assert!(!stdout.contains("Ready"), "{stdout}");
}

#[test]
fn test_up_rejected_configuration_exits_with_backend_code() {
    let home = tempfile::tempdir().unwrap();
    let file = write_tunnel(home.path(), "[Interface]\nPrivateKey = a2V5\n");

    trustguard_cmd(home.path())
        .args(["--backend", "simulated", "-y", "up", "--duration", "1"])
        .arg(&file)
        .assert()
        .failure()
        .code(7)
        .stdout(predicate::str::contains("[failed: invalid configuration"))
        .stderr(predicate::str::contains("[Peer]"));
}

// ── Serve ───────────────────────────────────────────────────────────

#[test]
fn test_serve_start_then_stop() {
    let home = tempfile::tempdir().unwrap();
    let input = format!("{}{}", intent("START", Some(TUNNEL)), intent("STOP", None));

    let output = trustguard_cmd(home.path())
        .args(["--backend", "simulated", "-y", "serve"])
        .write_stdin(input)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        ["[connected] UP", "[disconnected] DOWN", "[disconnected] DOWN"],
        "{stdout}"
    );
}

#[test]
fn test_serve_json_tears_down_at_end_of_input() {
    let home = tempfile::tempdir().unwrap();

    let output = trustguard_cmd(home.path())
        .args(["--backend", "simulated", "-y", "serve", "--json"])
        .write_stdin(intent("START", Some(TUNNEL)))
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let events: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(events.len(), 2, "{events:?}");
    assert_eq!(events[0]["state"], "connected");
    assert_eq!(events[1]["state"], "disconnected");
    assert!(!String::from_utf8_lossy(&output.stdout).contains("PrivateKey"));
}

#[test]
fn test_serve_ignores_bad_requests() {
    let home = tempfile::tempdir().unwrap();
    let input = format!(
        "not json\n{}{}\n",
        intent("RESTART", None),
        intent("START", None)
    );

    trustguard_cmd(home.path())
        .args(["--backend", "simulated", "-y", "serve"])
        .write_stdin(input)
        .assert()
        .success()
        .stdout("[disconnected] Ready\n")
        .stderr(
            predicate::str::contains("malformed request")
                .and(predicate::str::contains("unknown action \"RESTART\""))
                .and(predicate::str::contains("START without configuration")),
        );
}

#[test]
fn test_serve_without_consent() {
    let home = tempfile::tempdir().unwrap();

    trustguard_cmd(home.path())
        .args(["--backend", "simulated", "serve"])
        .write_stdin(intent("START", Some(TUNNEL)))
        .assert()
        .success()
        .stdout("[disconnected] Ready\n")
        .stderr(predicate::str::contains("consent was not granted"));
}
