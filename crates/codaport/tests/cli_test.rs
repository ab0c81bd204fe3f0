//! Integration tests for the `codaport` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! exit codes and the config commands without touching the real Coda API
//! or the user's keyring.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VALID_KEY: &str = "0123456789abcdef0123456789abcdef";
const PAGE_URL: &str = "https://coda.io/d/Team-Wiki_dDoc/Weekly-Notes_suPage";

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `codaport` binary with env isolation.
///
/// Clears all `CODAPORT_*` env vars, points the config file into `home`
/// and disables the keyring so tests never touch the user's credentials.
fn codaport_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("codaport");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env("CODAPORT_CONFIG", home.join("config.toml"))
        .env("CODAPORT_USE_KEYRING", "false")
        .env("NO_COLOR", "1")
        .env_remove("CODAPORT_API_KEY")
        .env_remove("CODAPORT_API_BASE")
        .env_remove("CODAPORT_OUTPUT")
        .env_remove("CODAPORT_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn home() -> TempDir {
    tempfile::tempdir().unwrap()
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
    let home = home();
    let output = codaport_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let home = home();
    codaport_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Markdown")
                .and(predicate::str::contains("export"))
                .and(predicate::str::contains("config"))
                .and(predicate::str::contains("completions")),
        );
}

#[test]
fn test_version_flag() {
    let home = home();
    codaport_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("codaport"));
}

#[test]
fn test_export_help_lists_flags() {
    let home = home();
    codaport_cmd(home.path())
        .args(["export", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--no-download")
                .and(predicate::str::contains("--force"))
                .and(predicate::str::contains("--max-attempts")),
        );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let home = home();
    codaport_cmd(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let home = home();
    codaport_cmd(home.path())
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Argument errors ─────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let home = home();
    let output = codaport_cmd(home.path()).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_invalid_output_format() {
    let home = home();
    let output = codaport_cmd(home.path())
        .args(["--output", "invalid", "config", "show"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("possible values") || text.contains("invalid"),
        "Expected error about output format:\n{text}"
    );
}

// ── Export failures (no network) ────────────────────────────────────

#[test]
fn test_export_malformed_url_is_usage_error() {
    let home = home();
    codaport_cmd(home.path())
        .args(["--api-key", VALID_KEY, "export", "https://coda.io/not-a-doc"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid Coda URL format"));
}

#[test]
fn test_export_foreign_host_is_usage_error() {
    let home = home();
    codaport_cmd(home.path())
        .args([
            "--api-key",
            VALID_KEY,
            "export",
            "https://example.com/d/Doc_dDoc/Page_suPage",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Please provide a valid Coda URL"));
}

#[test]
fn test_export_without_key_is_auth_error() {
    let home = home();
    codaport_cmd(home.path())
        .args(["export", PAGE_URL])
        .assert()
        .code(3)
        .stderr(
            predicate::str::contains("API key not configured")
                .and(predicate::str::contains("config set-key")),
        );
}

#[test]
fn test_export_failure_json_result() {
    let home = home();
    let output = codaport_cmd(home.path())
        .args(["--output", "json", "export", "not a url"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        result,
        json!({
            "success": false,
            "error": "Please provide a valid Coda URL",
            "kind": "input"
        })
    );
}

// ── Export against a mock API ───────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_export_no_download_prints_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/apis/v1/docs/Doc/pages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "canvas-1", "browserLink": PAGE_URL }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/apis/v1/docs/Doc/pages/canvas-1/export"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "id": "job-1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/apis/v1/docs/Doc/pages/canvas-1/export/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "complete",
            "downloadLink": "https://coda.io/blobs/weekly-notes.md"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/apis/v1/docs/Doc/pages/canvas-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": "canvas-1", "name": "Weekly Notes" })),
        )
        .mount(&server)
        .await;

    let home = home();
    let api_base = format!("{}/apis/v1/", server.uri());
    let mut cmd = codaport_cmd(home.path());
    cmd.env("CODAPORT_EXPORT__SETTLE_DELAY_MS", "0")
        .env("CODAPORT_EXPORT__POLL_INTERVAL_MS", "0")
        .args([
            "--api-key",
            VALID_KEY,
            "--api-base",
            api_base.as_str(),
            "--output",
            "json",
            "export",
            "--no-download",
            PAGE_URL,
        ]);

    // The binary blocks; keep it off the runtime's worker threads.
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();

    assert!(output.status.success(), "{}", combined_output(&output));
    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        result,
        json!({
            "success": true,
            "downloadUrl": "https://coda.io/blobs/weekly-notes.md",
            "filename": "Weekly_Notes.md"
        })
    );
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_path_honors_override() {
    let home = home();
    codaport_cmd(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_no_config() {
    let home = home();
    codaport_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("api key: not set")
                .and(predicate::str::contains("https://coda.io/apis/v1/")),
        );
}

#[test]
fn test_set_key_rejects_malformed_key() {
    let home = home();
    codaport_cmd(home.path())
        .args(["config", "set-key", "too-short"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("at least 30 characters"));
}

#[test]
fn test_set_key_round_trip_in_config_file() {
    let home = home();

    codaport_cmd(home.path())
        .args(["config", "set-key", VALID_KEY])
        .assert()
        .success();
    let written = std::fs::read_to_string(home.path().join("config.toml")).unwrap();
    assert!(written.contains(VALID_KEY));

    // Secrets never appear in `config show`.
    codaport_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("config file")
                .and(predicate::str::contains(VALID_KEY).not()),
        );

    // Replacing needs confirmation; stdin is not a terminal here.
    let other = "abcdefghijklmnopqrstuvwxyz-0123456789";
    codaport_cmd(home.path())
        .args(["config", "set-key", other])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
    codaport_cmd(home.path())
        .args(["--yes", "config", "set-key", other])
        .assert()
        .success();

    codaport_cmd(home.path())
        .args(["config", "clear-key"])
        .assert()
        .success();
    codaport_cmd(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api key: not set"));
}
