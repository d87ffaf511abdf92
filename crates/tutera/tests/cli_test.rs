//! Integration tests for the `tutera` binary.
//!
//! Argument parsing, help, completions and config handling run without
//! a processor; command tests run against a wiremock processor.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// `tutera` with every `TUTERA_*` variable cleared and config/data
/// directories pointed at `home`.
fn tutera_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("tutera");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("TUTERA_PROFILE")
        .env_remove("TUTERA_CONFIG")
        .env_remove("TUTERA_PROCESSOR")
        .env_remove("TUTERA_AUTH_TOKEN")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(cmd: assert_cmd::Command) -> std::process::Output {
    let mut cmd = cmd;
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

async fn processor() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cws/api/login"))
        .and(header("Crestron-RestAPI-AuthToken", "good-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "authkey": "k1" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cws/api/login"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .with_priority(10)
        .mount(&server)
        .await;

    let listings = [
        ("rooms", json!({ "rooms": [{ "id": 1, "name": "Kitchen" }] })),
        (
            "lights",
            json!({ "lights": [
                { "id": 1, "name": "Pendant", "roomId": 1, "subType": "Dimmer", "level": 65535 }
            ] }),
        ),
        ("thermostats", json!([])),
        ("doorlocks", json!({ "doorLocks": [] })),
        ("scenes", json!({ "scenes": [] })),
        ("quickactions", json!({ "quickActions": [] })),
        ("mediarooms", json!({ "mediaRooms": [] })),
    ];
    for (endpoint, body) in listings {
        Mock::given(method("GET"))
            .and(path(format!("/cws/api/{endpoint}")))
            .and(header("Crestron-RestAPI-AuthKey", "k1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
    }
    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_usage() {
    let home = tempfile::tempdir().unwrap();
    let output = tutera_cmd(home.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn help_lists_resources() {
    let home = tempfile::tempdir().unwrap();
    tutera_cmd(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("rooms")
                .and(predicate::str::contains("lights"))
                .and(predicate::str::contains("scenes"))
                .and(predicate::str::contains("climate")),
        );
}

#[test]
fn version_flag() {
    let home = tempfile::tempdir().unwrap();
    tutera_cmd(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tutera"));
}

#[test]
fn completions_for_bash_and_zsh() {
    let home = tempfile::tempdir().unwrap();
    for shell in ["bash", "zsh"] {
        tutera_cmd(home.path())
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::is_empty().not());
    }
}

#[test]
fn invalid_subcommand_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    tutera_cmd(home.path())
        .arg("sprinklers")
        .assert()
        .code(2);
}

#[test]
fn dim_level_out_of_range_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    tutera_cmd(home.path())
        .args(["lights", "dim", "Pendant", "140"])
        .assert()
        .code(2);
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn missing_processor_explains_how_to_configure() {
    let home = tempfile::tempdir().unwrap();
    let output = tutera_cmd(home.path())
        .args(["rooms", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("No processor configured"));
}

#[test]
fn unknown_profile_is_not_found() {
    let home = tempfile::tempdir().unwrap();
    tutera_cmd(home.path())
        .args(["--profile", "cabin", "--token", "t", "status"])
        .assert()
        .code(4);
}

#[test]
fn config_init_then_show_masks_token() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("tutera.toml");
    let config_arg = config.to_str().unwrap();

    tutera_cmd(home.path())
        .args(["--config", config_arg, "--token", "secret-token"])
        .args(["config", "init", "--name", "home", "--processor", "10.0.0.5"])
        .assert()
        .success();
    assert!(config.exists());

    tutera_cmd(home.path())
        .args(["--config", config_arg, "config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.home]")
                .and(predicate::str::contains("10.0.0.5"))
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("secret-token").not()),
        );

    tutera_cmd(home.path())
        .args(["--config", config_arg, "config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("* home"));
}

#[test]
fn config_use_rejects_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("tutera.toml");
    tutera_cmd(home.path())
        .args(["--config", config.to_str().unwrap(), "config", "use", "cabin"])
        .assert()
        .code(4);
}

// ── Against a processor ─────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn lights_list_as_json() {
    let server = processor().await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = tutera_cmd(home.path());
    cmd.args(["--processor", &server.uri(), "--token", "good-token"])
        .args(["-o", "json", "lights", "list"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    let lights: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(lights[0]["id"], "light:1");
    assert_eq!(lights[0]["name"], "Pendant");
    assert_eq!(lights[0]["state"]["brightness"], 100);
}

#[tokio::test(flavor = "multi_thread")]
async fn light_off_sends_level_zero() {
    let server = processor().await;
    Mock::given(method("POST"))
        .and(path("/cws/api/lights/SetState"))
        .and(body_json(json!({ "lights": [{ "id": 1, "level": 0, "time": 0 }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    let mut cmd = tutera_cmd(home.path());
    cmd.args(["--processor", &server.uri(), "--token", "good-token"])
        .args(["lights", "off", "pendant"]);

    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Pendant switched off"));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_token_exits_with_auth_code() {
    let server = processor().await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = tutera_cmd(home.path());
    cmd.args(["--processor", &server.uri(), "--token", "stale-token"])
        .args(["rooms", "list"]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("Authentication failed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_light_is_not_found() {
    let server = processor().await;
    let home = tempfile::tempdir().unwrap();
    let mut cmd = tutera_cmd(home.path());
    cmd.args(["--processor", &server.uri(), "--token", "good-token"])
        .args(["lights", "toggle", "Chandelier"]);

    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}
