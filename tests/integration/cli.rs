//! `replayer` binary behaviour

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;

use replayer::capture::{ExportMeta, LogExport};

use super::common::fixtures::{click, text_input, FORM_URL, WINDOW};

fn write_log(dir: &Path) -> std::path::PathBuf {
    let export = LogExport {
        meta: ExportMeta {
            exported_at: chrono::Utc::now(),
            extension_version: "1.0.0".into(),
            window_id: WINDOW,
        },
        logs: vec![
            text_input(2, 200, "field", "hello"),
            click(1, 0, "btn"),
            click(3, 20_000, "btn"),
        ],
    };
    let path = dir.join("session.json");
    export.write_to_path(&path).unwrap();
    path
}

fn write_pages(dir: &Path) -> std::path::PathBuf {
    let pages = json!({
        "pages": [{
            "url": FORM_URL,
            "elements": [
                {"tag": "BUTTON", "id": "btn"},
                {"tag": "INPUT", "id": "field", "kind": "text_field"}
            ]
        }]
    });
    let path = dir.join("pages.json");
    fs::write(&path, pages.to_string()).unwrap();
    path
}

fn replayer_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("replayer").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_plan_prints_sorted_steps_with_clamped_waits() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path());

    replayer_cmd(dir.path())
        .arg("plan")
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 replayable steps"))
        .stdout(predicate::str::contains("text_input"))
        .stdout(predicate::str::contains("+200ms"))
        .stdout(predicate::str::contains("+3000ms"))
        .stdout(predicate::str::contains("total pacing: 3200ms"));
}

#[test]
fn test_plan_honours_config_file_and_flags() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path());
    let config = dir.path().join("config.toml");
    fs::write(&config, "[replay]\nmax_step_delay_ms = 1000\n").unwrap();

    replayer_cmd(dir.path())
        .arg("plan")
        .arg(&log)
        .arg("--config")
        .arg(&config)
        .arg("--speed")
        .arg("2")
        .assert()
        .success()
        .stdout(predicate::str::contains("+100ms"))
        .stdout(predicate::str::contains("+1000ms"));
}

#[test]
fn test_simulate_streams_notifications() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path());
    let pages = write_pages(dir.path());

    replayer_cmd(dir.path())
        .arg("simulate")
        .arg(&log)
        .arg("--pages")
        .arg(&pages)
        .arg("--max-step-delay")
        .arg("50")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""type":"replay_progress""#))
        .stdout(predicate::str::contains(r#""done":true"#))
        .stdout(predicate::str::contains(r#""status":"error""#).not())
        .stderr(predicate::str::contains("replayed 3 of 3 steps (0 failed)"));
}

#[test]
fn test_missing_log_fails_with_context() {
    let dir = tempfile::tempdir().unwrap();

    replayer_cmd(dir.path())
        .arg("plan")
        .arg(dir.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read capture log"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let log = write_log(dir.path());
    let config = dir.path().join("config.toml");
    fs::write(&config, "[replay]\nspeed = -1.0\n").unwrap();

    replayer_cmd(dir.path())
        .arg("plan")
        .arg(&log)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("replay.speed"));
}

#[test]
fn test_config_prints_example() {
    let dir = tempfile::tempdir().unwrap();
    replayer_cmd(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[round_trip]"));
}
