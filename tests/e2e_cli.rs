//! CLI end-to-end tests
//!
//! Tests for the abrforge command-line interface. None of these need ffmpeg
//! or the packager installed.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the abrforge binary
#[allow(deprecated)]
fn abrforge_cmd() -> Command {
    let mut cmd = Command::cargo_bin("abrforge").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

const KEYS: &str =
    "label=:key_id=abba271e8bcf552bbd2e86a434a9a5d9:key=69eaa802a6763af979e8d1940fb88392";

#[test]
fn test_cli_no_args_shows_help() {
    abrforge_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    abrforge_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("abrforge"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_flag() {
    abrforge_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("abrforge"));
}

#[test]
fn test_cli_version_command() {
    abrforge_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_export_help() {
    abrforge_cmd()
        .args(["export", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--keys"))
        .stdout(predicate::str::contains("--rendition"));
}

#[test]
fn test_cli_check_tools_command() {
    abrforge_cmd().arg("check-tools").assert().success().stdout(
        predicate::str::contains("ffmpeg").and(predicate::str::contains("packager")),
    );
}

#[test]
fn test_cli_export_missing_input_fails() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("runs");

    abrforge_cmd()
        .args(["export", "/no/such/file.mp4", "--output"])
        .arg(&out)
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Input not found"));

    assert!(!out.exists());
}

#[test]
fn test_cli_export_keys_without_pssh_fails() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    fs::write(&input, b"not a video").unwrap();
    let config = dir.path().join("abrforge.toml");
    fs::write(&config, "").unwrap();

    abrforge_cmd()
        .arg("--config")
        .arg(&config)
        .arg("export")
        .arg(&input)
        .args(["--keys", KEYS])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires a PSSH"));
}

#[test]
fn test_cli_export_rejects_bad_rendition() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    fs::write(&input, b"not a video").unwrap();

    abrforge_cmd()
        .arg("export")
        .arg(&input)
        .args(["--rendition", "720p=0x720@4800"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("width"));
}

#[test]
fn test_cli_validate_valid_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("abrforge.toml");
    fs::write(
        &config,
        r#"
[transcode]
max_parallel_jobs = 2

[[ladder]]
name = "360p"
width = 640
height = 360
bitrate_kbps = 800
"#,
    )
    .unwrap();

    abrforge_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("Renditions: 1"));
}

#[test]
fn test_cli_validate_rejects_invalid_ladder() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("abrforge.toml");
    fs::write(
        &config,
        r#"
[[ladder]]
name = "720p"
width = 0
height = 720
bitrate_kbps = 4800
"#,
    )
    .unwrap();

    abrforge_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .code(64)
        .stderr(predicate::str::contains("Invalid ladder"));
}

#[test]
fn test_cli_validate_rejects_bad_toml() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("abrforge.toml");
    fs::write(&config, "[transcode\n").unwrap();

    abrforge_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_cli_ladder_prints_default() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("abrforge.toml");
    fs::write(&config, "").unwrap();

    abrforge_cmd()
        .arg("--config")
        .arg(&config)
        .arg("ladder")
        .assert()
        .success()
        .stdout(predicate::str::contains("144p=256x144@"))
        .stdout(predicate::str::contains("[audio]"));
}

#[test]
fn test_cli_ladder_json_from_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("abrforge.toml");
    fs::write(
        &config,
        r#"
[[ladder]]
name = "480p"
width = 854
height = 480
bitrate_kbps = 2400
"#,
    )
    .unwrap();

    let output = abrforge_cmd()
        .args(["ladder", "--json", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["renditions"][0]["name"], "480p");
    assert_eq!(json["renditions"][0]["bitrate_kbps"], 2400);
}
