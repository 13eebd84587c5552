//! Runs the `truckgate` binary against a scratch config and data directory

use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

fn truckgate(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_truckgate"))
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("TRUCKGATE_DATA_DIR", home.join("gate"))
        .env("OPENAI_API_KEY", "sk-test")
        .env_remove("CAMERA_URL")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_empty_queue() {
    let home = tempdir().unwrap();

    let queue = truckgate(home.path(), &["queue"]);
    assert!(queue.status.success(), "{}", stderr(&queue));
    assert!(stdout(&queue).contains("Queued trucks (0)"));

    let json = truckgate(home.path(), &["queue", "--format", "json"]);
    assert_eq!(stdout(&json).trim(), "[]");

    let gate = truckgate(home.path(), &["gate"]);
    assert!(gate.status.success(), "{}", stderr(&gate));
    assert!(stdout(&gate).contains("Queue empty"));
    assert!(home.path().join("gate").join("trucks.sqlite").is_file());
}

#[test]
fn test_intake_requires_all_fields() {
    let home = tempdir().unwrap();
    let license = home.path().join("dl.jpg");
    std::fs::write(&license, b"license").unwrap();

    let output = truckgate(
        home.path(),
        &["intake", "--license", license.to_str().unwrap(), "--challan", "c.pdf"],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error: Intake failed: All fields required: missing plate image"));

    let history = truckgate(home.path(), &["history", "-f", "json"]);
    assert_eq!(stdout(&history).trim(), "[]");
}

#[test]
fn test_capture_without_camera() {
    let home = tempdir().unwrap();
    let output = truckgate(home.path(), &["capture"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("No camera configured"));
}

#[test]
fn test_missing_artifact() {
    let home = tempdir().unwrap();
    let output = truckgate(home.path(), &["artifact", "AB12CD3456"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("no announcement for truck AB12CD3456"));
}

// XDG_CONFIG_HOME only decides the config dir on Linux
#[cfg(target_os = "linux")]
#[test]
fn test_config_set_persists() {
    let home = tempdir().unwrap();

    let set = truckgate(home.path(), &["config", "--set", "store_backend=json"]);
    assert!(set.status.success(), "{}", stderr(&set));
    assert!(home.path().join("config").join("truckgate").join("config.toml").is_file());

    let show = truckgate(home.path(), &["config", "--show"]);
    assert!(stdout(&show).contains("Store backend:    json"));
    assert!(stdout(&show).contains("API key:          (set)"));

    let queue = truckgate(home.path(), &["queue"]);
    assert!(queue.status.success(), "{}", stderr(&queue));
    assert!(!home.path().join("gate").join("trucks.sqlite").exists());

    let bad = truckgate(home.path(), &["config", "--set", "store_backend=postgres"]);
    assert_eq!(bad.status.code(), Some(1));
}
