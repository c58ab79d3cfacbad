//! CLI integration tests

use std::process::Command;

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "alarm-cli", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("availability alarms"),
        "Should describe the tool"
    );
    assert!(stdout.contains("--compartment"), "Should show compartment option");
    assert!(stdout.contains("--dry-run"), "Should show dry-run option");
    assert!(
        stdout.contains("--continue-on-error"),
        "Should show continue-on-error option"
    );
    assert!(
        stdout.contains("--match-policy"),
        "Should show match-policy option"
    );
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = Command::new("cargo")
        .args(["run", "-p", "alarm-cli", "--", "--version"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("oci-alarms"), "Should show binary name");
}

/// Test that a missing notification topic fails before any API call
#[test]
fn test_missing_notification_channel_fails() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output = Command::new("cargo")
        .args([
            "run",
            "-q",
            "--manifest-path",
            concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml"),
            "--",
            "--compartment",
            "prod",
        ])
        .current_dir(dir.path())
        .env_remove("NOTIFICATION_OCID")
        .env("CONFIG_PATH", dir.path().join("missing-config"))
        .output()
        .expect("Failed to execute command");

    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Run should fail");
    assert!(
        stderr.contains("NOTIFICATION_OCID"),
        "Should name the missing variable"
    );
}

/// Test that an unknown match policy is rejected
#[test]
fn test_invalid_match_policy() {
    let output = Command::new("cargo")
        .args(["run", "-p", "alarm-cli", "--", "--match-policy", "first"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Invalid policy should fail");
}
