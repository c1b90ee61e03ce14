//! CLI binary integration tests.
//!
//! These tests exercise the compiled `wxbridge` binary to verify that
//! top-level command routing, help text, and error handling work as expected.

use std::path::PathBuf;
use std::process::Command;

/// Locate the compiled `wxbridge` binary in the workspace target directory.
///
/// Cargo sets `CARGO_MANIFEST_DIR` to the manifest directory of the package
/// being tested. We navigate up to the workspace root and look inside
/// `target/debug/`.
fn wxbridge_bin() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // tests/integration -> workspace root
    let workspace_root = manifest_dir
        .parent()
        .expect("tests/ parent")
        .parent()
        .expect("workspace root");
    let bin = workspace_root.join("target").join("debug").join("wxbridge");
    assert!(
        bin.exists(),
        "wxbridge binary not found at {}; run `cargo build -p wxbridge-cli` first",
        bin.display()
    );
    bin
}

fn wxbridge_cmd() -> Command {
    Command::new(wxbridge_bin())
}

#[test]
fn test_cli_version() {
    let output = wxbridge_cmd()
        .arg("version")
        .output()
        .expect("failed to run wxbridge");
    assert!(output.status.success(), "version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("wxbridge"),
        "version output should contain 'wxbridge', got: {}",
        stdout
    );
}

#[test]
fn test_cli_help() {
    let output = wxbridge_cmd()
        .arg("--help")
        .output()
        .expect("failed to run wxbridge");
    assert!(output.status.success(), "--help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("serve"),
        "help output should mention 'serve', got: {}",
        stdout
    );
    assert!(
        stdout.contains("status"),
        "help output should mention 'status', got: {}",
        stdout
    );
}

#[test]
fn test_cli_unknown_command() {
    let output = wxbridge_cmd()
        .arg("nonexistent-command")
        .output()
        .expect("failed to run wxbridge");
    assert!(
        !output.status.success(),
        "unknown command should return non-zero exit code"
    );
}

#[test]
fn test_cli_serve_help() {
    let output = wxbridge_cmd()
        .args(["serve", "--help"])
        .output()
        .expect("failed to run wxbridge serve --help");
    assert!(output.status.success(), "serve --help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("--driver"),
        "serve help should mention '--driver', got: {}",
        stdout
    );
    assert!(
        stdout.contains("--port"),
        "serve help should mention '--port', got: {}",
        stdout
    );
}

#[test]
fn test_cli_doctor_help() {
    let output = wxbridge_cmd()
        .args(["doctor", "--help"])
        .output()
        .expect("failed to run wxbridge doctor --help");
    assert!(output.status.success(), "doctor --help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("doctor") || stdout.contains("Doctor") || stdout.contains("diagnostic"),
        "doctor help should mention diagnostics, got: {}",
        stdout
    );
}

#[test]
fn test_cli_serve_rejects_bad_driver() {
    let output = wxbridge_cmd()
        .args(["serve", "--driver", "carrier-pigeon"])
        .output()
        .expect("failed to run wxbridge serve");
    assert!(
        !output.status.success(),
        "invalid driver should return non-zero exit code"
    );
}
