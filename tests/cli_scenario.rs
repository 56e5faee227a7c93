use assert_cmd::prelude::*;
use std::net::TcpListener;
use std::process::Command;

/// URL of a local port with nothing listening on it
fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}

fn firstboot(endpoint: &str) -> Command {
    let mut cmd = Command::cargo_bin("firstboot").expect("Failed to find firstboot binary");
    cmd.env_remove("FIRSTBOOT_METADATA_URL")
        .env_remove("FIRSTBOOT_HTTPS_INSECURE")
        .env_remove("FIRSTBOOT_CA_BUNDLE")
        .args(["--metadata-url", endpoint, "--retry-count", "1", "--retry-interval", "0", "--timeout", "2"]);
    cmd
}

#[test]
fn test_firstboot_help_output() {
    let output = Command::cargo_bin("firstboot")
        .unwrap()
        .arg("--help")
        .output()
        .expect("Failed to execute firstboot command");

    assert!(output.status.success());
    let stdout_str = String::from_utf8_lossy(&output.stdout);
    assert!(stdout_str.contains("Usage: firstboot [OPTIONS] [COMMAND]"), "Missing usage text");
    assert!(stdout_str.contains("apply"), "Missing apply command");
    assert!(stdout_str.contains("show"), "Missing show command");
    assert!(stdout_str.contains("user-data"), "Missing user-data command");
    assert!(stdout_str.contains("--metadata-url"), "Missing metadata URL option");
}

#[test]
fn test_apply_without_metadata_service_does_not_fail_boot() {
    let endpoint = closed_endpoint();
    let output = firstboot(&endpoint)
        .arg("apply")
        .output()
        .expect("Failed to execute firstboot apply");

    assert!(
        output.status.success(),
        "apply should degrade gracefully. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout_str = String::from_utf8_lossy(&output.stdout);
    assert!(stdout_str.contains("Metadata unavailable"), "Unexpected stdout: {}", stdout_str);
}

#[test]
fn test_apply_with_unreadable_ca_bundle_does_not_fail_boot() {
    let endpoint = closed_endpoint();
    let output = firstboot(&endpoint)
        .args(["--ca-bundle", "/nonexistent/firstboot/ca.pem", "apply"])
        .output()
        .expect("Failed to execute firstboot apply");

    assert!(
        output.status.success(),
        "apply should degrade gracefully. Stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout_str = String::from_utf8_lossy(&output.stdout);
    assert!(stdout_str.contains("Metadata unavailable"), "Unexpected stdout: {}", stdout_str);
}

#[test]
fn test_show_without_metadata_service_fails() {
    let endpoint = closed_endpoint();
    let output = firstboot(&endpoint)
        .arg("show")
        .output()
        .expect("Failed to execute firstboot show");

    assert!(!output.status.success());
    let stderr_str = String::from_utf8_lossy(&output.stderr);
    assert!(stderr_str.contains("metadata service unavailable"), "Unexpected stderr: {}", stderr_str);
}
