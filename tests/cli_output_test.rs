#![cfg(unix)]

mod common;

use assert_cmd::Command;
use common::{FakeListing, NETSTAT_OUTPUT};
use predicates::prelude::*;

fn tcpsnap(fake: &FakeListing) -> Command {
    let mut cmd = Command::cargo_bin("tcpsnap").expect("binary builds");
    cmd.args(["--program", "sh", "--program-arg"])
        .arg(fake.script_arg())
        .arg("--unprivileged");
    cmd
}

// ---------------------------------------------------------------------------
// Parsed table
// ---------------------------------------------------------------------------

#[test]
fn test_table_has_header_and_rows() {
    let fake = FakeListing::printing(NETSTAT_OUTPUT, "exit 0");
    let assert = tcpsnap(&fake).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();

    let mut lines = stdout.lines();
    let header = lines.next().unwrap_or("");
    assert!(header.contains("Proto"), "Header should contain Proto");
    assert!(header.contains("Local Address"), "Header should contain Local Address");
    assert!(header.contains("PID/Program name"), "Header should contain PID/Program name");
    assert_eq!(lines.count(), 6);
    assert!(stdout.contains("1234/sshd"));
    assert!(stdout.contains("0.0.0.0:*"));
    assert!(stdout.contains("::1:631"));
}

#[test]
fn test_privileged_marks_unbound_rows() {
    let fake = FakeListing::printing(NETSTAT_OUTPUT, "exit 0");
    let mut cmd = Command::cargo_bin("tcpsnap").expect("binary builds");
    cmd.args(["--program", "sh", "--program-arg"])
        .arg(fake.script_arg())
        .arg("--privileged")
        .assert()
        .success()
        .stdout(predicate::str::contains("(unbound)"));
}

#[test]
fn test_malformed_row_reported_on_stderr() {
    let text = format!("{}tcp 0 0 0.0.0.0:9\n", NETSTAT_OUTPUT);
    let fake = FakeListing::printing(&text, "exit 0");
    tcpsnap(&fake)
        .assert()
        .success()
        .stderr(
            predicate::str::contains("skipping connection row")
                .and(predicate::str::contains("line=9"))
                .and(predicate::str::contains("0.0.0.0:9")),
        );
}

#[test]
fn test_skipped_row_logged_once() {
    let text = format!("{}tcp 0 0 0.0.0.0:9\n", NETSTAT_OUTPUT);
    let fake = FakeListing::printing(&text, "exit 0");
    let assert = tcpsnap(&fake).assert().success();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert_eq!(stderr.matches("0.0.0.0:9").count(), 1, "stderr: {}", stderr);
}

#[test]
fn test_failed_program_reports_partial() {
    let fake = FakeListing::printing(NETSTAT_OUTPUT, "exit 4");
    tcpsnap(&fake)
        .assert()
        .success()
        .stdout(predicate::str::contains("812/sshd"))
        .stderr(predicate::str::contains("partial snapshot"));
}

#[test]
fn test_empty_output_fails() {
    let fake = FakeListing::new("exit 0\n");
    tcpsnap(&fake)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no usable output"));
}

#[test]
fn test_missing_program_fails() {
    Command::cargo_bin("tcpsnap")
        .expect("binary builds")
        .args(["--program", "/nonexistent/tcpsnap-netstat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to start"));
}

// ---------------------------------------------------------------------------
// Raw text path
// ---------------------------------------------------------------------------

#[test]
fn test_count_lines() {
    let fake = FakeListing::printing(NETSTAT_OUTPUT, "exit 0");
    tcpsnap(&fake)
        .arg("--count")
        .assert()
        .success()
        .stdout("8\n");
}

#[test]
fn test_contain_and_exclude() {
    let fake = FakeListing::printing(NETSTAT_OUTPUT, "exit 0");
    tcpsnap(&fake)
        .args(["--contain", "LISTEN", "--contain", "tcp6", "--exclude", "nginx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("::1:631").and(predicate::str::contains("nginx").not()));
}

#[test]
fn test_count_after_filter() {
    let fake = FakeListing::printing(NETSTAT_OUTPUT, "exit 0");
    tcpsnap(&fake)
        .args(["--contain", "sshd", "--count"])
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn test_raw_output_verbatim() {
    let fake = FakeListing::printing(NETSTAT_OUTPUT, "exit 0");
    tcpsnap(&fake)
        .arg("--raw")
        .assert()
        .success()
        .stdout(NETSTAT_OUTPUT);
}
