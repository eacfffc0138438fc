//! Integration tests for the `millrace` binary.
//!
//! Each test launches the binary via `assert_cmd`, writes any required
//! pipeline files to a temp location, and asserts on exit code + output.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[allow(deprecated)]
fn millrace() -> Command {
    Command::cargo_bin("millrace").expect("binary not found")
}

/// Write `contents` to a temporary `.yml` file and return it.
fn pipeline_file(contents: &str) -> NamedTempFile {
    let mut f = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    f.flush().unwrap();
    f
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const SET_PIPELINE: &str = r#"
id: logs-sample
processors:
  - set:
      target_field: event.id
      value: "1234"
"#;

const FAILING_PIPELINE: &str = r#"
id: lowercase-non-existent
processors:
  - lowercase:
      field: non_existent
"#;

const UNKNOWN_PROCESSOR_PIPELINE: &str = r#"
id: p
processors:
  - frobnicate:
      level: 11
"#;

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn run_emits_one_json_line_per_event() {
    let pipeline = pipeline_file(SET_PIPELINE);

    millrace()
        .args(["run", "-p"])
        .arg(pipeline.path())
        .write_stdin("{}\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains(r#""id":"1234""#)
                .and(predicate::str::contains(r#""original":"{}""#))
                .and(predicate::str::contains(r#""line_number":1"#)),
        );
}

#[test]
fn run_skips_blank_lines() {
    let pipeline = pipeline_file(SET_PIPELINE);

    let assert = millrace()
        .args(["run", "-p"])
        .arg(pipeline.path())
        .write_stdin("first\n\n   \nsecond\n")
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert_eq!(stdout.lines().count(), 2);
}

#[test]
fn run_logs_per_line_errors_and_continues() {
    let pipeline = pipeline_file(FAILING_PIPELINE);

    millrace()
        .args(["run", "-p"])
        .arg(pipeline.path())
        .write_stdin("one\ntwo\n")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(
            predicate::str::contains("Error processing line 1")
                .and(predicate::str::contains("Error processing line 2"))
                .and(predicate::str::contains("non_existent")),
        );
}

#[test]
fn run_line_numbers_count_all_lines() {
    let pipeline = pipeline_file(SET_PIPELINE);

    millrace()
        .args(["run", "-p"])
        .arg(pipeline.path())
        .write_stdin("\nsecond\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""line_number":2"#));
}

#[test]
fn run_stats_prints_counters() {
    let pipeline = pipeline_file(SET_PIPELINE);

    millrace()
        .args(["run", "--stats", "-p"])
        .arg(pipeline.path())
        .write_stdin("{}\n")
        .assert()
        .success()
        .stderr(
            predicate::str::contains("logs-sample.processors[0].set")
                .and(predicate::str::contains("received")),
        );
}

#[test]
fn run_with_unreadable_pipeline_exits_nonzero() {
    millrace()
        .args(["run", "-p", "/no/such/pipeline.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn run_with_unknown_processor_exits_nonzero() {
    let pipeline = pipeline_file(UNKNOWN_PROCESSOR_PIPELINE);

    millrace()
        .args(["run", "-p"])
        .arg(pipeline.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("frobnicate"));
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_accepts_a_valid_pipeline() {
    let pipeline = pipeline_file(SET_PIPELINE);

    millrace()
        .args(["check", "-p"])
        .arg(pipeline.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("logs-sample"));
}

#[test]
fn check_rejects_invalid_config() {
    let pipeline = pipeline_file(
        r#"
id: p
processors:
  - set:
      target_field: a
      value: x
      copy_from: b
"#,
    );

    millrace()
        .args(["check", "-p"])
        .arg(pipeline.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("mutually exclusive"));
}

#[test]
fn check_rejects_missing_id() {
    let pipeline = pipeline_file("processors: []\n");

    millrace()
        .args(["check", "-p"])
        .arg(pipeline.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-empty id"));
}
