use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

mod common;
use common::*;

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_coordinate_file() {
    let coords = temp_file("48.85 2.35\n# a comment\n\n52.0,13.4\n");
    let output = SundialTest::new()
        .args([
            "--format=csv",
            "--no-headers",
            &format!("@{}", coords.path().display()),
            "2024-03-20T12:00:00Z",
            "time",
        ])
        .get_output();
    assert!(output.status.success());
    let lines = String::from_utf8_lossy(&output.stdout).lines().count();
    assert_eq!(lines, 2);
}

#[test]
fn test_times_file() {
    let times = temp_file("2024-03-20T12:00:00Z\n2024-06-21T12:00:00Z\n");
    let output = SundialTest::new()
        .args([
            "--format=csv",
            "--no-headers",
            "48.85",
            "2.35",
            &format!("@{}", times.path().display()),
            "time",
        ])
        .get_output();
    assert!(output.status.success());
    let lines = String::from_utf8_lossy(&output.stdout).lines().count();
    assert_eq!(lines, 2);
}

#[test]
fn test_coordinate_file_with_times_file() {
    let coords = temp_file("48.85 2.35\n0.0 0.0\n");
    let times = temp_file("2024-03-20T12:00:00Z\n2024-06-21T00:00:00Z\n");
    let output = SundialTest::new()
        .args([
            "--format=csv",
            "--no-headers",
            &format!("@{}", coords.path().display()),
            &format!("@{}", times.path().display()),
            "time",
        ])
        .get_output();
    assert!(output.status.success());
    // Location-major: each coordinate runs through both times.
    let lines = String::from_utf8_lossy(&output.stdout).lines().count();
    assert_eq!(lines, 4);
}

#[test]
fn test_paired_file() {
    let data = temp_file(
        "48.85 2.35 2024-03-20T12:00:00Z\n52.0,13.4,2024-06-21T12:00:00Z\n",
    );
    let output = SundialTest::new()
        .args([
            "--format=csv",
            "--no-headers",
            &format!("@{}", data.path().display()),
            "time",
        ])
        .get_output();
    assert!(output.status.success());
    let lines = String::from_utf8_lossy(&output.stdout).lines().count();
    assert_eq!(lines, 2);
}

#[test]
fn test_paired_stdin() {
    SundialTest::new()
        .args(["--format=csv", "--no-headers", "@-", "time"])
        .stdin("48.85 2.35 2024-03-20T12:00:00Z\n")
        .assert_success()
        .stdout(predicate::str::contains("2024-03-20T12:00:00+00:00"));
}

#[test]
fn test_coordinate_stdin() {
    SundialTest::new()
        .args([
            "--format=csv",
            "--no-headers",
            "@-",
            "2024-03-20T12:00:00Z",
            "dial",
        ])
        .stdin("48.85 2.35\n")
        .assert_success();
}

#[test]
fn test_missing_file_reports_error() {
    SundialTest::new()
        .args(["@/no/such/file.txt", "time"])
        .assert_failure()
        .stderr(predicate::str::contains("Error opening"));
}

#[test]
fn test_bad_latitude_line_reports_line_number() {
    let coords = temp_file("48.85 2.35\nnorth 2.35\n");
    SundialTest::new()
        .args([
            &format!("@{}", coords.path().display()),
            "2024-03-20T12:00:00Z",
            "time",
        ])
        .assert_failure()
        .stderr(predicate::str::contains(":2: invalid latitude 'north'"));
}

#[test]
fn test_out_of_range_file_coordinate_rejected() {
    let coords = temp_file("95.0 2.35\n");
    SundialTest::new()
        .args([
            &format!("@{}", coords.path().display()),
            "2024-03-20T12:00:00Z",
            "time",
        ])
        .assert_failure()
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn test_coordinate_file_with_datetime_hints_paired() {
    let coords = temp_file("48.85 2.35 2024-03-20T12:00:00Z\n");
    SundialTest::new()
        .args([
            &format!("@{}", coords.path().display()),
            "2024-03-20T12:00:00Z",
            "time",
        ])
        .assert_failure()
        .stderr(predicate::str::contains("paired data file"));
}

#[test]
fn test_paired_file_too_few_fields() {
    let data = temp_file("48.85 2.35\n");
    SundialTest::new()
        .args([&format!("@{}", data.path().display()), "time"])
        .assert_failure()
        .stderr(predicate::str::contains("expected 3 fields"));
}

#[test]
fn test_bad_datetime_in_paired_file() {
    let data = temp_file("48.85 2.35 not-a-date\n");
    SundialTest::new()
        .args([&format!("@{}", data.path().display()), "time"])
        .assert_failure()
        .stderr(predicate::str::contains(":1:"));
}

#[test]
fn test_rows_before_a_bad_line_are_still_written() {
    let data = temp_file("48.85 2.35 2024-03-20T12:00:00Z\nbroken line here\n");
    let output = SundialTest::new()
        .args([
            "--format=csv",
            "--no-headers",
            &format!("@{}", data.path().display()),
            "time",
        ])
        .get_output();
    assert!(!output.status.success());
    assert!(
        String::from_utf8_lossy(&output.stdout).contains("2024-03-20T12:00:00+00:00"),
        "first record should be emitted before the error"
    );
}
