//! Numeric checks of the solar time output against known scenarios.

mod common;
use common::*;

fn decimal_hours(lat: &str, lon: &str, datetime: &str) -> f64 {
    let output = SundialTest::new()
        .args([
            "--format=csv",
            "--no-headers",
            "--no-show-inputs",
            "--decimal",
            lat,
            lon,
            datetime,
            "time",
        ])
        .get_output();
    assert!(output.status.success());
    let values = last_column_values(&output.stdout);
    assert_eq!(values.len(), 1, "expected a single record");
    values[0]
}

/// 2024-03-20T12:00:00Z at the Greenwich meridian: solar time within
/// [11:50, 12:10] (the equation of time is about -7.9 minutes that day).
#[test]
fn test_march_equinox_at_greenwich() {
    let lst = decimal_hours("51.5", "0.0", "2024-03-20T12:00:00Z");
    assert!(
        (11.0 + 50.0 / 60.0..=12.0 + 10.0 / 60.0).contains(&lst),
        "got {}",
        lst
    );
}

/// Midnight UTC at the date line lands near local solar noon.
#[test]
fn test_date_line_wraparound() {
    let lst = decimal_hours("0.0", "180.0", "2024-06-21T00:00:00Z");
    assert!((lst - 12.0).abs() < 0.25, "got {}", lst);
}

/// Each 15 degrees of longitude shifts solar time exactly one hour.
#[test]
fn test_longitude_sweep_steps_by_one_hour() {
    let output = longitude_sweep_test().arg("--no-headers").get_output();
    assert!(output.status.success());
    let values = last_column_values(&output.stdout);
    assert_eq!(values.len(), 5);
    for pair in values.windows(2) {
        let shift = (pair[1] - pair[0]).rem_euclid(24.0);
        assert!((shift - 1.0).abs() < 1e-6, "shift was {}", shift);
    }
}

/// Every day of a leap year stays inside [0, 24).
#[test]
fn test_full_year_stays_in_range() {
    let output = SundialTest::new()
        .args([
            "--format=csv",
            "--no-headers",
            "--no-show-inputs",
            "--decimal",
            "--timezone=+00:00",
            "48.85",
            "2.35",
            "2024",
            "time",
        ])
        .get_output();
    assert!(output.status.success());
    let values = last_column_values(&output.stdout);
    assert_eq!(values.len(), 366);
    for value in values {
        assert!((0.0..24.0).contains(&value), "got {}", value);
    }
}

/// Identical invocations produce identical output.
#[test]
fn test_deterministic_output() {
    let run = || {
        SundialTest::new()
            .args([
                "--format=csv",
                "48.85",
                "2.35",
                "2024-02",
                "time",
                "--step=3h",
                "--timezone=+01:00",
            ])
            .get_output()
    };
    let first = run();
    let second = run();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

/// The dial angle is the solar time folded onto a 12-hour face.
#[test]
fn test_dial_angle_matches_solar_time() {
    let lst = decimal_hours("48.85", "2.35", "2024-03-20T12:00:00Z");
    let output = SundialTest::new()
        .args([
            "--format=csv",
            "--no-headers",
            "48.85",
            "2.35",
            "2024-03-20T12:00:00Z",
            "dial",
        ])
        .get_output();
    assert!(output.status.success());
    let values = last_column_values(&output.stdout);
    assert_eq!(values.len(), 1);
    let expected = (lst % 12.0) * 30.0;
    assert!((values[0] - expected).abs() < 0.05, "got {}", values[0]);
}
