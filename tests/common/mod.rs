#![allow(dead_code)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Test helper for running sundial commands with less boilerplate
pub struct SundialTest {
    cmd: Command,
}

pub fn sundial_command() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("sundial"))
}

impl SundialTest {
    /// Create a new sundial command test
    pub fn new() -> Self {
        Self {
            cmd: sundial_command(),
        }
    }

    /// Add arguments to the command
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.cmd.args(args);
        self
    }

    /// Add a single argument to the command
    pub fn arg<S: AsRef<std::ffi::OsStr>>(mut self, arg: S) -> Self {
        self.cmd.arg(arg);
        self
    }

    /// Set an environment variable for the command
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    /// Remove an environment variable for the command
    pub fn env_remove(mut self, key: &str) -> Self {
        self.cmd.env_remove(key);
        self
    }

    /// Pipe text into the command's stdin
    pub fn stdin(mut self, input: &str) -> Self {
        self.cmd.write_stdin(input.to_string());
        self
    }

    /// Assert the command succeeds
    pub fn assert_success(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().success()
    }

    /// Assert the command succeeds and contains text in stdout
    pub fn assert_success_contains(mut self, text: &str) -> assert_cmd::assert::Assert {
        self.cmd
            .assert()
            .success()
            .stdout(predicate::str::contains(text))
    }

    /// Assert the command succeeds and contains all texts in stdout
    pub fn assert_success_contains_all(mut self, texts: &[&str]) -> assert_cmd::assert::Assert {
        let mut assertion = self.cmd.assert().success();
        for text in texts {
            assertion = assertion.stdout(predicate::str::contains(*text));
        }
        assertion
    }

    /// Assert the command fails
    pub fn assert_failure(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().failure()
    }

    /// Get the raw command for complex assertions (when helpers aren't enough)
    pub fn command(self) -> Command {
        self.cmd
    }

    /// Get command output for inspection
    pub fn get_output(mut self) -> std::process::Output {
        self.cmd.output().unwrap()
    }
}

/// Quick helper for solar time calculations
pub fn time_test() -> SundialTest {
    SundialTest::new().args(["48.85", "2.35", "2024-03-20T12:00:00Z", "time"])
}

/// Quick helper for solar time with global options (put before positional args)
pub fn time_test_with_format(format: &str) -> SundialTest {
    SundialTest::new().args([
        &format!("--format={}", format),
        "48.85",
        "2.35",
        "2024-03-20T12:00:00Z",
        "time",
    ])
}

/// Quick helper for dial calculations
pub fn dial_test() -> SundialTest {
    SundialTest::new().args(["48.85", "2.35", "2024-03-20T12:00:00Z", "dial"])
}

/// Quick helper for custom coordinates
pub fn custom_time(lat: &str, lon: &str, datetime: &str) -> SundialTest {
    SundialTest::new().args([lat, lon, datetime, "time"])
}

/// Quick helper for a longitude sweep in CSV
pub fn longitude_sweep_test() -> SundialTest {
    SundialTest::new().args([
        "--format=csv",
        "--decimal",
        "0.0",
        "0:60:15",
        "2024-06-21T12:00:00Z",
        "time",
    ])
}

/// Quick helper for a date series with step
pub fn day_series_test(date: &str, step: &str) -> SundialTest {
    SundialTest::new().args([
        "--format=csv",
        "48.85",
        "2.35",
        date,
        "time",
        &format!("--step={}", step),
    ])
}

/// Extract the last CSV column of every data row as f64
pub fn last_column_values(stdout: &[u8]) -> Vec<f64> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|line| !line.is_empty())
        .filter_map(|line| line.rsplit(',').next())
        .filter_map(|field| field.parse::<f64>().ok())
        .collect()
}
