use crate::data::time;
use chrono::Duration;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Csv,
    Json,
    #[cfg(feature = "parquet")]
    Parquet,
}

impl OutputFormat {
    pub fn all() -> Vec<&'static str> {
        #[cfg(feature = "parquet")]
        {
            vec!["text", "csv", "json", "parquet"]
        }
        #[cfg(not(feature = "parquet"))]
        {
            vec!["text", "csv", "json"]
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            #[cfg(feature = "parquet")]
            "parquet" => Ok(OutputFormat::Parquet),
            #[cfg(not(feature = "parquet"))]
            "parquet" => Err(
                "PARQUET format not available. Recompile with --features parquet".to_string(),
            ),
            _ => Err(format!(
                "Invalid format: '{}'. Supported formats: {}",
                s,
                OutputFormat::all().join(", ")
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Text => "text",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            #[cfg(feature = "parquet")]
            OutputFormat::Parquet => "parquet",
        };
        write!(f, "{}", name)
    }
}

/// A positive time step such as `30s`, `15m`, `2h`, or `1d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step(Duration);

impl Step {
    pub fn duration(self) -> Duration {
        self.0
    }
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time::parse_step(s).map(Step)
    }
}

/// Timezone override: a fixed offset (`+02:00`) or an IANA zone name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimezoneOverride(String);

impl TimezoneOverride {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TimezoneOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match time::parse_zone_spec(s.trim()) {
            Some(_) => Ok(TimezoneOverride(s.trim().to_string())),
            None => Err(format!(
                "Invalid timezone: '{}'. Use an offset like +02:00 or an IANA name like Europe/Paris",
                s
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub headers: bool,
    pub show_inputs: Option<bool>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            headers: true,
            show_inputs: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Parameters {
    pub output: OutputOptions,
    /// Print fractional hours instead of an HH:MM label (time command).
    pub decimal: bool,
    /// Report day-of-year and equation-of-time minutes (time command).
    pub show_eot: bool,
    pub perf: bool,
    pub step: Option<Step>,
    pub timezone: Option<TimezoneOverride>,
}

impl Parameters {
    pub fn timezone_str(&self) -> Option<&str> {
        self.timezone.as_ref().map(TimezoneOverride::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Time,
    Dial,
}
