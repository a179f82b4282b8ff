use crate::data::config::Step;
use chrono::{DateTime, FixedOffset};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub enum InputPath {
    Stdin,
    File(PathBuf),
}

impl InputPath {
    pub fn describe(&self) -> String {
        match self {
            InputPath::Stdin => "stdin".to_string(),
            InputPath::File(path) => path.display().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum LocationSource {
    Single(f64, f64),
    Range {
        lat: (f64, f64, f64),
        lon: (f64, f64, f64),
    },
    File(InputPath),
}

#[derive(Debug, Clone)]
pub enum TimeSource {
    /// A fully specified instant.
    Single(String),
    /// A date or partial date expanded into a series: YYYY, YYYY-MM, or
    /// YYYY-MM-DD, with an optional step.
    Series(String, Option<Step>),
    File(InputPath),
    Now,
}

#[derive(Debug, Clone)]
pub enum DataSource {
    Separate(LocationSource, TimeSource),
    Paired(InputPath),
}

impl DataSource {
    pub fn uses_stdin(&self) -> bool {
        match self {
            DataSource::Separate(loc, t) => {
                matches!(loc, LocationSource::File(InputPath::Stdin))
                    || matches!(t, TimeSource::File(InputPath::Stdin))
            }
            DataSource::Paired(path) => *path == InputPath::Stdin,
        }
    }

    /// "now" with a step repeats forever, recomputing against the wall clock.
    pub fn is_watch_mode(&self, step: Option<Step>) -> bool {
        matches!(self, DataSource::Separate(_, TimeSource::Now)) && step.is_some()
    }
}

pub type Sample = (f64, f64, DateTime<FixedOffset>);
pub type SampleResult = Result<Sample, String>;
pub type SampleStream = Box<dyn Iterator<Item = SampleResult>>;

pub type LocationResult = Result<(f64, f64), String>;
pub type LocationStream = Box<dyn Iterator<Item = LocationResult>>;
