//! Solar time calculations over the sample stream.

use crate::data::{Command, SampleStream};
use crate::solar;
use chrono::{DateTime, FixedOffset};

#[derive(Debug, Clone)]
pub enum CalculationResult {
    Time {
        lat: f64,
        lon: f64,
        datetime: DateTime<FixedOffset>,
        solar_hours: f64,
        day_of_year: u32,
        eot_minutes: f64,
    },
    Dial {
        lat: f64,
        lon: f64,
        datetime: DateTime<FixedOffset>,
        solar_hours: f64,
        angle: f64,
    },
}

impl CalculationResult {
    pub fn location(&self) -> (f64, f64) {
        match self {
            CalculationResult::Time { lat, lon, .. } => (*lat, *lon),
            CalculationResult::Dial { lat, lon, .. } => (*lat, *lon),
        }
    }

    pub fn datetime(&self) -> DateTime<FixedOffset> {
        match self {
            CalculationResult::Time { datetime, .. } => *datetime,
            CalculationResult::Dial { datetime, .. } => *datetime,
        }
    }
}

pub fn calculate_time(lat: f64, lon: f64, dt: DateTime<FixedOffset>) -> CalculationResult {
    let solar_hours = solar::solar_time(&dt, lat, lon);
    CalculationResult::Time {
        lat,
        lon,
        datetime: dt,
        solar_hours,
        day_of_year: solar::day_of_year(&dt),
        eot_minutes: solar::equation_of_time(solar::fractional_year(&dt)),
    }
}

pub fn calculate_dial(lat: f64, lon: f64, dt: DateTime<FixedOffset>) -> CalculationResult {
    let solar_hours = solar::solar_time(&dt, lat, lon);
    CalculationResult::Dial {
        lat,
        lon,
        datetime: dt,
        solar_hours,
        angle: solar::hand_angle(solar_hours),
    }
}

pub type ResultStream = Box<dyn Iterator<Item = Result<CalculationResult, String>>>;

pub fn calculate_stream(data: SampleStream, command: Command) -> ResultStream {
    match command {
        Command::Time => Box::new(
            data.map(|sample| sample.map(|(lat, lon, dt)| calculate_time(lat, lon, dt))),
        ),
        Command::Dial => Box::new(
            data.map(|sample| sample.map(|(lat, lon, dt)| calculate_dial(lat, lon, dt))),
        ),
    }
}
