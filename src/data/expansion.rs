//! Lazy expansion of location and time inputs into a sample stream.
//!
//! Ranges, files, and date series all become iterators; nothing is
//! materialized unless a sweep needs to replay the time axis per location.
//! File errors carry `file:line:` prefixes and halt the stream.

use crate::data::config::Step;
use crate::data::time::{self, Zone};
use crate::data::types::{
    InputPath, LocationSource, LocationStream, SampleResult, SampleStream, TimeSource,
};
use crate::data::validation::{check_latitude, check_longitude};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::Arc;

fn open_input(path: &InputPath) -> io::Result<Box<dyn BufRead>> {
    match path {
        InputPath::Stdin => Ok(Box::new(BufReader::new(io::stdin()))),
        InputPath::File(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
    }
}

fn split_fields(line: &str) -> Vec<&str> {
    if line.contains(',') {
        line.split(',').collect()
    } else {
        line.split_whitespace().collect()
    }
}

/// Streams parsed records from a file or stdin. Blank lines and `#` comments
/// are skipped; the first bad line yields its error and ends the stream.
fn read_records<T, F>(
    path: InputPath,
    parse: F,
) -> Result<Box<dyn Iterator<Item = Result<T, String>>>, String>
where
    T: 'static,
    F: Fn(&str) -> Result<T, String> + 'static,
{
    let label = path.describe();
    let reader = open_input(&path).map_err(|e| format!("Error opening {}: {}", label, e))?;

    let mut lines = reader.lines().enumerate();
    let mut halted = false;

    let iter = std::iter::from_fn(move || {
        if halted {
            return None;
        }
        for (idx, line) in lines.by_ref() {
            let line_number = idx + 1;
            let line = match line {
                Ok(value) => value,
                Err(e) => {
                    halted = true;
                    return Some(Err(format!(
                        "{}:{}: failed to read line: {}",
                        label, line_number, e
                    )));
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            return match parse(trimmed) {
                Ok(value) => Some(Ok(value)),
                Err(e) => {
                    halted = true;
                    Some(Err(format!("{}:{}: {}", label, line_number, e)))
                }
            };
        }
        None
    });

    Ok(Box::new(iter))
}

fn parse_coord_line(line: &str) -> Result<(f64, f64), String> {
    let parts = split_fields(line);
    if parts.len() < 2 {
        return Err(format!("expected 2 fields (lat lon), found {}", parts.len()));
    }
    if parts.len() > 2 {
        return Err(format!(
            "expected 2 fields (lat lon), found {}. Lines carrying a datetime belong in a paired data file",
            parts.len()
        ));
    }

    let lat = parts[0]
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid latitude '{}'", parts[0]))?;
    let lon = parts[1]
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid longitude '{}'", parts[1]))?;

    Ok((check_latitude(lat)?, check_longitude(lon)?))
}

fn coord_steps(range: (f64, f64, f64)) -> Box<dyn Iterator<Item = f64>> {
    let (start, end, step) = range;
    if step == 0.0 || start == end {
        Box::new(std::iter::once(start))
    } else {
        // Half-step tolerance keeps the inclusive endpoint despite float drift.
        Box::new(std::iter::successors(Some(start), move |&value| {
            let next = value + step;
            (next <= end + step * 0.5).then_some(next)
        }))
    }
}

pub fn expand_locations(source: LocationSource) -> Result<LocationStream, String> {
    match source {
        LocationSource::Single(lat, lon) => Ok(Box::new(std::iter::once(Ok((lat, lon))))),
        LocationSource::Range { lat, lon } => {
            let lons = Arc::new(coord_steps(lon).collect::<Vec<f64>>());
            let iter = coord_steps(lat).flat_map(move |lat| {
                let lons = Arc::clone(&lons);
                (0..lons.len()).map(move |idx| Ok::<(f64, f64), String>((lat, lons[idx])))
            });
            Ok(Box::new(iter))
        }
        LocationSource::File(path) => read_records(path, parse_coord_line),
    }
}

pub struct TimeStream {
    iter: Box<dyn Iterator<Item = Result<DateTime<FixedOffset>, String>>>,
    bounded: bool,
}

impl TimeStream {
    fn new<I>(iter: I, bounded: bool) -> Self
    where
        I: Iterator<Item = Result<DateTime<FixedOffset>, String>> + 'static,
    {
        Self {
            iter: Box::new(iter),
            bounded,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.bounded
    }

    pub fn into_inner(self) -> Box<dyn Iterator<Item = Result<DateTime<FixedOffset>, String>>> {
        self.iter
    }
}

/// Steps through a series in UTC and reattaches the zone afterwards, so a
/// DST transition never repeats or skips a sample.
struct Ticker {
    zone: Zone,
    next: Option<DateTime<FixedOffset>>,
    end: DateTime<FixedOffset>,
    step: Duration,
}

impl Iterator for Ticker {
    type Item = DateTime<FixedOffset>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let candidate = self.zone.from_utc(&(current.naive_utc() + self.step));
        self.next = (candidate <= self.end).then_some(candidate);
        Some(current)
    }
}

fn series_bounds(date_str: &str) -> Result<(NaiveDateTime, NaiveDateTime), String> {
    let span = |first: NaiveDate, last: NaiveDate| {
        (
            first
                .and_hms_opt(0, 0, 0)
                .expect("midnight must be constructible"),
            last.and_hms_opt(23, 59, 59)
                .expect("end-of-day must be constructible"),
        )
    };

    let parts: Vec<&str> = date_str.split('-').collect();
    let year = parts[0]
        .parse::<i32>()
        .map_err(|_| format!("Invalid year value: '{}'", parts[0]))?;

    match parts.len() {
        1 => {
            let first = NaiveDate::from_ymd_opt(year, 1, 1)
                .ok_or_else(|| format!("Invalid start of year for {}", date_str))?;
            let last = NaiveDate::from_ymd_opt(year, 12, 31)
                .ok_or_else(|| format!("Invalid end of year for {}", date_str))?;
            Ok(span(first, last))
        }
        2 => {
            let month = parts[1]
                .parse::<u32>()
                .map_err(|_| format!("Invalid month value: '{}'", parts[1]))?;
            let first = NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| format!("Invalid month in '{}'", date_str))?;
            let (next_year, next_month) = if month == 12 {
                (year + 1, 1)
            } else {
                (year, month + 1)
            };
            let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
                .and_then(|d| d.pred_opt())
                .ok_or_else(|| format!("Cannot determine end of month for {}", date_str))?;
            Ok(span(first, last))
        }
        3 => {
            let month = parts[1]
                .parse::<u32>()
                .map_err(|_| format!("Invalid month value: '{}'", parts[1]))?;
            let day = parts[2]
                .parse::<u32>()
                .map_err(|_| format!("Invalid day value: '{}'", parts[2]))?;
            let date = NaiveDate::from_ymd_opt(year, month, day)
                .ok_or_else(|| format!("Invalid date: '{}'", date_str))?;
            Ok(span(date, date))
        }
        _ => Err(format!(
            "Unsupported date format: '{}'. Use YYYY, YYYY-MM, or YYYY-MM-DD",
            date_str
        )),
    }
}

fn default_step(date_str: &str) -> Duration {
    // A whole year samples daily, a month or day samples hourly.
    if date_str.len() == 4 {
        Duration::days(1)
    } else {
        Duration::hours(1)
    }
}

fn expand_series(date_str: &str, step: Duration, tz: Option<&str>) -> Result<TimeStream, String> {
    let zone = time::resolve_zone(tz);
    let (start, end) = series_bounds(date_str)?;

    let start_dt = zone.from_local(&start).ok_or_else(|| {
        format!(
            "Start time does not exist in timezone (likely DST gap): {}",
            date_str
        )
    })?;
    let end_dt = zone.from_local(&end).ok_or_else(|| {
        format!(
            "End time does not exist in timezone (likely DST gap): {}",
            date_str
        )
    })?;

    let ticker = Ticker {
        zone,
        next: Some(start_dt),
        end: end_dt,
        step,
    };
    Ok(TimeStream::new(ticker.map(Ok), true))
}

pub fn expand_times(
    source: TimeSource,
    step_override: Option<Step>,
    tz: Option<&str>,
) -> Result<TimeStream, String> {
    match source {
        TimeSource::Single(dt_str) => {
            let dt = time::parse_datetime(&dt_str, tz)?;
            Ok(TimeStream::new(std::iter::once(Ok(dt)), true))
        }
        TimeSource::Series(date_str, step_opt) => {
            let step = step_override
                .or(step_opt)
                .map(Step::duration)
                .unwrap_or_else(|| default_step(&date_str));
            expand_series(&date_str, step, tz)
        }
        TimeSource::File(path) => {
            let tz_owned = tz.map(str::to_string);
            let iter = read_records(path, move |line| {
                time::parse_datetime(line, tz_owned.as_deref())
            })?;
            Ok(TimeStream::new(iter, true))
        }
        TimeSource::Now => {
            let zone = time::resolve_zone(tz);
            match step_override {
                Some(step) => {
                    let pause = step
                        .duration()
                        .to_std()
                        .unwrap_or(std::time::Duration::from_secs(1));
                    let mut first = true;
                    let iter = std::iter::from_fn(move || {
                        if !std::mem::take(&mut first) {
                            std::thread::sleep(pause);
                        }
                        Some(Ok(zone.from_utc(&Utc::now().naive_utc())))
                    });
                    Ok(TimeStream::new(iter, false))
                }
                None => Ok(TimeStream::new(
                    std::iter::once(Ok(zone.from_utc(&Utc::now().naive_utc()))),
                    true,
                )),
            }
        }
    }
}

/// Combines a location source and a time source into one sample stream,
/// location-major: each location runs through the whole time axis before
/// the next one starts.
pub fn expand_sources(
    loc_source: LocationSource,
    time_source: TimeSource,
    step: Option<Step>,
    tz: Option<&str>,
) -> Result<SampleStream, String> {
    let time_stream = expand_times(time_source, step, tz)?;

    if let LocationSource::Single(lat, lon) = loc_source {
        return Ok(Box::new(
            time_stream
                .into_inner()
                .map(move |item| item.map(|dt| (lat, lon, dt))),
        ));
    }

    if !time_stream.is_bounded() {
        return Err(
            "Watch mode ('now' with --step) needs a single latitude/longitude pair".to_string(),
        );
    }

    let times = Arc::new(
        time_stream
            .into_inner()
            .collect::<Result<Vec<_>, String>>()?,
    );
    let locations = expand_locations(loc_source)?;
    let iter = locations.flat_map(move |loc_result| -> SampleStream {
        match loc_result {
            Ok((lat, lon)) => {
                let times = Arc::clone(&times);
                Box::new((0..times.len()).map(move |idx| -> SampleResult { Ok((lat, lon, times[idx])) }))
            }
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    });
    Ok(Box::new(iter))
}

pub fn expand_paired(path: InputPath, tz: Option<&str>) -> Result<SampleStream, String> {
    let tz_owned = tz.map(str::to_string);
    let iter = read_records(path, move |line| -> SampleResult {
        let parts = split_fields(line);
        if parts.len() < 3 {
            return Err(format!(
                "expected 3 fields (lat lon datetime), found {}",
                parts.len()
            ));
        }

        let lat = parts[0]
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid latitude '{}'", parts[0]))?;
        let lon = parts[1]
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("invalid longitude '{}'", parts[1]))?;
        let lat = check_latitude(lat)?;
        let lon = check_longitude(lon)?;

        let dt_str = parts[2..].join(" ");
        let dt = time::parse_datetime(dt_str.trim(), tz_owned.as_deref())?;
        Ok((lat, lon, dt))
    })?;
    Ok(iter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_steps_include_the_endpoint() {
        let values: Vec<f64> = coord_steps((13.0, 14.0, 0.5)).collect();
        assert_eq!(values, vec![13.0, 13.5, 14.0]);
        assert_eq!(coord_steps((52.0, 52.0, 0.1)).count(), 1);
    }

    #[test]
    fn series_bounds_cover_year_month_day() {
        let (start, end) = series_bounds("2024").unwrap();
        assert_eq!(start.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-01-01 00:00:00");
        assert_eq!(end.format("%Y-%m-%d %H:%M:%S").to_string(), "2024-12-31 23:59:59");

        let (start, end) = series_bounds("2024-02").unwrap();
        assert_eq!(start.format("%Y-%m-%d").to_string(), "2024-02-01");
        assert_eq!(end.format("%Y-%m-%d").to_string(), "2024-02-29");

        let (start, end) = series_bounds("2024-06-21").unwrap();
        assert_eq!(start.format("%Y-%m-%d").to_string(), "2024-06-21");
        assert_eq!(end.format("%Y-%m-%d").to_string(), "2024-06-21");
    }

    #[test]
    fn hourly_day_series_has_24_samples() {
        let stream = expand_series("2024-06-21", Duration::hours(1), Some("+00:00")).unwrap();
        let times: Vec<_> = stream.into_inner().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(times.len(), 24);
        assert_eq!(times[0].format("%H:%M").to_string(), "00:00");
        assert_eq!(times[23].format("%H:%M").to_string(), "23:00");
    }

    #[test]
    fn sweep_is_location_major() {
        let stream = expand_sources(
            LocationSource::Range {
                lat: (10.0, 20.0, 10.0),
                lon: (0.0, 0.0, 0.0),
            },
            TimeSource::Series("2024-06-21".to_string(), None),
            Some("12h".parse().unwrap()),
            Some("+00:00"),
        )
        .unwrap();
        let samples: Vec<_> = stream.collect::<Result<Vec<_>, _>>().unwrap();
        let lats: Vec<f64> = samples.iter().map(|s| s.0).collect();
        assert_eq!(lats, vec![10.0, 10.0, 20.0, 20.0]);
    }
}
