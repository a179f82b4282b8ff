//! Datetime parsing and timezone resolution.
//!
//! Every instant handed to the calculator carries an explicit UTC offset.
//! The zone it is resolved against comes from, in order: the `--timezone`
//! override, the `TZ` environment variable, and the detected system zone.

use chrono::{
    DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;
use iana_time_zone::get_timezone;
use std::env;
use std::sync::OnceLock;

static SYSTEM_ZONE: OnceLock<Zone> = OnceLock::new();

/// Test hook: overrides system zone detection without touching `TZ`.
const SYSTEM_ZONE_OVERRIDE_ENV: &str = "SUNDIAL_SYSTEM_TIMEZONE";

#[derive(Clone)]
pub enum Zone {
    Fixed(FixedOffset),
    Named(Tz),
}

impl Zone {
    pub fn from_utc(&self, dt: &NaiveDateTime) -> DateTime<FixedOffset> {
        match self {
            Zone::Fixed(offset) => offset.from_utc_datetime(dt),
            Zone::Named(tz) => Utc.from_utc_datetime(dt).with_timezone(tz).fixed_offset(),
        }
    }

    /// Attaches this zone to a wall-clock time. `None` means the time falls
    /// into a DST gap and does not exist; ambiguous times resolve to the
    /// earlier offset.
    pub fn from_local(&self, dt: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Zone::Fixed(offset) => match offset.from_local_datetime(dt) {
                chrono::LocalResult::Single(dt) => Some(dt),
                chrono::LocalResult::Ambiguous(first, _) => Some(first),
                chrono::LocalResult::None => None,
            },
            Zone::Named(tz) => match tz.from_local_datetime(dt) {
                chrono::LocalResult::Single(dt) => Some(dt.fixed_offset()),
                chrono::LocalResult::Ambiguous(first, _) => Some(first.fixed_offset()),
                chrono::LocalResult::None => None,
            },
        }
    }
}

/// Parses `+HH:MM`, `+HH`, or `-HHMM`-less variants into a fixed offset.
pub fn parse_offset(spec: &str) -> Option<FixedOffset> {
    let (sign, rest) = match spec.as_bytes().first()? {
        b'+' => (1, &spec[1..]),
        b'-' => (-1, &spec[1..]),
        _ => return None,
    };

    let (hours, minutes) = if let Some((h, m)) = rest.split_once(':') {
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else {
        (rest.parse::<i32>().ok()?, 0)
    };

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

pub fn parse_zone_spec(spec: &str) -> Option<Zone> {
    if spec.is_empty() {
        return None;
    }
    parse_offset(spec)
        .map(Zone::Fixed)
        .or_else(|| spec.parse::<Tz>().ok().map(Zone::Named))
}

fn detect_system_zone() -> Zone {
    env::var(SYSTEM_ZONE_OVERRIDE_ENV)
        .ok()
        .as_deref()
        .and_then(parse_zone_spec)
        .or_else(|| get_timezone().ok().as_deref().and_then(parse_zone_spec))
        .unwrap_or_else(|| Zone::Fixed(Local::now().offset().fix()))
}

pub fn resolve_zone(override_tz: Option<&str>) -> Zone {
    override_tz
        .map(str::trim)
        .and_then(parse_zone_spec)
        .or_else(|| env::var("TZ").ok().as_deref().map(str::trim).and_then(parse_zone_spec))
        .unwrap_or_else(|| SYSTEM_ZONE.get_or_init(detect_system_zone).clone())
}

fn gap_error(dt_str: &str) -> String {
    format!(
        "Datetime does not exist in timezone (likely DST gap): {}",
        dt_str
    )
}

/// Parses a datetime string into an offset-carrying instant.
///
/// Accepted forms: `now`, RFC 3339, `YYYY-MM-DDTHH:MM[:SS]`,
/// `YYYY-MM-DD HH:MM[:SS]`, a bare date (midnight), and unix timestamps of
/// at least five digits. Naive forms are interpreted in the resolved zone;
/// explicit offsets win unless an override is given.
pub fn parse_datetime(dt_str: &str, override_tz: Option<&str>) -> Result<DateTime<FixedOffset>, String> {
    if dt_str == "now" {
        let zone = resolve_zone(override_tz);
        return Ok(zone.from_utc(&Utc::now().naive_utc()));
    }

    if let Ok(timestamp) = dt_str.parse::<i64>() {
        // Five or more digits so years are never mistaken for timestamps.
        if timestamp.abs() >= 10000 {
            let utc_dt = DateTime::<Utc>::from_timestamp(timestamp, 0)
                .ok_or_else(|| format!("Invalid unix timestamp: {}", timestamp))?;
            if override_tz.is_some() {
                let zone = resolve_zone(override_tz);
                return Ok(zone.from_utc(&utc_dt.naive_utc()));
            }
            return Ok(utc_dt.fixed_offset());
        }
    }

    if dt_str.contains('T') {
        if let Ok(fixed) = DateTime::parse_from_rfc3339(dt_str) {
            if override_tz.is_some() {
                let zone = resolve_zone(override_tz);
                return Ok(zone.from_utc(&fixed.naive_utc()));
            }
            return Ok(fixed);
        }

        let naive = NaiveDateTime::parse_from_str(dt_str, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(dt_str, "%Y-%m-%dT%H:%M"))
            .map_err(|e| format!("Failed to parse datetime: {}", e))?;
        return resolve_zone(override_tz)
            .from_local(&naive)
            .ok_or_else(|| gap_error(dt_str));
    }

    if dt_str.contains(' ') && dt_str.contains(':') {
        let naive = NaiveDateTime::parse_from_str(dt_str, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(dt_str, "%Y-%m-%d %H:%M"))
            .map_err(|e| format!("Failed to parse datetime: {}", e))?;
        return resolve_zone(override_tz)
            .from_local(&naive)
            .ok_or_else(|| gap_error(dt_str));
    }

    let date = NaiveDate::parse_from_str(dt_str, "%Y-%m-%d")
        .map_err(|e| format!("Failed to parse date: {}", e))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("Invalid date: {}", dt_str))?;
    resolve_zone(override_tz)
        .from_local(&midnight)
        .ok_or_else(|| gap_error(dt_str))
}

/// Parses a positive step: bare seconds, or `<number><unit>` with s/m/h/d.
pub fn parse_step(s: &str) -> Result<Duration, String> {
    let positive = |value: i64| {
        if value <= 0 {
            Err(format!("Step must be positive, got '{}'", s))
        } else {
            Ok(value)
        }
    };

    if let Ok(raw_seconds) = s.parse::<i64>() {
        return Ok(Duration::seconds(positive(raw_seconds)?));
    }

    if s.len() < 2 {
        return Err(format!(
            "Invalid step format: '{}'. Expected <number><unit> such as 60s or 15m",
            s
        ));
    }

    let (number, unit) = s.split_at(s.len() - 1);
    let value = positive(number.parse::<i64>().map_err(|_| {
        format!(
            "Invalid step value in '{}'. Use an integer before the unit (e.g., 15m)",
            s
        )
    })?)?;

    match unit {
        "s" => Ok(Duration::seconds(value)),
        "m" => Ok(Duration::minutes(value)),
        "h" => Ok(Duration::hours(value)),
        "d" => Ok(Duration::days(value)),
        _ => Err(format!(
            "Invalid step unit in '{}'. Supported units: s, m, h, d",
            s
        )),
    }
}

/// `YYYY` or `YYYY-MM`.
pub fn is_partial_date(s: &str) -> bool {
    match s.len() {
        4 => s.chars().all(|c| c.is_ascii_digit()),
        7 if s.as_bytes().get(4) == Some(&b'-') => s
            .chars()
            .enumerate()
            .all(|(idx, c)| idx == 4 || c.is_ascii_digit()),
        _ => false,
    }
}

/// `YYYY-MM-DD` with no time component.
pub fn is_date_without_time(s: &str) -> bool {
    s.len() == 10
        && s.chars()
            .enumerate()
            .all(|(idx, c)| if matches!(idx, 4 | 7) { c == '-' } else { c.is_ascii_digit() })
}
