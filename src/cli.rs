//! Command-line parsing and validation.

use crate::data::{
    self, Command, DataSource, InputPath, LocationSource, OutputFormat, Parameters, Step,
    TimeSource, TimezoneOverride,
};
use crate::error::CliError;
use std::collections::HashSet;
use std::path::PathBuf;

type CliResult<T> = Result<T, CliError>;

type ApplyFn = fn(Option<&str>, &mut Parameters) -> CliResult<()>;

enum OptKind {
    Value(ApplyFn),
    Flag(ApplyFn),
}

struct OptionSpec {
    name: &'static str,
    kind: OptKind,
}

const OPTION_SPECS: &[OptionSpec] = &[
    OptionSpec {
        name: "format",
        kind: OptKind::Value(|value, params| {
            let v = required_value("format", value)?;
            params.output.format = v.parse::<OutputFormat>().map_err(CliError::from)?;
            Ok(())
        }),
    },
    OptionSpec {
        name: "timezone",
        kind: OptKind::Value(|value, params| {
            let v = required_value("timezone", value)?;
            params.timezone = Some(v.parse::<TimezoneOverride>().map_err(CliError::from)?);
            Ok(())
        }),
    },
    OptionSpec {
        name: "step",
        kind: OptKind::Value(|value, params| {
            let v = required_value("step", value)?;
            params.step = Some(v.parse::<Step>().map_err(CliError::from)?);
            Ok(())
        }),
    },
    OptionSpec {
        name: "headers",
        kind: OptKind::Flag(|_, params| {
            params.output.headers = true;
            Ok(())
        }),
    },
    OptionSpec {
        name: "no-headers",
        kind: OptKind::Flag(|_, params| {
            params.output.headers = false;
            Ok(())
        }),
    },
    OptionSpec {
        name: "show-inputs",
        kind: OptKind::Flag(|_, params| {
            params.output.show_inputs = Some(true);
            Ok(())
        }),
    },
    OptionSpec {
        name: "no-show-inputs",
        kind: OptKind::Flag(|_, params| {
            params.output.show_inputs = Some(false);
            Ok(())
        }),
    },
    OptionSpec {
        name: "decimal",
        kind: OptKind::Flag(|_, params| {
            params.decimal = true;
            Ok(())
        }),
    },
    OptionSpec {
        name: "eot",
        kind: OptKind::Flag(|_, params| {
            params.show_eot = true;
            Ok(())
        }),
    },
    OptionSpec {
        name: "perf",
        kind: OptKind::Flag(|_, params| {
            params.perf = true;
            Ok(())
        }),
    },
    OptionSpec {
        name: "help",
        kind: OptKind::Flag(|_, _| Err(CliError::Exit(get_help_text()))),
    },
    OptionSpec {
        name: "version",
        kind: OptKind::Flag(|_, _| Err(CliError::Exit(get_version_text()))),
    },
];

pub fn parse_cli(args: Vec<String>) -> CliResult<(DataSource, Command, Parameters)> {
    if args.len() < 2 {
        return Err(CliError::Exit(
            "Usage: sundial [OPTIONS] <lat> <lon> <dateTime> <time|dial>".to_string(),
        ));
    }

    let mut params = Parameters::default();
    let mut positional = Vec::new();
    let mut applied_options: HashSet<&'static str> = HashSet::new();

    for arg in args.into_iter().skip(1) {
        if let Some(stripped) = arg.strip_prefix("--") {
            let (name, value) = stripped
                .split_once('=')
                .map(|(n, v)| (n, Some(v)))
                .unwrap_or((stripped, None));
            apply_option(name, value, &mut params, &mut applied_options)?;
        } else {
            positional.push(arg);
        }
    }

    if let Some(first) = positional.first()
        && first == "help"
    {
        let message = positional
            .get(1)
            .map(|command| get_command_help(command))
            .unwrap_or_else(get_help_text);
        return Err(CliError::Exit(message));
    }

    let (command, data_source) = parse_positional_args(&positional, &params)?;

    if stdin_input_count(&data_source) > 1 {
        return Err("Stdin (@-) can only be used for one input".into());
    }

    validate_command_options(command, &applied_options)?;

    if params.output.show_inputs.is_none() {
        params.output.show_inputs = Some(should_auto_show_inputs(&data_source));
    }

    Ok((data_source, command, params))
}

fn apply_option(
    name: &str,
    value: Option<&str>,
    params: &mut Parameters,
    applied: &mut HashSet<&'static str>,
) -> CliResult<()> {
    let Some(spec) = OPTION_SPECS.iter().find(|s| s.name == name) else {
        return Err(format!("Unknown option: --{}", name).into());
    };

    match spec.kind {
        OptKind::Value(handler) => {
            let val = required_value(spec.name, value)?;
            handler(Some(val), params)?;
        }
        OptKind::Flag(handler) => {
            if value.is_some() {
                return Err(format!("Option --{} does not take a value", spec.name).into());
            }
            handler(None, params)?;
        }
    }

    applied.insert(spec.name);
    Ok(())
}

fn required_value<'a>(flag: &'static str, value: Option<&'a str>) -> CliResult<&'a str> {
    value.ok_or_else(|| CliError::from(format!("Option --{} requires a value", flag)))
}

fn parse_file_arg(arg: &str) -> CliResult<InputPath> {
    let Some(stripped) = arg.strip_prefix('@') else {
        return Err("Not a file argument".into());
    };

    if stripped == "-" {
        return Ok(InputPath::Stdin);
    }

    Ok(InputPath::File(PathBuf::from(stripped)))
}

fn parse_location_args(lat_str: &str, lon_str: &str) -> CliResult<LocationSource> {
    if lat_str.starts_with('@') && lon_str.starts_with('@') {
        return Err("Cannot have both lat and lon as files".into());
    }

    if lat_str.starts_with('@') {
        return Ok(LocationSource::File(parse_file_arg(lat_str)?));
    }

    if lon_str.starts_with('@') {
        return Ok(LocationSource::File(parse_file_arg(lon_str)?));
    }

    let lat_span = match parse_span(lat_str)? {
        Some(span) => Some(data::check_latitude_span(span).map_err(CliError::from)?),
        None => None,
    };
    let lon_span = match parse_span(lon_str)? {
        Some(span) => Some(data::check_longitude_span(span).map_err(CliError::from)?),
        None => None,
    };

    let single_lat = || -> CliResult<f64> {
        let value = lat_str
            .parse::<f64>()
            .map_err(|_| CliError::from(format!("Invalid latitude: {}", lat_str)))?;
        data::check_latitude(value).map_err(CliError::from)
    };
    let single_lon = || -> CliResult<f64> {
        let value = lon_str
            .parse::<f64>()
            .map_err(|_| CliError::from(format!("Invalid longitude: {}", lon_str)))?;
        data::check_longitude(value).map_err(CliError::from)
    };

    match (lat_span, lon_span) {
        (Some(lat), Some(lon)) => Ok(LocationSource::Range { lat, lon }),
        (Some(lat), None) => {
            let lon = single_lon()?;
            Ok(LocationSource::Range {
                lat,
                lon: (lon, lon, 0.0),
            })
        }
        (None, Some(lon)) => {
            let lat = single_lat()?;
            Ok(LocationSource::Range {
                lat: (lat, lat, 0.0),
                lon,
            })
        }
        (None, None) => Ok(LocationSource::Single(single_lat()?, single_lon()?)),
    }
}

fn parse_positional_args(
    positional_args: &[String],
    params: &Parameters,
) -> CliResult<(Command, DataSource)> {
    if positional_args.is_empty() {
        return Err("Need at least command and one argument".into());
    }

    let command_index = positional_args
        .iter()
        .position(|arg| arg == "time" || arg == "dial")
        .ok_or("No command found".to_string())?;

    let command = match positional_args[command_index].as_str() {
        "time" => Command::Time,
        "dial" => Command::Dial,
        other => return Err(format!("Unknown command: {}", other).into()),
    };

    let data_args = &positional_args[..command_index];

    if data_args.is_empty() {
        return Err("Need at least command and one argument".into());
    }

    let data_source = parse_data_source(data_args, params)?;

    Ok((command, data_source))
}

fn parse_data_source(args: &[String], params: &Parameters) -> CliResult<DataSource> {
    match args.len() {
        1 => {
            let arg = &args[0];
            if arg.starts_with('@') {
                Ok(DataSource::Paired(parse_file_arg(arg)?))
            } else {
                Err("Single argument must be a file (@file or @-)".into())
            }
        }
        2 => {
            let arg1 = &args[0];
            let arg2 = &args[1];

            if arg1.starts_with('@') && arg2.starts_with('@') {
                let location_source = LocationSource::File(parse_file_arg(arg1)?);
                let time_source = TimeSource::File(parse_file_arg(arg2)?);
                Ok(DataSource::Separate(location_source, time_source))
            } else if arg1.starts_with('@') {
                let location_source = LocationSource::File(parse_file_arg(arg1)?);
                let time_source = parse_time_arg(arg2, params)?;
                Ok(DataSource::Separate(location_source, time_source))
            } else {
                Err("Two arguments: Use @coords.txt @times.txt, @coords.txt datetime, or three arguments (lat lon datetime)".into())
            }
        }
        3 => {
            let location_source = parse_location_args(&args[0], &args[1])?;
            let time_source = parse_time_arg(&args[2], params)?;
            Ok(DataSource::Separate(location_source, time_source))
        }
        _ => Err("Too many arguments".into()),
    }
}

fn parse_time_arg(time_str: &str, params: &Parameters) -> CliResult<TimeSource> {
    if time_str.starts_with('@') {
        return Ok(TimeSource::File(parse_file_arg(time_str)?));
    }

    if time_str == "now" {
        return Ok(TimeSource::Now);
    }

    if data::time::is_partial_date(time_str) || data::time::is_date_without_time(time_str) {
        return Ok(TimeSource::Series(time_str.to_string(), params.step));
    }

    if params.step.is_some() {
        return Err(
            "Option --step requires date-only input (YYYY, YYYY-MM, or YYYY-MM-DD) or 'now'".into(),
        );
    }

    data::time::parse_datetime(time_str, params.timezone_str()).map_err(CliError::from)?;
    Ok(TimeSource::Single(time_str.to_string()))
}

fn parse_span(s: &str) -> Result<Option<(f64, f64, f64)>, CliError> {
    let Some((start_str, rest)) = s.split_once(':') else {
        return Ok(None);
    };
    let Some((end_str, step_str)) = rest.split_once(':') else {
        return Err(format!("Range must be start:end:step, got: {}", s).into());
    };

    let (start, end, step) = (
        start_str
            .parse()
            .map_err(|_| CliError::from(format!("Invalid range start: {}", start_str)))?,
        end_str
            .parse()
            .map_err(|_| CliError::from(format!("Invalid range end: {}", end_str)))?,
        step_str
            .parse()
            .map_err(|_| CliError::from(format!("Invalid range step: {}", step_str)))?,
    );

    if step <= 0.0 {
        return Err("Range step must be positive".into());
    }

    Ok(Some((start, end, step)))
}

fn stdin_input_count(source: &DataSource) -> usize {
    match source {
        DataSource::Separate(loc, time) => {
            usize::from(matches!(loc, LocationSource::File(InputPath::Stdin)))
                + usize::from(matches!(time, TimeSource::File(InputPath::Stdin)))
        }
        DataSource::Paired(path) => usize::from(*path == InputPath::Stdin),
    }
}

fn validate_command_options(command: Command, applied: &HashSet<&'static str>) -> CliResult<()> {
    if command == Command::Dial {
        if applied.contains("decimal") {
            return Err("Option --decimal not valid for dial command".into());
        }
        if applied.contains("eot") {
            return Err("Option --eot not valid for dial command".into());
        }
    }

    Ok(())
}

fn should_auto_show_inputs(source: &DataSource) -> bool {
    match source {
        DataSource::Separate(loc, time) => {
            matches!(loc, LocationSource::Range { .. } | LocationSource::File(_))
                || matches!(time, TimeSource::Series(_, _) | TimeSource::File(_))
        }
        DataSource::Paired(_) => true,
    }
}

fn get_version_text() -> String {
    format!(
        "sundial {}\n Build: {} ({})\n Built: {}\n Features: {}",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TARGET"),
        env!("BUILD_DATE"),
        env!("BUILD_FEATURES")
    )
}

fn get_help_text() -> String {
    let defaults = Parameters::default();
    let formats = OutputFormat::all().join(", ");
    format!(
        r#"sundial {}
Calculates apparent solar time (sundial time) from the equation of time.

Usage:
  sundial [OPTIONS] <latitude> <longitude> <dateTime> <time|dial>
  sundial [OPTIONS] @data.txt <time|dial>
  sundial [OPTIONS] @coords.txt @times.txt <time|dial>
  sundial [OPTIONS] @coords.txt <dateTime> <time|dial>

Examples:
  sundial 48.85 2.35 2024-03-20T12:00:00Z time
  sundial 48.85 2.35 now dial --step=60s
  sundial 48.85 0:60:15 2024-06-21T12:00:00 time --format=csv
  sundial @coords.txt 2024-06-21 time
  echo "48.85 2.35 2024-03-20T12:00:00" | sundial @- time

Arguments:
  <latitude>         Latitude: decimal degrees, range, or file.
                       Range: -90 to +90
                       48.85           single coordinate
                       40:60:5         range from 40 to 60 in 5-degree steps
                       @coords.txt     file with coordinates (or @- for stdin)
                     Reported alongside results; the solar time formula
                     itself depends on the date and longitude only.

  <longitude>        Longitude: decimal degrees, range, or file.
                       Range: -180 to +180. Each 15 degrees east shifts
                       solar time one hour later.

  <dateTime>         Date/time: ISO, partial dates, unix timestamp, or file.
                       2024-03-20T12:00:00  date and time
                       2024-03-20 12:00     date and time (space separator)
                       2024-03-20           whole day (hourly series)
                       2024-06              entire month (hourly series)
                       2024                 entire year (daily series)
                       now                  current time; with --step,
                                              refreshes forever
                       1704067200           unix timestamp (seconds)
                       @times.txt           file with times (or @- for stdin)

  File inputs:
    - Coordinate files contain lat lon per line.
    - Time files contain one datetime per line.
    - Paired data files contain lat lon datetime per line.
    - Files accept comma- or whitespace-separated fields.
    - Blank lines and lines starting with # are ignored.
    - Stdin (@-) can be used for only one input parameter.

Options:
  --format=<format>     Output format: {}. Default: {}
  --timezone=<tz>       Timezone offset (+01:00) or IANA name (Europe/Paris).
                        Overrides timezone for parsing and output.
  --step=<interval>     Sample interval for date series, or refresh interval
                        with 'now' (--step=60s ticks like a wall clock).
                        Examples: 30s, 15m, 2h, 1d
  --[no-]headers        Include headers in CSV output. Default: {}
  --[no-]show-inputs    Include inputs in output. Auto-enabled for ranges,
                        files, and date series unless --no-show-inputs is
                        used.
  --perf                Print performance statistics to stderr.
  --help                Show this help message and exit.
  --version             Print version information and exit.

Commands:
  time                  Apparent solar time for each location and instant.
  dial                  Sundial hand rotation angle and clock label.

Run 'sundial help <command>' for command-specific options.
"#,
        env!("CARGO_PKG_VERSION"),
        formats,
        defaults.output.format,
        defaults.output.headers
    )
}

fn get_command_help(command: &str) -> String {
    match command {
        "time" => r#"Usage:
  sundial [OPTIONS] <latitude> <longitude> <dateTime> time
  sundial [OPTIONS] @data.txt time
  sundial [OPTIONS] @coords.txt @times.txt time
  sundial [OPTIONS] @coords.txt <dateTime> time

Calculates apparent solar time.

Options:
  --decimal             Print fractional hours instead of an HH:MM label.
  --eot                 Also report day-of-year and equation-of-time minutes.

Examples:
  sundial 48.85 2.35 2024-06-21T12:00:00 time
  sundial 48.85 2.35 2024-06-21 time --step=10m
  sundial 48.85 2.35 2024 time --eot --format=csv
"#
        .to_string(),
        "dial" => r#"Usage:
  sundial [OPTIONS] <latitude> <longitude> <dateTime> dial
  sundial [OPTIONS] @data.txt dial
  sundial [OPTIONS] @coords.txt @times.txt dial
  sundial [OPTIONS] @coords.txt <dateTime> dial

Calculates the rotation of a 12-hour sundial hand (30 degrees per hour)
together with the HH:MM label.

Examples:
  sundial 48.85 2.35 now dial
  sundial 48.85 2.35 now dial --step=60s
  sundial 48.85 2.35 2024-06-21 dial --format=json
"#
        .to_string(),
        _ => format!(
            "Unknown command: {}\n\nRun 'sundial --help' for usage.",
            command
        ),
    }
}
