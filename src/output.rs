//! Output formatting for CSV, JSON, and text formats.

use crate::compute::{CalculationResult, ResultStream};
use crate::data::{Command, DataSource, LocationSource, OutputFormat, Parameters, TimeSource};
use crate::error::OutputError;
use crate::planner::OutputPlan;
use crate::solar;
use std::cell::{Cell, RefCell};
use std::io::{self, Write};
use std::rc::Rc;
use unicode_width::UnicodeWidthStr;

/// Writes the result stream to stdout in the requested format and returns
/// the record count. A stream error (e.g. a bad file line) ends the run
/// after everything before it has been written.
pub fn dispatch_output(
    results: ResultStream,
    command: Command,
    params: &Parameters,
    plan: &OutputPlan,
) -> Result<usize, OutputError> {
    let error: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
    let count = Rc::new(Cell::new(0usize));
    let ok_results = drain_ok(results, Rc::clone(&error), Rc::clone(&count));

    match params.output.format {
        #[cfg(feature = "parquet")]
        OutputFormat::Parquet => {
            crate::parquet::write_parquet(ok_results, command, params, io::stdout())?;
        }
        _ => {
            let chunks = format_stream(ok_results, command, params, &plan.source);
            let mut out = io::stdout().lock();
            for chunk in chunks {
                out.write_all(chunk.as_bytes())?;
                if plan.flush_each_record {
                    out.flush()?;
                }
            }
            out.flush()?;
        }
    }

    if let Some(message) = error.borrow_mut().take() {
        return Err(OutputError(message));
    }
    Ok(count.get())
}

fn drain_ok(
    results: ResultStream,
    error: Rc<RefCell<Option<String>>>,
    count: Rc<Cell<usize>>,
) -> Box<dyn Iterator<Item = CalculationResult>> {
    Box::new(results.map_while(move |item| match item {
        Ok(result) => {
            count.set(count.get() + 1);
            Some(result)
        }
        Err(e) => {
            *error.borrow_mut() = Some(e);
            None
        }
    }))
}

/// Which of latitude, longitude, and time take multiple values for this run.
fn varying_axes(source: &DataSource, params: &Parameters) -> (bool, bool, bool) {
    match source {
        DataSource::Separate(loc, time) => {
            let (lat_varies, lon_varies) = match loc {
                LocationSource::Single(_, _) => (false, false),
                LocationSource::Range { lat, lon } => (lat.0 != lat.1, lon.0 != lon.1),
                LocationSource::File(_) => (true, true),
            };
            let time_varies = match time {
                TimeSource::Single(_) => false,
                TimeSource::Series(_, _) | TimeSource::File(_) => true,
                TimeSource::Now => params.step.is_some(),
            };
            (lat_varies, lon_varies, time_varies)
        }
        DataSource::Paired(_) => (true, true, true),
    }
}

pub fn format_stream(
    results: Box<dyn Iterator<Item = CalculationResult>>,
    command: Command,
    params: &Parameters,
    source: &DataSource,
) -> Box<dyn Iterator<Item = String>> {
    let show_inputs = params.output.show_inputs.unwrap_or(false);
    let headers = params.output.headers;
    let decimal = params.decimal;
    let show_eot = params.show_eot;

    match params.output.format {
        OutputFormat::Csv => Box::new(results.enumerate().map(move |(index, result)| {
            let first = index == 0;
            match command {
                Command::Time => {
                    format_csv_time(&result, show_inputs, headers, first, decimal, show_eot)
                }
                Command::Dial => format_csv_dial(&result, show_inputs, headers, first),
            }
        })),
        OutputFormat::Json => Box::new(results.map(move |result| {
            let json = match command {
                Command::Time => format_json_time(&result, show_inputs, decimal, show_eot),
                Command::Dial => format_json_dial(&result, show_inputs),
            };
            format!("{}\n", json)
        })),
        _ => {
            let axes = varying_axes(source, params);
            if axes.0 || axes.1 || axes.2 {
                format_text_table(results, command, params, axes)
            } else {
                Box::new(results.map(move |result| match command {
                    Command::Time => format_text_time(&result, show_inputs, decimal, show_eot),
                    Command::Dial => format_text_dial(&result, show_inputs),
                }))
            }
        }
    }
}

fn format_csv_time(
    result: &CalculationResult,
    show_inputs: bool,
    headers: bool,
    first: bool,
    decimal: bool,
    show_eot: bool,
) -> String {
    let CalculationResult::Time {
        lat,
        lon,
        datetime,
        solar_hours,
        day_of_year,
        eot_minutes,
    } = result
    else {
        return String::new();
    };

    let mut output = String::new();

    if first && headers {
        if show_inputs {
            output.push_str("latitude,longitude,");
        }
        output.push_str("dateTime,");
        if show_eot {
            output.push_str("dayOfYear,eotMinutes,");
        }
        output.push_str(if decimal { "solarHours\n" } else { "solarTime\n" });
    }

    if show_inputs {
        output.push_str(&format!("{:.5},{:.5},", lat, lon));
    }
    output.push_str(&datetime.to_rfc3339());
    output.push(',');
    if show_eot {
        output.push_str(&format!("{},{:.3},", day_of_year, eot_minutes));
    }
    if decimal {
        output.push_str(&format!("{:.4}\n", solar_hours));
    } else {
        output.push_str(&format!("{}\n", solar::clock_label(*solar_hours)));
    }
    output
}

fn format_csv_dial(
    result: &CalculationResult,
    show_inputs: bool,
    headers: bool,
    first: bool,
) -> String {
    let CalculationResult::Dial {
        lat,
        lon,
        datetime,
        solar_hours,
        angle,
    } = result
    else {
        return String::new();
    };

    let mut output = String::new();

    if first && headers {
        if show_inputs {
            output.push_str("latitude,longitude,dateTime,solarTime,angle\n");
        } else {
            output.push_str("dateTime,solarTime,angle\n");
        }
    }

    if show_inputs {
        output.push_str(&format!("{:.5},{:.5},", lat, lon));
    }
    output.push_str(&format!(
        "{},{},{:.3}\n",
        datetime.to_rfc3339(),
        solar::clock_label(*solar_hours),
        angle
    ));
    output
}

fn format_json_time(
    result: &CalculationResult,
    show_inputs: bool,
    decimal: bool,
    show_eot: bool,
) -> String {
    let CalculationResult::Time {
        lat,
        lon,
        datetime,
        solar_hours,
        day_of_year,
        eot_minutes,
    } = result
    else {
        return String::new();
    };

    let mut fields = Vec::new();
    if show_inputs {
        fields.push(format!(r#""latitude":{}"#, lat));
        fields.push(format!(r#""longitude":{}"#, lon));
    }
    fields.push(format!(r#""dateTime":"{}""#, datetime.to_rfc3339()));
    if show_eot {
        fields.push(format!(r#""dayOfYear":{}"#, day_of_year));
        fields.push(format!(r#""eotMinutes":{:.3}"#, eot_minutes));
    }
    if decimal {
        fields.push(format!(r#""solarHours":{:.4}"#, solar_hours));
    } else {
        fields.push(format!(
            r#""solarTime":"{}""#,
            solar::clock_label(*solar_hours)
        ));
    }
    format!("{{{}}}", fields.join(","))
}

fn format_json_dial(result: &CalculationResult, show_inputs: bool) -> String {
    let CalculationResult::Dial {
        lat,
        lon,
        datetime,
        solar_hours,
        angle,
    } = result
    else {
        return String::new();
    };

    let mut fields = Vec::new();
    if show_inputs {
        fields.push(format!(r#""latitude":{}"#, lat));
        fields.push(format!(r#""longitude":{}"#, lon));
    }
    fields.push(format!(r#""dateTime":"{}""#, datetime.to_rfc3339()));
    fields.push(format!(
        r#""solarTime":"{}""#,
        solar::clock_label(*solar_hours)
    ));
    fields.push(format!(r#""angle":{:.3}"#, angle));
    format!("{{{}}}", fields.join(","))
}

fn boxed_card(lines: Vec<String>) -> String {
    let max_width = lines.iter().map(|line| line.width()).max().unwrap_or(0);
    let mut output = String::new();
    output.push_str(&format!("┌{}\n", "─".repeat(max_width)));
    for line in lines {
        output.push_str(&line);
        output.push('\n');
    }
    output.push_str(&format!("└{}\n", "─".repeat(max_width)));
    output
}

fn format_text_time(
    result: &CalculationResult,
    show_inputs: bool,
    decimal: bool,
    show_eot: bool,
) -> String {
    let CalculationResult::Time {
        lat,
        lon,
        datetime,
        solar_hours,
        day_of_year,
        eot_minutes,
    } = result
    else {
        return String::new();
    };

    let mut lines = Vec::new();
    if show_inputs {
        lines.push(format!("│ Location     {:.5}°, {:.5}°", lat, lon));
    }
    lines.push(format!(
        "│ DateTime     {}",
        datetime.format("%Y-%m-%d %H:%M:%S%:z")
    ));
    if show_eot {
        lines.push(format!("│ Day of year  {}", day_of_year));
        lines.push(format!("│ Eq. of time  {:+.2} min", eot_minutes));
    }
    if decimal {
        lines.push(format!("│ Solar time   {:.4} h", solar_hours));
    } else {
        lines.push(format!("│ Solar time   {}", solar::clock_label(*solar_hours)));
    }
    boxed_card(lines)
}

fn format_text_dial(result: &CalculationResult, show_inputs: bool) -> String {
    let CalculationResult::Dial {
        lat,
        lon,
        datetime,
        solar_hours,
        angle,
    } = result
    else {
        return String::new();
    };

    let mut lines = Vec::new();
    if show_inputs {
        lines.push(format!("│ Location     {:.5}°, {:.5}°", lat, lon));
    }
    lines.push(format!(
        "│ DateTime     {}",
        datetime.format("%Y-%m-%d %H:%M:%S%:z")
    ));
    lines.push(format!("│ Solar time   {}", solar::clock_label(*solar_hours)));
    lines.push(format!("│ Hand angle   {:.2}°", angle));
    boxed_card(lines)
}

fn format_text_table(
    mut results: Box<dyn Iterator<Item = CalculationResult>>,
    command: Command,
    params: &Parameters,
    axes: (bool, bool, bool),
) -> Box<dyn Iterator<Item = String>> {
    let (lat_varies, lon_varies, time_varies) = axes;
    let decimal = params.decimal;
    let show_eot = params.show_eot;

    // Peek at the first result for the invariant header values.
    let first = match results.next() {
        Some(r) => r,
        None => return Box::new(std::iter::empty()),
    };

    let (lat0, lon0) = first.location();
    let dt0 = first.datetime();

    let mut header = String::new();
    if !lat_varies {
        header.push_str(&format!("  Latitude:   {:.5}°\n", lat0));
    }
    if !lon_varies {
        header.push_str(&format!("  Longitude:  {:.5}°\n", lon0));
    }
    if !time_varies {
        header.push_str(&format!(
            "  DateTime:   {}\n",
            dt0.format("%Y-%m-%d %H:%M:%S%:z")
        ));
    }
    header.push('\n');

    let mut headers_vec: Vec<&str> = Vec::new();
    if lat_varies {
        headers_vec.push("Latitude");
    }
    if lon_varies {
        headers_vec.push("Longitude");
    }
    if time_varies {
        headers_vec.push("DateTime");
    }
    match command {
        Command::Time => {
            if show_eot {
                headers_vec.push("Day");
                headers_vec.push("EoT min");
            }
            headers_vec.push("Solar time");
        }
        Command::Dial => {
            headers_vec.push("Solar time");
            headers_vec.push("Angle");
        }
    }

    let col_widths: Vec<usize> = headers_vec
        .iter()
        .map(|h| {
            let floor = if *h == "DateTime" { 16 } else { 12 };
            h.width().max(floor)
        })
        .collect();

    // Top border
    header.push('┌');
    for (i, width) in col_widths.iter().enumerate() {
        header.push_str(&"─".repeat(width + 2));
        if i < col_widths.len() - 1 {
            header.push('┬');
        }
    }
    header.push_str("┐\n");

    // Header row
    header.push('│');
    for (h, width) in headers_vec.iter().zip(&col_widths) {
        header.push_str(&format!(" {:<width$} ", h, width = width));
        header.push('│');
    }
    header.push('\n');

    // Separator
    header.push('├');
    for (i, width) in col_widths.iter().enumerate() {
        header.push_str(&"─".repeat(width + 2));
        if i < col_widths.len() - 1 {
            header.push('┼');
        }
    }
    header.push_str("┤\n");

    let widths = col_widths.clone();
    let format_row = move |result: &CalculationResult| -> String {
        let (lat, lon) = result.location();
        let datetime = result.datetime();

        let mut output = String::from('│');
        let mut col = 0;

        if lat_varies {
            output.push_str(&format!(" {:>width$.5}° ", lat, width = widths[col] - 1));
            output.push('│');
            col += 1;
        }
        if lon_varies {
            output.push_str(&format!(" {:>width$.5}° ", lon, width = widths[col] - 1));
            output.push('│');
            col += 1;
        }
        if time_varies {
            let dt_str = datetime.format("%Y-%m-%d %H:%M").to_string();
            output.push_str(&format!(" {:<width$} ", dt_str, width = widths[col]));
            output.push('│');
            col += 1;
        }

        match result {
            CalculationResult::Time {
                solar_hours,
                day_of_year,
                eot_minutes,
                ..
            } => {
                if show_eot {
                    output.push_str(&format!(" {:>width$} ", day_of_year, width = widths[col]));
                    output.push('│');
                    col += 1;
                    output.push_str(&format!(" {:>width$.2} ", eot_minutes, width = widths[col]));
                    output.push('│');
                    col += 1;
                }
                if decimal {
                    output.push_str(&format!(" {:>width$.4} ", solar_hours, width = widths[col]));
                } else {
                    output.push_str(&format!(
                        " {:<width$} ",
                        solar::clock_label(*solar_hours),
                        width = widths[col]
                    ));
                }
                output.push_str("│\n");
            }
            CalculationResult::Dial {
                solar_hours, angle, ..
            } => {
                output.push_str(&format!(
                    " {:<width$} ",
                    solar::clock_label(*solar_hours),
                    width = widths[col]
                ));
                output.push('│');
                col += 1;
                output.push_str(&format!(" {:>width$.2}° ", angle, width = widths[col] - 1));
                output.push_str("│\n");
            }
        }

        output
    };

    let mut footer = String::from('└');
    for (i, width) in col_widths.iter().enumerate() {
        footer.push_str(&"─".repeat(width + 2));
        if i < col_widths.len() - 1 {
            footer.push('┴');
        }
    }
    footer.push_str("┘\n");

    let first_row = format_row(&first);
    let remaining_rows = results.map(move |r| format_row(&r));

    Box::new(
        std::iter::once(header)
            .chain(std::iter::once(first_row))
            .chain(remaining_rows)
            .chain(std::iter::once(footer)),
    )
}
