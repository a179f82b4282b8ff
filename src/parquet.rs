//! Parquet output format support.

use crate::compute::CalculationResult;
use crate::data::{Command, Parameters};
use arrow::array::{ArrayRef, Float64Builder, Int32Builder, TimestampMillisecondBuilder};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::io::Write;
use std::sync::Arc;

const BATCH_SIZE: usize = 8192;

pub fn write_parquet<W: Write + Send>(
    results: Box<dyn Iterator<Item = CalculationResult>>,
    command: Command,
    params: &Parameters,
    writer: W,
) -> std::io::Result<usize> {
    match command {
        Command::Time => write_time_parquet(results, params, writer),
        Command::Dial => write_dial_parquet(results, params, writer),
    }
}

fn new_writer<W: Write + Send>(writer: W, schema: &Arc<Schema>) -> std::io::Result<ArrowWriter<W>> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    ArrowWriter::try_new(writer, schema.clone(), Some(props))
        .map_err(|e| std::io::Error::other(format!("Parquet writer error: {}", e)))
}

fn write_batch<W: Write + Send>(
    writer: &mut ArrowWriter<W>,
    schema: &Arc<Schema>,
    arrays: Vec<ArrayRef>,
) -> std::io::Result<()> {
    let batch = RecordBatch::try_new(schema.clone(), arrays)
        .map_err(|e| std::io::Error::other(format!("Failed to create batch: {}", e)))?;
    writer
        .write(&batch)
        .map_err(|e| std::io::Error::other(format!("Failed to write batch: {}", e)))
}

fn close_writer<W: Write + Send>(writer: ArrowWriter<W>) -> std::io::Result<()> {
    writer
        .close()
        .map(|_| ())
        .map_err(|e| std::io::Error::other(format!("Failed to close parquet: {}", e)))
}

fn build_time_schema(show_inputs: bool, show_eot: bool) -> Arc<Schema> {
    let mut fields = Vec::new();
    if show_inputs {
        fields.push(Field::new("latitude", DataType::Float64, false));
        fields.push(Field::new("longitude", DataType::Float64, false));
    }
    fields.push(Field::new(
        "dateTime",
        DataType::Timestamp(TimeUnit::Millisecond, None),
        false,
    ));
    if show_eot {
        fields.push(Field::new("dayOfYear", DataType::Int32, false));
        fields.push(Field::new("eotMinutes", DataType::Float64, false));
    }
    fields.push(Field::new("solarHours", DataType::Float64, false));
    Arc::new(Schema::new(fields))
}

fn build_dial_schema(show_inputs: bool) -> Arc<Schema> {
    let mut fields = Vec::new();
    if show_inputs {
        fields.push(Field::new("latitude", DataType::Float64, false));
        fields.push(Field::new("longitude", DataType::Float64, false));
    }
    fields.push(Field::new(
        "dateTime",
        DataType::Timestamp(TimeUnit::Millisecond, None),
        false,
    ));
    fields.push(Field::new("solarHours", DataType::Float64, false));
    fields.push(Field::new("angle", DataType::Float64, false));
    Arc::new(Schema::new(fields))
}

fn write_time_parquet<W: Write + Send>(
    results: Box<dyn Iterator<Item = CalculationResult>>,
    params: &Parameters,
    writer: W,
) -> std::io::Result<usize> {
    let show_inputs = params.output.show_inputs.unwrap_or(false);
    let show_eot = params.show_eot;

    let schema = build_time_schema(show_inputs, show_eot);
    let mut parquet_writer = new_writer(writer, &schema)?;

    let mut lat_builder = show_inputs.then(|| Float64Builder::with_capacity(BATCH_SIZE));
    let mut lon_builder = show_inputs.then(|| Float64Builder::with_capacity(BATCH_SIZE));
    let mut dt_builder = TimestampMillisecondBuilder::with_capacity(BATCH_SIZE);
    let mut day_builder = show_eot.then(|| Int32Builder::with_capacity(BATCH_SIZE));
    let mut eot_builder = show_eot.then(|| Float64Builder::with_capacity(BATCH_SIZE));
    let mut hours_builder = Float64Builder::with_capacity(BATCH_SIZE);

    let mut batch_count = 0;
    let mut total_count = 0;

    for result in results {
        if let CalculationResult::Time {
            lat,
            lon,
            datetime,
            solar_hours,
            day_of_year,
            eot_minutes,
        } = result
        {
            if let Some(b) = lat_builder.as_mut() {
                b.append_value(lat);
            }
            if let Some(b) = lon_builder.as_mut() {
                b.append_value(lon);
            }
            dt_builder.append_value(datetime.timestamp_millis());
            if let Some(b) = day_builder.as_mut() {
                b.append_value(day_of_year as i32);
            }
            if let Some(b) = eot_builder.as_mut() {
                b.append_value(eot_minutes);
            }
            hours_builder.append_value(solar_hours);

            batch_count += 1;
            total_count += 1;

            if batch_count >= BATCH_SIZE {
                flush_time_batch(
                    &mut parquet_writer,
                    &schema,
                    &mut lat_builder,
                    &mut lon_builder,
                    &mut dt_builder,
                    &mut day_builder,
                    &mut eot_builder,
                    &mut hours_builder,
                )?;
                batch_count = 0;
            }
        }
    }

    if batch_count > 0 {
        flush_time_batch(
            &mut parquet_writer,
            &schema,
            &mut lat_builder,
            &mut lon_builder,
            &mut dt_builder,
            &mut day_builder,
            &mut eot_builder,
            &mut hours_builder,
        )?;
    }

    close_writer(parquet_writer)?;
    Ok(total_count)
}

#[allow(clippy::too_many_arguments)]
fn flush_time_batch<W: Write + Send>(
    writer: &mut ArrowWriter<W>,
    schema: &Arc<Schema>,
    lat_builder: &mut Option<Float64Builder>,
    lon_builder: &mut Option<Float64Builder>,
    dt_builder: &mut TimestampMillisecondBuilder,
    day_builder: &mut Option<Int32Builder>,
    eot_builder: &mut Option<Float64Builder>,
    hours_builder: &mut Float64Builder,
) -> std::io::Result<()> {
    let mut arrays: Vec<ArrayRef> = Vec::new();

    if let Some(b) = lat_builder {
        arrays.push(Arc::new(b.finish()) as ArrayRef);
    }
    if let Some(b) = lon_builder {
        arrays.push(Arc::new(b.finish()) as ArrayRef);
    }
    arrays.push(Arc::new(dt_builder.finish()) as ArrayRef);
    if let Some(b) = day_builder {
        arrays.push(Arc::new(b.finish()) as ArrayRef);
    }
    if let Some(b) = eot_builder {
        arrays.push(Arc::new(b.finish()) as ArrayRef);
    }
    arrays.push(Arc::new(hours_builder.finish()) as ArrayRef);

    write_batch(writer, schema, arrays)
}

fn write_dial_parquet<W: Write + Send>(
    results: Box<dyn Iterator<Item = CalculationResult>>,
    params: &Parameters,
    writer: W,
) -> std::io::Result<usize> {
    let show_inputs = params.output.show_inputs.unwrap_or(false);

    let schema = build_dial_schema(show_inputs);
    let mut parquet_writer = new_writer(writer, &schema)?;

    let mut lat_builder = show_inputs.then(|| Float64Builder::with_capacity(BATCH_SIZE));
    let mut lon_builder = show_inputs.then(|| Float64Builder::with_capacity(BATCH_SIZE));
    let mut dt_builder = TimestampMillisecondBuilder::with_capacity(BATCH_SIZE);
    let mut hours_builder = Float64Builder::with_capacity(BATCH_SIZE);
    let mut angle_builder = Float64Builder::with_capacity(BATCH_SIZE);

    let mut batch_count = 0;
    let mut total_count = 0;

    for result in results {
        if let CalculationResult::Dial {
            lat,
            lon,
            datetime,
            solar_hours,
            angle,
        } = result
        {
            if let Some(b) = lat_builder.as_mut() {
                b.append_value(lat);
            }
            if let Some(b) = lon_builder.as_mut() {
                b.append_value(lon);
            }
            dt_builder.append_value(datetime.timestamp_millis());
            hours_builder.append_value(solar_hours);
            angle_builder.append_value(angle);

            batch_count += 1;
            total_count += 1;

            if batch_count >= BATCH_SIZE {
                flush_dial_batch(
                    &mut parquet_writer,
                    &schema,
                    &mut lat_builder,
                    &mut lon_builder,
                    &mut dt_builder,
                    &mut hours_builder,
                    &mut angle_builder,
                )?;
                batch_count = 0;
            }
        }
    }

    if batch_count > 0 {
        flush_dial_batch(
            &mut parquet_writer,
            &schema,
            &mut lat_builder,
            &mut lon_builder,
            &mut dt_builder,
            &mut hours_builder,
            &mut angle_builder,
        )?;
    }

    close_writer(parquet_writer)?;
    Ok(total_count)
}

fn flush_dial_batch<W: Write + Send>(
    writer: &mut ArrowWriter<W>,
    schema: &Arc<Schema>,
    lat_builder: &mut Option<Float64Builder>,
    lon_builder: &mut Option<Float64Builder>,
    dt_builder: &mut TimestampMillisecondBuilder,
    hours_builder: &mut Float64Builder,
    angle_builder: &mut Float64Builder,
) -> std::io::Result<()> {
    let mut arrays: Vec<ArrayRef> = Vec::new();

    if let Some(b) = lat_builder {
        arrays.push(Arc::new(b.finish()) as ArrayRef);
    }
    if let Some(b) = lon_builder {
        arrays.push(Arc::new(b.finish()) as ArrayRef);
    }
    arrays.push(Arc::new(dt_builder.finish()) as ArrayRef);
    arrays.push(Arc::new(hours_builder.finish()) as ArrayRef);
    arrays.push(Arc::new(angle_builder.finish()) as ArrayRef);

    write_batch(writer, schema, arrays)
}
