//! CSV tables and capture-line parsing.
//!
//! Three table layouts are supported:
//!
//! | Table | Columns |
//! |-------|---------|
//! | samples | `Time` (optional), `AccX`, `AccY`, `AccZ` |
//! | denoised | `Time`, `Raw_AccX..Z`, `Denoised_AccX..Z`, `Sampling_Fallback` |
//! | validation | `Time`, then per axis raw/denoised acceleration and position |
//!
//! `Sampling_Fallback` is optional on input. Validation columns per axis are
//! `Raw_Acc?_m/s2`, `Denoised_Acc?_m/s2`, `Raw_Pos?_m` and `Denoised_Pos?_m`.
//!
//! Sample columns are looked up by header name, so extra columns and any
//! column order are accepted. Every reader has a `_from` variant taking any
//! [`std::io::Read`], and every writer a `_to` variant taking any
//! [`std::io::Write`].

use std::fmt;
use std::fs::File;
use std::io::{BufRead, Read, Write};
use std::path::Path;
use std::str::FromStr;

use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DenoiseError, Result};
use crate::pipeline::DenoisedSeries;
use crate::series::{derive_sampling, Axis, AxisData, SampleSeries, Sampling, TimestampIssue};
use crate::validation::ValidationResult;

/// Unit of the `Time` column in a sample table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeUnit {
    #[default]
    Seconds,
    Milliseconds,
}

impl TimeUnit {
    /// Factor converting this unit to seconds.
    #[must_use]
    pub const fn to_seconds(self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Milliseconds => 1e-3,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "sec" | "seconds" => Ok(Self::Seconds),
            "ms" | "millis" | "milliseconds" => Ok(Self::Milliseconds),
            other => Err(format!("unknown time unit '{other}', expected 's' or 'ms'")),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Seconds => "s",
            Self::Milliseconds => "ms",
        })
    }
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn required_column(headers: &StringRecord, name: &str) -> Result<usize> {
    column_index(headers, name)
        .ok_or_else(|| DenoiseError::invalid_input(format!("missing column '{name}'")))
}

fn parse_field(record: &StringRecord, index: usize, row: usize, name: &str) -> Result<f64> {
    let field = record
        .get(index)
        .ok_or_else(|| DenoiseError::parse(row, format!("missing field '{name}'")))?;
    field
        .parse::<f64>()
        .map_err(|e| DenoiseError::parse(row, format!("'{name}' = '{field}': {e}")))
}

/// Read a sample table from any reader.
///
/// # Errors
///
/// Returns [`DenoiseError::InvalidInput`] if an acceleration column is
/// missing, [`DenoiseError::Parse`] for a non-numeric field, or
/// [`DenoiseError::Csv`] for malformed CSV.
pub fn read_samples_from<R: Read>(reader: R, unit: TimeUnit) -> Result<SampleSeries> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let time_col = column_index(&headers, "Time");
    let acc_cols = AxisData::from_fn(|axis| format!("Acc{axis}"));
    let acc_idx = acc_cols.try_map(|_, name| required_column(&headers, name))?;

    let mut time = time_col.map(|_| Vec::new());
    let mut acc: AxisData<Vec<f64>> = AxisData::default();

    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = i + 1;
        if let (Some(col), Some(t)) = (time_col, time.as_mut()) {
            t.push(parse_field(&record, col, row, "Time")? * unit.to_seconds());
        }
        for axis in Axis::ALL {
            acc[axis].push(parse_field(&record, acc_idx[axis], row, &acc_cols[axis])?);
        }
    }

    debug!(
        samples = acc[Axis::X].len(),
        has_time = time.is_some(),
        %unit,
        "sample table read"
    );
    SampleSeries::from_parts(time, acc)
}

/// Read a sample table from a CSV file.
///
/// # Errors
///
/// See [`read_samples_from`]; also fails if the file cannot be opened.
pub fn read_samples(path: impl AsRef<Path>, unit: TimeUnit) -> Result<SampleSeries> {
    read_samples_from(File::open(path)?, unit)
}

/// Write a sample table (`Time, AccX, AccY, AccZ`) to any writer.
///
/// A series without a time column gets the synthetic axis implied by its
/// sampling.
///
/// # Errors
///
/// Returns [`DenoiseError::Csv`] or [`DenoiseError::Io`] on write failure.
pub fn write_samples_to<W: Write>(writer: W, series: &SampleSeries) -> Result<()> {
    let time = series.time_axis(&series.sampling());
    let mut wtr = csv::Writer::from_writer(writer);
    for (i, &t) in time.iter().enumerate() {
        wtr.serialize(SampleRow {
            time: t,
            x: series.axis(Axis::X)[i],
            y: series.axis(Axis::Y)[i],
            z: series.axis(Axis::Z)[i],
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a sample table to a CSV file.
///
/// # Errors
///
/// See [`write_samples_to`].
pub fn write_samples(path: impl AsRef<Path>, series: &SampleSeries) -> Result<()> {
    write_samples_to(File::create(path)?, series)
}

#[derive(Debug, Serialize)]
struct SampleRow {
    #[serde(rename = "Time")]
    time: f64,
    #[serde(rename = "AccX")]
    x: f64,
    #[serde(rename = "AccY")]
    y: f64,
    #[serde(rename = "AccZ")]
    z: f64,
}

#[derive(Debug, Serialize, Deserialize)]
struct DenoisedRow {
    #[serde(rename = "Time")]
    time: f64,
    #[serde(rename = "Raw_AccX")]
    raw_x: f64,
    #[serde(rename = "Raw_AccY")]
    raw_y: f64,
    #[serde(rename = "Raw_AccZ")]
    raw_z: f64,
    #[serde(rename = "Denoised_AccX")]
    denoised_x: f64,
    #[serde(rename = "Denoised_AccY")]
    denoised_y: f64,
    #[serde(rename = "Denoised_AccZ")]
    denoised_z: f64,
    #[serde(rename = "Sampling_Fallback", default)]
    fallback: Option<String>,
}

/// Write a denoised table to any writer.
///
/// A fallback sampling record is stored as a [`TimestampIssue::code`] in
/// the `Sampling_Fallback` column; the column is empty for measured or
/// overridden rates.
///
/// # Errors
///
/// Returns [`DenoiseError::Csv`] or [`DenoiseError::Io`] on write failure.
pub fn write_denoised_to<W: Write>(writer: W, table: &DenoisedSeries) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let (raw, den) = (&table.raw, &table.denoised);
    let fallback = table.sampling.fallback.map(|issue| issue.code());
    for (i, &time) in table.time.iter().enumerate() {
        wtr.serialize(DenoisedRow {
            time,
            raw_x: raw[Axis::X][i],
            raw_y: raw[Axis::Y][i],
            raw_z: raw[Axis::Z][i],
            denoised_x: den[Axis::X][i],
            denoised_y: den[Axis::Y][i],
            denoised_z: den[Axis::Z][i],
            fallback: fallback.clone(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a denoised table to a CSV file.
///
/// # Errors
///
/// See [`write_denoised_to`].
pub fn write_denoised(path: impl AsRef<Path>, table: &DenoisedSeries) -> Result<()> {
    write_denoised_to(File::create(path)?, table)
}

/// Read a denoised table from any reader.
///
/// A `Sampling_Fallback` code restores the fallback sampling the table was
/// produced with. Otherwise sampling is re-derived from the `Time` column,
/// with the usual fallback.
///
/// # Errors
///
/// Returns [`DenoiseError::Csv`] for malformed rows or missing columns, or
/// [`DenoiseError::Parse`] for an unknown `Sampling_Fallback` code.
pub fn read_denoised_from<R: Read>(reader: R) -> Result<DenoisedSeries> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut time = Vec::new();
    let mut raw: AxisData<Vec<f64>> = AxisData::default();
    let mut denoised: AxisData<Vec<f64>> = AxisData::default();
    let mut recorded: Option<TimestampIssue> = None;

    for (i, row) in rdr.deserialize::<DenoisedRow>().enumerate() {
        let row = row?;
        if let (None, Some(code)) = (recorded, row.fallback.as_deref()) {
            let issue = code.parse().map_err(|e| DenoiseError::parse(i + 1, e))?;
            recorded = Some(issue);
        }
        time.push(row.time);
        raw[Axis::X].push(row.raw_x);
        raw[Axis::Y].push(row.raw_y);
        raw[Axis::Z].push(row.raw_z);
        denoised[Axis::X].push(row.denoised_x);
        denoised[Axis::Y].push(row.denoised_y);
        denoised[Axis::Z].push(row.denoised_z);
    }

    let sampling = match recorded {
        Some(issue) => Sampling::fallback(issue),
        None => derive_sampling(Some(time.as_slice())),
    };
    let time = if sampling.is_reliable() {
        time
    } else {
        sampling.synthetic_time(time.len())
    };
    DenoisedSeries::new(time, raw, denoised, sampling)
}

/// Read a denoised table from a CSV file.
///
/// # Errors
///
/// See [`read_denoised_from`].
pub fn read_denoised(path: impl AsRef<Path>) -> Result<DenoisedSeries> {
    read_denoised_from(File::open(path)?)
}

/// Header of the validation table.
#[must_use]
pub fn validation_header() -> Vec<String> {
    let mut header = vec!["Time".to_string()];
    for axis in Axis::ALL {
        header.push(format!("Raw_Acc{axis}_m/s2"));
        header.push(format!("Denoised_Acc{axis}_m/s2"));
        header.push(format!("Raw_Pos{axis}_m"));
        header.push(format!("Denoised_Pos{axis}_m"));
    }
    header
}

/// Write a validation table to any writer.
///
/// # Errors
///
/// Returns [`DenoiseError::Csv`] or [`DenoiseError::Io`] on write failure.
pub fn write_validation_to<W: Write>(writer: W, result: &ValidationResult) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(validation_header())?;

    for row in result.rows() {
        wtr.write_record(row.iter().map(ToString::to_string))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a validation table to a CSV file.
///
/// # Errors
///
/// See [`write_validation_to`].
pub fn write_validation(path: impl AsRef<Path>, result: &ValidationResult) -> Result<()> {
    write_validation_to(File::create(path)?, result)
}

/// Parse one `"ax,ay,az"` line from the acquisition device.
///
/// Returns `None` for anything other than exactly three integers.
#[must_use]
pub fn parse_capture_line(line: &str) -> Option<[f64; 3]> {
    let mut fields = line.trim().split(',');
    let mut values = [0.0; 3];
    for slot in &mut values {
        *slot = f64::from(fields.next()?.trim().parse::<i32>().ok()?);
    }
    if fields.next().is_some() {
        return None;
    }
    Some(values)
}

/// Collect a capture stream into a series without a time column.
///
/// Malformed lines are skipped and logged at debug level.
///
/// # Errors
///
/// Returns [`DenoiseError::Io`] if reading fails.
pub fn read_capture<R: BufRead>(reader: R) -> Result<SampleSeries> {
    let mut acc: AxisData<Vec<f64>> = AxisData::default();
    let mut skipped = 0usize;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(values) = parse_capture_line(&line) {
            for axis in Axis::ALL {
                acc[axis].push(values[axis.index()]);
            }
        } else {
            skipped += 1;
            debug!(line = i + 1, content = %line, "skipping malformed capture line");
        }
    }

    debug!(samples = acc[Axis::X].len(), skipped, "capture stream read");
    SampleSeries::from_parts(None, acc)
}
