//! CSV ingest for the GEFCom2014 load track.
//!
//! Two layouts are supported:
//!
//! - the original competition files `Task i/Li-train.csv` (`ZONEID`,
//!   `TIMESTAMP`, `LOAD`, `w1`..`w25`), merged by [`load_raw_dataset`]
//! - the merged file `gefcom2014.csv` (`datetime`, `LOAD`, `w1`..`w25`), read
//!   by [`load_dataset`]
//!
//! Parsing is strict: a missing column, an unparsable timestamp or
//! temperature fails the whole load with the file and line number. An empty
//! `LOAD` cell is not an error; it becomes a missing value for the fill step.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::domain::{
    DatasetConfig, FillNan, LoadSeries, N_TEMPERATURE, RawRecord, DATETIME_COLUMN, DATETIME_FORMAT,
    TARGET_COLUMN,
};
use crate::error::AppError;
use crate::prep::fill_missing;

/// Competition tasks whose training files make up the full history.
pub const RAW_TASKS: std::ops::RangeInclusive<usize> = 1..=15;

/// Timestamp of the first row of `Task 1/L1-train.csv`.
pub fn raw_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2001, 1, 1)
        .and_then(|d| d.and_hms_opt(1, 0, 0))
        .unwrap_or_default()
}

/// Where the orchestrator gets its raw records from.
pub trait SeriesSource {
    fn load_records(&self) -> Result<Vec<RawRecord>, AppError>;
}

/// Reads the merged `gefcom2014.csv` file.
#[derive(Debug, Clone)]
pub struct CsvSource {
    pub path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_dataset(config: &DatasetConfig) -> Self {
        Self::new(config.merged_csv_path())
    }
}

impl SeriesSource for CsvSource {
    fn load_records(&self) -> Result<Vec<RawRecord>, AppError> {
        read_merged_csv(&self.path)
    }
}

/// Merge the 15 competition task files into one hourly series.
///
/// Rows are concatenated in task order and stamped hourly from
/// [`raw_start`]; the `TIMESTAMP` column of the files is ignored. Rows without
/// a load value are dropped.
pub fn load_raw_dataset(config: &DatasetConfig) -> Result<LoadSeries, AppError> {
    let mut rows = Vec::new();
    for task in RAW_TASKS {
        let path = config.task_csv_path(task);
        let before = rows.len();
        read_task_csv(&path, &mut rows)?;
        tracing::debug!(task, rows = rows.len() - before, path = %path.display(), "read task file");
    }

    let start = raw_start();
    let records: Vec<RawRecord> = rows
        .into_iter()
        .enumerate()
        .map(|(k, (load, temperatures))| RawRecord {
            datetime: start + Duration::hours(k as i64),
            load,
            temperatures,
        })
        .collect();

    tracing::info!(rows = records.len(), "merged raw task files");
    fill_missing(&records, FillNan::Drop)
}

/// Read the merged dataset file as raw (possibly incomplete) records.
pub fn load_dataset(config: &DatasetConfig) -> Result<Vec<RawRecord>, AppError> {
    read_merged_csv(&config.merged_csv_path())
}

fn read_merged_csv(path: &Path) -> Result<Vec<RawRecord>, AppError> {
    let (mut reader, header_map) = open_csv(path)?;
    let datetime_idx = require_column(&header_map, DATETIME_COLUMN, path)?;
    let columns = ValueColumns::resolve(&header_map, path)?;

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: header line plus 1-based numbering.
        let line = idx + 2;
        let record = result.map_err(|e| row_error(path, line, format!("CSV parse error: {e}")))?;
        let raw = get_value(&record, datetime_idx)
            .ok_or_else(|| row_error(path, line, format!("Missing `{DATETIME_COLUMN}` value.")))?;
        let datetime = NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).map_err(|e| {
            row_error(path, line, format!("Invalid datetime '{raw}' (expected {DATETIME_FORMAT}): {e}"))
        })?;
        let (load, temperatures) = columns.parse(&record).map_err(|e| row_error(path, line, e))?;
        records.push(RawRecord {
            datetime,
            load,
            temperatures,
        });
    }

    records.sort_by_key(|r| r.datetime);
    tracing::info!(rows = records.len(), path = %path.display(), "loaded dataset");
    Ok(records)
}

fn read_task_csv(path: &Path, rows: &mut Vec<(Option<f64>, [f64; N_TEMPERATURE])>) -> Result<(), AppError> {
    let (mut reader, header_map) = open_csv(path)?;
    let columns = ValueColumns::resolve(&header_map, path)?;
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result.map_err(|e| row_error(path, line, format!("CSV parse error: {e}")))?;
        rows.push(columns.parse(&record).map_err(|e| row_error(path, line, e))?);
    }
    Ok(())
}

/// Column positions of the load and temperature values.
struct ValueColumns {
    load: usize,
    temperatures: [usize; N_TEMPERATURE],
}

impl ValueColumns {
    fn resolve(header_map: &HashMap<String, usize>, path: &Path) -> Result<Self, AppError> {
        let load = require_column(header_map, TARGET_COLUMN, path)?;
        let mut temperatures = [0usize; N_TEMPERATURE];
        for (k, slot) in temperatures.iter_mut().enumerate() {
            *slot = require_column(header_map, &format!("w{}", k + 1), path)?;
        }
        Ok(Self { load, temperatures })
    }

    fn parse(&self, record: &StringRecord) -> Result<(Option<f64>, [f64; N_TEMPERATURE]), String> {
        let load = match get_value(record, self.load) {
            None => None,
            Some(s) => Some(parse_f64(s).ok_or_else(|| format!("Invalid `{TARGET_COLUMN}` value '{s}'."))?),
        };
        let mut temperatures = [0.0; N_TEMPERATURE];
        for (k, (&idx, t)) in self.temperatures.iter().zip(temperatures.iter_mut()).enumerate() {
            let s = get_value(record, idx).ok_or_else(|| format!("Missing `w{}` value.", k + 1))?;
            *t = parse_f64(s).ok_or_else(|| format!("Invalid `w{}` value '{s}'.", k + 1))?;
        }
        Ok((load, temperatures))
    }
}

fn open_csv(path: &Path) -> Result<(csv::Reader<File>, HashMap<String, usize>), AppError> {
    let file = File::open(path).map_err(|e| AppError::from_io(&e, format!("CSV '{}'", path.display())))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);
    let headers = reader
        .headers()
        .map_err(|e| AppError::data(format!("Failed to read CSV headers of '{}': {e}", path.display())))?
        .clone();
    let header_map = build_header_map(&headers);
    Ok((reader, header_map))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn require_column(header_map: &HashMap<String, usize>, name: &str, path: &Path) -> Result<usize, AppError> {
    header_map
        .get(&normalize_header_name(name))
        .copied()
        .ok_or_else(|| AppError::data(format!("Missing required column `{name}` in '{}'.", path.display())))
}

fn get_value(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("nan"))
}

fn parse_f64(s: &str) -> Option<f64> {
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn row_error(path: &Path, line: usize, message: impl std::fmt::Display) -> AppError {
    AppError::data(format!("{}:{line}: {message}", path.display()))
}
