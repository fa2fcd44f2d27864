//! Shared domain types.
//!
//! Everything that travels between the ingest, preparation and cache layers
//! lives here: option enums, the cleaned load series, split containers and the
//! final dataset bundle. Bundle-related types are serializable so a prepared
//! dataset can be written to disk and reloaded without recomputation.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{NaiveDateTime, Timelike};
use clap::ValueEnum;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::Scaler;

/// Default for [`DatasetConfig::samples_per_day`]; the load track is hourly.
pub const SAMPLES_PER_DAY: usize = 24;

/// Clock hours, i.e. the number of hour-of-day buckets (`hour()` is `0..24`).
pub const HOURS_PER_DAY: usize = 24;

/// Number of weather stations (`w1`..`w25`) in the GEFCom2014 load track.
pub const N_TEMPERATURE: usize = 25;

pub const DATASET_NAME: &str = "gefcom";
pub const TARGET_COLUMN: &str = "LOAD";
pub const DATETIME_COLUMN: &str = "datetime";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How the prepared matrix is partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    /// Contiguous train/test (and train/valid) blocks.
    Simple,
    /// Fixed-length, possibly overlapping windows.
    Multi,
    /// Contiguous train/test with the last 10% as test; windowed train/valid.
    Default,
}

impl SplitType {
    pub fn as_str(self) -> &'static str {
        match self {
            SplitType::Simple => "simple",
            SplitType::Multi => "multi",
            SplitType::Default => "default",
        }
    }
}

impl fmt::Display for SplitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(SplitType::Simple),
            "multi" => Ok(SplitType::Multi),
            "default" => Ok(SplitType::Default),
            _ => Err(AppError::config(format!("{s} is not a valid split type."))),
        }
    }
}

/// Which scaler to fit on a training slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScalerKind {
    /// Zero mean, unit (population) variance per column.
    #[default]
    Standard,
    /// Map each column onto `[0, 1]` using the slice's min/max.
    #[value(name = "minmax")]
    #[serde(rename = "minmax")]
    MinMax,
}

/// Strategy for rows whose load value is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FillNan {
    /// Remove rows without a load value.
    #[default]
    Drop,
    /// Copy the previous present value forward.
    Ffill,
    /// Copy the next present value backward.
    Bfill,
    /// Mean of present values at the same hour of day.
    Mean,
    /// Median of present values at the same hour of day.
    Median,
}

/// One row as read from disk, before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub datetime: NaiveDateTime,
    pub load: Option<f64>,
    pub temperatures: [f64; N_TEMPERATURE],
}

/// One cleaned row: the load value is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRecord {
    pub datetime: NaiveDateTime,
    pub load: f64,
    pub temperatures: [f64; N_TEMPERATURE],
}

impl LoadRecord {
    pub fn hour(&self) -> usize {
        self.datetime.hour() as usize
    }
}

/// A cleaned, time-ordered hourly load series.
///
/// Invariant: timestamps are strictly increasing. Missing hours are allowed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadSeries {
    records: Vec<LoadRecord>,
}

impl LoadSeries {
    /// Build a series, sorting by timestamp and rejecting duplicate hours.
    pub fn new(mut records: Vec<LoadRecord>) -> Result<Self, AppError> {
        records.sort_by_key(|r| r.datetime);
        if let Some(w) = records.windows(2).find(|w| w[0].datetime == w[1].datetime) {
            return Err(AppError::data(format!(
                "Duplicate timestamp in load series: {}",
                w[0].datetime
            )));
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[LoadRecord] {
        &self.records
    }

    pub fn loads(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.load).collect()
    }

    /// Copy of this series with the load column replaced.
    ///
    /// `loads` must have one value per row.
    pub fn with_loads(&self, loads: &[f64]) -> Result<Self, AppError> {
        if loads.len() != self.records.len() {
            return Err(AppError::data(format!(
                "Load column length mismatch: series has {} rows, got {} values",
                self.records.len(),
                loads.len()
            )));
        }
        let records = self
            .records
            .iter()
            .zip(loads)
            .map(|(r, &load)| LoadRecord { load, ..r.clone() })
            .collect();
        Ok(Self { records })
    }
}

/// Dataset-wide settings that used to be process globals.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    /// Name used in cache keys.
    pub name: String,
    /// Root directory holding `GEFCom2014/` and `prebuilt/`.
    pub data_root: PathBuf,
    pub samples_per_day: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            name: DATASET_NAME.to_string(),
            data_root: PathBuf::from("data"),
            samples_per_day: SAMPLES_PER_DAY,
        }
    }
}

impl DatasetConfig {
    /// Read `GEFCOM_DATA_ROOT` (from the environment or a `.env` file).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Ok(root) = std::env::var("GEFCOM_DATA_ROOT") {
            if !root.trim().is_empty() {
                config.data_root = PathBuf::from(root);
            }
        }
        config
    }

    pub fn load_dir(&self) -> PathBuf {
        self.data_root.join("GEFCom2014").join("Load")
    }

    /// `Task {i}/L{i}-train.csv` of the original competition layout.
    pub fn task_csv_path(&self, task: usize) -> PathBuf {
        self.load_dir()
            .join(format!("Task {task}"))
            .join(format!("L{task}-train.csv"))
    }

    pub fn merged_csv_path(&self) -> PathBuf {
        self.load_dir().join("gefcom2014.csv")
    }

    pub fn prebuilt_dir(&self) -> PathBuf {
        self.data_root.join("prebuilt")
    }
}

/// Parameters of a single `load_data` run.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub fill_nan: FillNan,
    /// Scale features (load: standard, temperatures: min-max).
    pub preprocessing: bool,
    pub detrend: bool,
    pub exogenous_vars: bool,
    pub train_len: usize,
    pub test_len: usize,
    /// `0` means 10% of `train_len`.
    pub valid_len: usize,
    pub split_type: SplitType,
    /// Train mode yields train/valid; inference mode yields train/test.
    pub is_train: bool,
    pub use_prebuilt: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            fill_nan: FillNan::Drop,
            preprocessing: true,
            detrend: false,
            exogenous_vars: false,
            train_len: 364 * 3 * SAMPLES_PER_DAY,
            test_len: 365 * SAMPLES_PER_DAY,
            valid_len: 0,
            split_type: SplitType::Simple,
            is_train: false,
            use_prebuilt: true,
        }
    }
}

impl LoadOptions {
    pub fn effective_valid_len(&self) -> usize {
        if self.valid_len == 0 {
            self.train_len / 10
        } else {
            self.valid_len
        }
    }
}

/// A split partition: a single contiguous block or a stack of windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "layout", content = "data", rename_all = "lowercase")]
pub enum SplitArray {
    Contiguous(DMatrix<f64>),
    Windowed(Vec<DMatrix<f64>>),
}

impl SplitArray {
    /// Every window as a slice; a contiguous block is a single window.
    pub fn windows(&self) -> &[DMatrix<f64>] {
        match self {
            SplitArray::Contiguous(m) => std::slice::from_ref(m),
            SplitArray::Windowed(ws) => ws,
        }
    }

    pub fn n_windows(&self) -> usize {
        self.windows().len()
    }

    /// Rows per window (0 when there are no windows).
    pub fn n_rows(&self) -> usize {
        self.windows().first().map_or(0, |m| m.nrows())
    }

    pub fn n_features(&self) -> usize {
        self.windows().first().map_or(0, |m| m.ncols())
    }
}

/// Output of a split function: `valid` is `None` when no validation block is cut.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSet {
    pub train: SplitArray,
    pub valid: Option<SplitArray>,
    pub test: SplitArray,
}

/// Trend values matching the train and test partitions of a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSplit {
    pub train: SplitArray,
    pub test: SplitArray,
}

/// The artifact handed to model code.
///
/// Scaler and trend belong to the arrays they were computed with; keep them
/// together or predictions cannot be mapped back to the original scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetBundle {
    pub train: SplitArray,
    pub test: SplitArray,
    pub scaler: Option<Scaler>,
    pub trend: Option<TrendSplit>,
}
