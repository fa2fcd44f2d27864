//! Command-line parsing for the GEFCom2014 data preparation tool.
//!
//! Argument parsing and command dispatch stay separate from the preparation
//! code; `app` turns these structs into `LoadOptions`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{FillNan, SplitType};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "gefcom", version, about = "GEFCom2014 hourly load data preparation")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Data root (overrides GEFCOM_DATA_ROOT).
    #[arg(long, global = true, value_name = "DIR")]
    pub data_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Prepare train/test data (from the prebuilt cache when available) and print a summary.
    Build(BuildArgs),
    /// Merge the 15 raw task files into the single dataset CSV.
    Merge(MergeArgs),
    /// Write a synthetic GEFCom-shaped dataset CSV.
    Synth(SynthArgs),
}

/// Options for `gefcom build`.
#[derive(Debug, Args, Clone)]
pub struct BuildArgs {
    /// Split strategy.
    #[arg(long, value_enum, default_value_t = SplitType::Simple)]
    pub split: SplitType,

    /// Append temperature and calendar features.
    #[arg(long)]
    pub exogenous: bool,

    /// Remove the hour-of-day mean from the load.
    #[arg(long)]
    pub detrend: bool,

    /// Produce train/validation data instead of train/test.
    #[arg(long)]
    pub train: bool,

    /// Skip scaling.
    #[arg(long)]
    pub no_preprocessing: bool,

    #[arg(long, default_value_t = 364 * 3 * 24)]
    pub train_len: usize,

    #[arg(long, default_value_t = 365 * 24)]
    pub test_len: usize,

    /// Validation length; 0 means a tenth of the training length.
    #[arg(long, default_value_t = 0)]
    pub valid_len: usize,

    /// How to handle hours without a load value.
    #[arg(long, value_enum, default_value_t = FillNan::Drop)]
    pub fill_nan: FillNan,

    /// Ignore any prebuilt bundle and recompute it.
    #[arg(long)]
    pub rebuild: bool,
}

/// Options for `gefcom merge`.
#[derive(Debug, Args, Clone)]
pub struct MergeArgs {
    /// Output CSV (defaults to `<root>/GEFCom2014/Load/gefcom2014.csv`).
    #[arg(long, value_name = "CSV")]
    pub output: Option<PathBuf>,
}

/// Options for `gefcom synth`.
#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Number of hourly rows to generate.
    #[arg(long, default_value_t = 2 * 365 * 24)]
    pub hours: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV (defaults to `<root>/GEFCom2014/Load/gefcom2014.csv`).
    #[arg(long, value_name = "CSV")]
    pub output: Option<PathBuf>,
}
