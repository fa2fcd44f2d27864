//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - resolves the dataset configuration
//! - runs the requested command

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{BuildArgs, Cli, Command, MergeArgs, SynthArgs};
use crate::data::{SyntheticSpec, generate_series};
use crate::domain::{DatasetConfig, LoadOptions};
use crate::error::AppError;
use crate::io::{BundleStore, CacheKey, CsvSource, JsonStore, load_raw_dataset, write_series_csv};

pub mod pipeline;

pub use pipeline::load_data;

/// Entry point for the `gefcom` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = dataset_config(cli.data_root);
    match cli.command {
        Command::Build(args) => handle_build(&config, &args),
        Command::Merge(args) => handle_merge(&config, &args),
        Command::Synth(args) => handle_synth(&config, &args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::filter::LevelFilter::from_level(level))
        .init();
}

fn dataset_config(data_root: Option<PathBuf>) -> DatasetConfig {
    let mut config = DatasetConfig::from_env();
    if let Some(root) = data_root {
        config.data_root = root;
    }
    config
}

fn handle_build(config: &DatasetConfig, args: &BuildArgs) -> Result<(), AppError> {
    let options = load_options_from_args(args);
    let source = CsvSource::for_dataset(config);
    let store = JsonStore::for_dataset(config);
    let key = CacheKey::new(&options, &config.name);

    let cached = options.use_prebuilt && store.path_for(&key).is_file();
    let bundle = load_data(&source, &store, config, &options)?;
    if !cached {
        store.save(&key, &bundle)?;
    }

    println!("{}", crate::report::format_bundle_summary(&bundle, &options));
    Ok(())
}

fn handle_merge(config: &DatasetConfig, args: &MergeArgs) -> Result<(), AppError> {
    let series = load_raw_dataset(config)?;
    let path = args.output.clone().unwrap_or_else(|| config.merged_csv_path());
    write_series_csv(&path, &series)?;
    println!("Wrote {} rows to {}", series.len(), path.display());
    Ok(())
}

fn handle_synth(config: &DatasetConfig, args: &SynthArgs) -> Result<(), AppError> {
    let spec = SyntheticSpec {
        hours: args.hours,
        seed: args.seed,
        ..SyntheticSpec::default()
    };
    let series = generate_series(&spec)?;
    let path = args.output.clone().unwrap_or_else(|| config.merged_csv_path());
    write_series_csv(&path, &series)?;
    println!("Wrote {} synthetic rows to {}", series.len(), path.display());
    Ok(())
}

pub fn load_options_from_args(args: &BuildArgs) -> LoadOptions {
    LoadOptions {
        fill_nan: args.fill_nan,
        preprocessing: !args.no_preprocessing,
        detrend: args.detrend,
        exogenous_vars: args.exogenous,
        train_len: args.train_len,
        test_len: args.test_len,
        valid_len: args.valid_len,
        split_type: args.split,
        is_train: args.train,
        use_prebuilt: !args.rebuild,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FillNan, SplitType};

    #[test]
    fn build_args_map_onto_load_options() {
        let cli = Cli::parse_from(["gefcom", "build", "--detrend", "--no-preprocessing", "--rebuild", "--valid-len", "48"]);
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        let options = load_options_from_args(&args);
        assert!(options.detrend && !options.preprocessing && !options.use_prebuilt);
        assert_eq!(options.valid_len, 48);
        assert_eq!(options.split_type, SplitType::Simple);
        assert_eq!(options.fill_nan, FillNan::Drop);
        assert_eq!(
            CacheKey::new(&options, "gefcom").file_name(),
            "gefcom_simple_exog0_detrend1_test.json"
        );
    }

    #[test]
    fn data_root_flag_overrides_config() {
        let config = dataset_config(Some(PathBuf::from("/tmp/gefcom")));
        assert_eq!(config.prebuilt_dir(), PathBuf::from("/tmp/gefcom/prebuilt"));
    }
}
