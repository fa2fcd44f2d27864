//! The `load_data` pipeline shared by the CLI and library callers.
//!
//! cache lookup -> raw records -> fill -> (detrend) -> load feature ->
//! (exogenous blocks) -> scaling -> split -> bundle
//!
//! Scalers are fitted on the first `train_len` rows of the feature matrix only;
//! the fitted parameters are then applied to every row.

use nalgebra::DMatrix;

use crate::domain::{
    DatasetBundle, DatasetConfig, LoadOptions, ScalerKind, SplitType, TrendSplit,
};
use crate::error::AppError;
use crate::io::{BundleStore, CacheKey, SeriesSource};
use crate::math::Scaler;
use crate::prep::{SplitStrategy, add_exogenous_variables, apply_detrend, fill_missing};

/// Number of leading rows the trend statistics are computed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrendPrefix {
    Rows(usize),
    /// Everything except the final year of data.
    AllButLastYear,
}

/// Which split function the trend vector is passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrendStep {
    TrainTest,
    TrainValid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DetrendPlan {
    prefix: TrendPrefix,
    step: TrendStep,
}

/// Detrending is only defined for some split/mode combinations.
///
/// The default split detrends in inference mode only; asking for it in train
/// mode is rejected rather than silently changed.
fn detrend_plan(options: &LoadOptions) -> Result<Option<DetrendPlan>, AppError> {
    if !options.detrend {
        return Ok(None);
    }
    let plan = match (options.split_type, options.is_train) {
        (SplitType::Default, false) => DetrendPlan {
            prefix: TrendPrefix::AllButLastYear,
            step: TrendStep::TrainTest,
        },
        (SplitType::Simple, true) => DetrendPlan {
            prefix: TrendPrefix::Rows(options.train_len),
            step: TrendStep::TrainValid,
        },
        (SplitType::Simple, false) => DetrendPlan {
            prefix: TrendPrefix::Rows(options.train_len + options.effective_valid_len()),
            step: TrendStep::TrainTest,
        },
        (split_type, is_train) => {
            return Err(AppError::config(format!(
                "Detrend cannot be applied with split type `{split_type}` in {} mode.",
                if is_train { "train" } else { "inference" }
            )));
        }
    };
    Ok(Some(plan))
}

/// Produce the dataset bundle for `options`.
///
/// With `use_prebuilt`, the store is consulted first. A missing entry triggers
/// exactly one fresh computation; the result is not saved here, persisting is
/// up to the caller. Any other store error is returned as is.
pub fn load_data(
    source: &dyn SeriesSource,
    store: &dyn BundleStore,
    config: &DatasetConfig,
    options: &LoadOptions,
) -> Result<DatasetBundle, AppError> {
    let plan = detrend_plan(options)?;

    if options.use_prebuilt {
        tracing::info!("Fetching preprocessed data from disk...");
        let key = CacheKey::new(options, &config.name);
        match store.load(&key) {
            Ok(bundle) => return Ok(bundle),
            Err(err) if err.is_not_found() => {
                tracing::warn!(
                    key = %key.file_name(),
                    "No preprocessed version of the data exists on disk. The train/test data will be created now."
                );
            }
            Err(err) => return Err(err),
        }
    }

    prepare(source, config, options, plan)
}

fn prepare(
    source: &dyn SeriesSource,
    config: &DatasetConfig,
    options: &LoadOptions,
    plan: Option<DetrendPlan>,
) -> Result<DatasetBundle, AppError> {
    tracing::info!("Fetching and preprocessing data. This will take a while...");
    let records = source.load_records()?;
    let mut series = fill_missing(&records, options.fill_nan)?;
    if series.len() < 2 {
        return Err(AppError::data(format!(
            "Need at least 2 rows with a load value, got {}.",
            series.len()
        )));
    }

    let strategy = SplitStrategy::new(options, series.len(), config.samples_per_day);

    // Scalers are fitted on the first `train_len` feature rows; those rows must
    // not reach into the trailing test block.
    let n = series.len() - 1;
    if options.preprocessing {
        if let Some(start) = strategy.held_out_start(n) {
            if options.train_len > start {
                return Err(AppError::config(format!(
                    "train_len {} overlaps the test block: only {start} of {n} feature rows precede it.",
                    options.train_len
                )));
            }
        }
    }

    let mut trend = None;
    if let Some(plan) = plan {
        let prefix = match plan.prefix {
            TrendPrefix::Rows(rows) => rows,
            TrendPrefix::AllButLastYear => series.len().saturating_sub(365 * config.samples_per_day),
        };
        let (detrended, values) = apply_detrend(&series, prefix)?;
        series = detrended;

        let column = DMatrix::from_column_slice(values.len(), 1, &values);
        let parts = match plan.step {
            TrendStep::TrainTest => strategy.train_test(&column)?,
            TrendStep::TrainValid => strategy.train_valid(&column)?,
        };
        trend = Some(TrendSplit {
            train: parts.train,
            test: parts.test,
        });
    }

    // Load at t is paired with exogenous values at t + 1.
    let loads = series.loads();
    let train_rows = options.train_len.min(n);
    let mut x = DMatrix::from_column_slice(n, 1, &loads[..n]);

    let mut scaler = None;
    if options.preprocessing {
        let fitted = Scaler::fit(&x.rows(0, train_rows).into_owned(), ScalerKind::Standard)?;
        x = fitted.transform(&x)?;
        scaler = Some(fitted);
    }

    if options.exogenous_vars {
        let blocks = add_exogenous_variables(&series, true)?;
        let mut temperature = blocks.temperature.values;
        if options.preprocessing {
            let temp_scaler = Scaler::fit(&temperature.rows(0, train_rows).into_owned(), ScalerKind::MinMax)?;
            temperature = temp_scaler.transform(&temperature)?;
        }
        x = concat_columns(&[&x, &temperature, &blocks.calendar.values])?;
        tracing::debug!(
            features = x.ncols(),
            calendar = blocks.calendar.columns.len(),
            "added exogenous features"
        );
    }

    let parts = strategy.split(&x, options.is_train)?;
    tracing::info!(
        split = %options.split_type,
        is_train = options.is_train,
        train_windows = parts.train.n_windows(),
        train_rows = parts.train.n_rows(),
        test_windows = parts.test.n_windows(),
        test_rows = parts.test.n_rows(),
        features = x.ncols(),
        "prepared dataset"
    );

    Ok(DatasetBundle {
        train: parts.train,
        test: parts.test,
        scaler,
        trend,
    })
}

/// Stack matrices with the same number of rows side by side.
fn concat_columns(blocks: &[&DMatrix<f64>]) -> Result<DMatrix<f64>, AppError> {
    let nrows = blocks.first().map_or(0, |b| b.nrows());
    if let Some(b) = blocks.iter().find(|b| b.nrows() != nrows) {
        return Err(AppError::data(format!(
            "Feature blocks are misaligned: {} vs {nrows} rows.",
            b.nrows()
        )));
    }
    let ncols = blocks.iter().map(|b| b.ncols()).sum();
    let mut out = DMatrix::zeros(nrows, ncols);
    let mut offset = 0;
    for b in blocks {
        out.columns_mut(offset, b.ncols()).copy_from(*b);
        offset += b.ncols();
    }
    Ok(out)
}
