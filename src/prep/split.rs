//! Train/validation/test partitioning.
//!
//! Two primitives do the actual cutting:
//!
//! - [`simple_split`]: contiguous, non-overlapping blocks in time order
//! - [`multiple_splits`]: fixed-length windows (stride = test length), each cut
//!   into train/valid/test by the same lengths
//!
//! [`SplitStrategy`] composes them into the `train_test` / `train_valid` pair
//! used by the pipeline.

use nalgebra::DMatrix;

use crate::domain::{LoadOptions, SplitArray, SplitSet, SplitType};
use crate::error::AppError;

fn slice_rows(x: &DMatrix<f64>, start: usize, len: usize) -> DMatrix<f64> {
    x.rows(start, len).into_owned()
}

/// Contiguous split.
///
/// When `train_len` is `None` the training block takes everything before the
/// validation and test blocks, i.e. test is the last `test_len` rows.
pub fn simple_split(
    x: &DMatrix<f64>,
    train_len: Option<usize>,
    valid_len: usize,
    test_len: usize,
) -> Result<SplitSet, AppError> {
    let n = x.nrows();
    let train_len = match train_len {
        Some(len) => len,
        None => n.checked_sub(valid_len + test_len).ok_or_else(|| {
            AppError::data(format!(
                "Cannot hold out {valid_len} validation + {test_len} test rows from {n} row(s)."
            ))
        })?,
    };
    let total = train_len + valid_len + test_len;
    if total > n {
        return Err(AppError::data(format!(
            "Split needs {total} rows (train={train_len}, valid={valid_len}, test={test_len}) but only {n} are available."
        )));
    }

    Ok(SplitSet {
        train: SplitArray::Contiguous(slice_rows(x, 0, train_len)),
        valid: (valid_len > 0).then(|| SplitArray::Contiguous(slice_rows(x, train_len, valid_len))),
        test: SplitArray::Contiguous(slice_rows(x, train_len + valid_len, test_len)),
    })
}

/// Windowed split.
///
/// Windows of `train_len + valid_len + test_len` rows start at row 0 and
/// advance by `test_len`, so consecutive windows overlap and every test block
/// follows the previous one. The last incomplete window is dropped.
pub fn multiple_splits(
    x: &DMatrix<f64>,
    train_len: usize,
    valid_len: usize,
    test_len: usize,
) -> Result<SplitSet, AppError> {
    if test_len == 0 {
        return Err(AppError::data("Windowed split requires a non-zero test length."));
    }
    let n = x.nrows();
    let window = train_len + valid_len + test_len;
    if window > n {
        return Err(AppError::data(format!(
            "Window of {window} rows (train={train_len}, valid={valid_len}, test={test_len}) does not fit in {n} row(s)."
        )));
    }

    let starts: Vec<usize> = (0..=n - window).step_by(test_len).collect();
    let train = starts.iter().map(|&s| slice_rows(x, s, train_len)).collect();
    let valid = (valid_len > 0).then(|| {
        SplitArray::Windowed(
            starts
                .iter()
                .map(|&s| slice_rows(x, s + train_len, valid_len))
                .collect(),
        )
    });
    let test = starts
        .iter()
        .map(|&s| slice_rows(x, s + train_len + valid_len, test_len))
        .collect();

    Ok(SplitSet {
        train: SplitArray::Windowed(train),
        valid,
        test: SplitArray::Windowed(test),
    })
}

/// Resolved split configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    /// Test is the trailing `test_len` rows; validation is the `valid_len`
    /// rows right after the first `train_len` rows of the remainder.
    Simple {
        train_len: usize,
        valid_len: usize,
        test_len: usize,
    },
    /// Windows of `train_len + valid_len` training rows followed by `test_len`
    /// test rows; validation is the trailing `valid_len` rows of each
    /// training window.
    Multi {
        train_len: usize,
        valid_len: usize,
        test_len: usize,
    },
    /// Contiguous train/test with a fixed test length; validation folds are
    /// windows over the training block.
    Default {
        test_len: usize,
        window_train_len: usize,
        window_test_len: usize,
    },
}

impl SplitStrategy {
    /// Resolve `options.split_type` for a series of `series_len` rows.
    ///
    /// The default strategy holds out 10% of the series for testing and uses
    /// five 31-day months of training per validation fold with a 31-day
    /// validation window.
    pub fn new(options: &LoadOptions, series_len: usize, samples_per_day: usize) -> Self {
        let valid_len = options.effective_valid_len();
        match options.split_type {
            SplitType::Simple => SplitStrategy::Simple {
                train_len: options.train_len,
                valid_len,
                test_len: options.test_len,
            },
            SplitType::Multi => SplitStrategy::Multi {
                train_len: options.train_len,
                valid_len,
                test_len: options.test_len,
            },
            SplitType::Default => SplitStrategy::Default {
                test_len: series_len / 10,
                window_train_len: 5 * 31 * samples_per_day,
                window_test_len: 31 * samples_per_day,
            },
        }
    }

    /// Like [`SplitStrategy::new`] but from a user-supplied name.
    pub fn from_name(
        name: &str,
        options: &LoadOptions,
        series_len: usize,
        samples_per_day: usize,
    ) -> Result<Self, AppError> {
        let split_type: SplitType = name.parse()?;
        let options = LoadOptions {
            split_type,
            ..options.clone()
        };
        Ok(Self::new(&options, series_len, samples_per_day))
    }

    /// First row of the trailing test block of an `n_rows` matrix.
    ///
    /// `None` for the windowed strategy, whose windows overlap by construction.
    pub fn held_out_start(&self, n_rows: usize) -> Option<usize> {
        match *self {
            SplitStrategy::Simple { test_len, .. } | SplitStrategy::Default { test_len, .. } => {
                Some(n_rows.saturating_sub(test_len))
            }
            SplitStrategy::Multi { .. } => None,
        }
    }

    /// Split the full matrix into train and test.
    pub fn train_test(&self, x: &DMatrix<f64>) -> Result<SplitSet, AppError> {
        match *self {
            SplitStrategy::Simple { test_len, .. } | SplitStrategy::Default { test_len, .. } => {
                simple_split(x, None, 0, test_len)
            }
            SplitStrategy::Multi {
                train_len,
                valid_len,
                test_len,
            } => multiple_splits(x, train_len + valid_len, 0, test_len),
        }
    }

    /// Split the training part of the full matrix into train and validation.
    ///
    /// The validation data is returned in the `test` slot.
    pub fn train_valid(&self, x: &DMatrix<f64>) -> Result<SplitSet, AppError> {
        let train = self.train_test(x)?.train;
        match *self {
            SplitStrategy::Simple {
                train_len, valid_len, ..
            } => match train {
                SplitArray::Contiguous(m) => simple_split(&m, Some(train_len), 0, valid_len),
                SplitArray::Windowed(_) => Err(AppError::data("Simple split produced windowed data.")),
            },
            SplitStrategy::Multi { train_len, .. } => {
                let mut heads = Vec::with_capacity(train.n_windows());
                let mut tails = Vec::with_capacity(train.n_windows());
                for w in train.windows() {
                    heads.push(slice_rows(w, 0, train_len));
                    tails.push(slice_rows(w, train_len, w.nrows() - train_len));
                }
                Ok(SplitSet {
                    train: SplitArray::Windowed(heads),
                    valid: None,
                    test: SplitArray::Windowed(tails),
                })
            }
            SplitStrategy::Default {
                window_train_len,
                window_test_len,
                ..
            } => match train {
                SplitArray::Contiguous(m) => multiple_splits(&m, window_train_len, 0, window_test_len),
                SplitArray::Windowed(_) => Err(AppError::data("Simple split produced windowed data.")),
            },
        }
    }

    /// `train_valid` in train mode, `train_test` otherwise.
    pub fn split(&self, x: &DMatrix<f64>, is_train: bool) -> Result<SplitSet, AppError> {
        if is_train {
            self.train_valid(x)
        } else {
            self.train_test(x)
        }
    }
}
