//! Missing load handling.
//!
//! Raw files contain hours with no recorded load (the first years of the
//! GEFCom2014 load track are empty). This module turns raw records into a
//! clean [`LoadSeries`] according to a [`FillNan`] strategy.

use crate::domain::{FillNan, HOURS_PER_DAY, LoadRecord, LoadSeries, RawRecord};
use crate::error::AppError;
use crate::math::{mean, median};
use chrono::Timelike;

/// Fill or drop missing load values.
///
/// Rows that still have no value after filling (nothing to copy from, or an
/// hour of day with no observations at all) are dropped.
pub fn fill_missing(records: &[RawRecord], strategy: FillNan) -> Result<LoadSeries, AppError> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| r.datetime);

    let filled: Vec<Option<f64>> = match strategy {
        FillNan::Drop => sorted.iter().map(|r| r.load).collect(),
        FillNan::Ffill => carry(sorted.iter().map(|r| r.load)),
        FillNan::Bfill => {
            let mut out = carry(sorted.iter().rev().map(|r| r.load));
            out.reverse();
            out
        }
        FillNan::Mean | FillNan::Median => {
            let stat: fn(&[f64]) -> Option<f64> = if strategy == FillNan::Mean { mean } else { median };
            let by_hour = hourly_statistic(&sorted, stat);
            sorted
                .iter()
                .map(|r| r.load.or(by_hour[r.datetime.hour() as usize]))
                .collect()
        }
    };

    let before = sorted.len();
    let clean: Vec<LoadRecord> = sorted
        .into_iter()
        .zip(filled)
        .filter_map(|(r, load)| {
            load.map(|load| LoadRecord {
                datetime: r.datetime,
                load,
                temperatures: r.temperatures,
            })
        })
        .collect();

    let dropped = before - clean.len();
    if dropped > 0 {
        tracing::debug!(dropped, ?strategy, "dropped rows without a load value");
    }

    LoadSeries::new(clean)
}

fn carry(values: impl Iterator<Item = Option<f64>>) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .map(|v| {
            if v.is_some() {
                last = v;
            }
            last
        })
        .collect()
}

fn hourly_statistic(records: &[RawRecord], stat: fn(&[f64]) -> Option<f64>) -> [Option<f64>; HOURS_PER_DAY] {
    let mut buckets: [Vec<f64>; HOURS_PER_DAY] = std::array::from_fn(|_| Vec::new());
    for r in records {
        if let Some(v) = r.load {
            buckets[r.datetime.hour() as usize].push(v);
        }
    }
    std::array::from_fn(|h| stat(&buckets[h]))
}
