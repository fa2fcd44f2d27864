//! Hour-of-day detrending.
//!
//! The trend is the mean load per hour of day computed over the training
//! prefix only. It is subtracted from every row of the series and returned as
//! a per-row vector so predictions can be shifted back later.

use crate::domain::{HOURS_PER_DAY, LoadSeries};
use crate::error::AppError;
use crate::math::mean;

/// Mean load per hour of day over the first `train_len` rows.
///
/// `None` marks an hour that never occurs in the prefix.
pub fn hourly_means(series: &LoadSeries, train_len: usize) -> [Option<f64>; HOURS_PER_DAY] {
    let mut buckets: [Vec<f64>; HOURS_PER_DAY] = std::array::from_fn(|_| Vec::new());
    for r in series.records().iter().take(train_len) {
        buckets[r.hour()].push(r.load);
    }
    std::array::from_fn(|h| mean(&buckets[h]))
}

/// Remove the hour-of-day trend estimated on the first `train_len` rows.
///
/// Returns the detrended series and the trend vector without its last element,
/// aligned with the feature matrix (which also drops the last load value).
/// Rows whose hour was never seen in the prefix are left as they are and get a
/// trend value of `0.0`.
pub fn apply_detrend(series: &LoadSeries, train_len: usize) -> Result<(LoadSeries, Vec<f64>), AppError> {
    if train_len > series.len() {
        tracing::warn!(
            train_len,
            rows = series.len(),
            "detrend prefix is longer than the series; using all rows"
        );
    }

    let means = hourly_means(series, train_len);
    let unseen: Vec<usize> = (0..HOURS_PER_DAY).filter(|&h| means[h].is_none()).collect();
    if !unseen.is_empty() {
        tracing::warn!(?unseen, "hours missing from the detrend prefix are left untouched");
    }

    let mut loads = Vec::with_capacity(series.len());
    let mut trend = Vec::with_capacity(series.len());
    for r in series.records() {
        let mu = means[r.hour()].unwrap_or(0.0);
        loads.push(r.load - mu);
        trend.push(mu);
    }
    trend.pop();

    Ok((series.with_loads(&loads)?, trend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LoadRecord, N_TEMPERATURE};
    use chrono::{Duration, NaiveDate};

    fn series(loads: &[f64]) -> LoadSeries {
        let start = NaiveDate::from_ymd_opt(2005, 3, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let records = loads
            .iter()
            .enumerate()
            .map(|(i, &load)| LoadRecord {
                datetime: start + Duration::hours(i as i64),
                load,
                temperatures: [0.0; N_TEMPERATURE],
            })
            .collect();
        LoadSeries::new(records).unwrap()
    }

    #[test]
    fn trend_uses_training_prefix_only() {
        // Two days; the second day is shifted by +100 and must not leak into the means.
        let mut loads: Vec<f64> = (0..24).map(|h| h as f64).collect();
        loads.extend((0..24).map(|h| h as f64 + 100.0));
        let s = series(&loads);

        let (detrended, trend) = apply_detrend(&s, 24).unwrap();
        let d = detrended.loads();
        assert!(d[..24].iter().all(|v| v.abs() < 1e-12));
        assert!(d[24..].iter().all(|v| (v - 100.0).abs() < 1e-12));

        assert_eq!(trend.len(), 47);
        assert!((trend[5] - 5.0).abs() < 1e-12);
        assert!((trend[29] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn detrend_is_deterministic_and_reversible() {
        let loads: Vec<f64> = (0..72).map(|i| 1000.0 + (i as f64 * 0.7).sin() * 50.0).collect();
        let s = series(&loads);
        let (a, ta) = apply_detrend(&s, 48).unwrap();
        let (b, tb) = apply_detrend(&s, 48).unwrap();
        assert_eq!(a, b);
        assert_eq!(ta, tb);

        let d = a.loads();
        for i in 0..ta.len() {
            assert!((d[i] + ta[i] - loads[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn unseen_hours_are_left_unmodified() {
        // Prefix covers hours 0..12 only.
        let loads: Vec<f64> = (0..48).map(|i| 10.0 + i as f64).collect();
        let s = series(&loads);
        let (d, trend) = apply_detrend(&s, 12).unwrap();
        let d = d.loads();
        assert!((d[20] - loads[20]).abs() < 1e-12);
        assert_eq!(trend[20], 0.0);
        assert!((d[3] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn prefix_longer_than_series_uses_everything() {
        let s = series(&[1.0, 2.0, 3.0]);
        let means = hourly_means(&s, 100);
        assert_eq!(means[0], Some(1.0));
        assert_eq!(means[2], Some(3.0));
        assert_eq!(means[3], None);
    }
}
