//! Feature scaling with a strict fit/apply split.
//!
//! A `Scaler` is fitted once, on the training slice only, and then applied to
//! the full matrix. There is deliberately no way to refit an existing scaler:
//! statistics from validation/test rows must never reach the fitted state.
//!
//! Both scalers store a per-column `offset` and `scale` so that
//!
//! ```text
//! transform(x)         = (x - offset) / scale
//! inverse_transform(z) = z * scale + offset
//! ```
//!
//! with `offset = mean, scale = std` (standard) or `offset = min, scale = max - min`
//! (min-max). Constant columns get `scale = 1` so they map to zero.

use nalgebra::{DMatrix, Scalar};
use serde::{Deserialize, Serialize};

use crate::domain::ScalerKind;
use crate::error::AppError;
use crate::math::stats::{mean, min_max, population_std};

/// Fitted scaling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    kind: ScalerKind,
    offset: Vec<f64>,
    scale: Vec<f64>,
}

impl Scaler {
    /// Fit a scaler on `x` (rows = samples, columns = features).
    pub fn fit(x: &DMatrix<f64>, kind: ScalerKind) -> Result<Self, AppError> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(AppError::data(format!(
                "Cannot fit a {kind:?} scaler on an empty slice ({}x{}).",
                x.nrows(),
                x.ncols()
            )));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(AppError::data(format!(
                "Cannot fit a {kind:?} scaler: training slice contains non-finite values."
            )));
        }

        let mut offset = Vec::with_capacity(x.ncols());
        let mut scale = Vec::with_capacity(x.ncols());
        for col in x.column_iter() {
            let values: Vec<f64> = col.iter().copied().collect();
            let (o, s) = match kind {
                ScalerKind::Standard => {
                    // Non-empty was checked above.
                    let mu = mean(&values).unwrap_or(0.0);
                    let sd = population_std(&values).unwrap_or(0.0);
                    (mu, sd)
                }
                ScalerKind::MinMax => {
                    let (lo, hi) = min_max(&values).unwrap_or((0.0, 0.0));
                    (lo, hi - lo)
                }
            };
            offset.push(o);
            scale.push(if s > 0.0 { s } else { 1.0 });
        }

        Ok(Self { kind, offset, scale })
    }

    pub fn kind(&self) -> ScalerKind {
        self.kind
    }

    pub fn n_features(&self) -> usize {
        self.offset.len()
    }

    pub fn offset(&self) -> &[f64] {
        &self.offset
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Apply the fitted parameters to `x`.
    pub fn transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, AppError> {
        self.check_width(x.ncols())?;
        Ok(DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| {
            (x[(i, j)] - self.offset[j]) / self.scale[j]
        }))
    }

    /// Map scaled values back to the original units.
    pub fn inverse_transform(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, AppError> {
        self.check_width(x.ncols())?;
        Ok(DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| {
            x[(i, j)] * self.scale[j] + self.offset[j]
        }))
    }

    fn check_width(&self, ncols: usize) -> Result<(), AppError> {
        if ncols != self.n_features() {
            return Err(AppError::data(format!(
                "Scaler was fitted on {} feature(s) but got {ncols}.",
                self.n_features()
            )));
        }
        Ok(())
    }
}

/// Fit a scaler of `kind` on `x` and return it together with the scaled `x`.
pub fn fit_transform(x: &DMatrix<f64>, kind: ScalerKind) -> Result<(Scaler, DMatrix<f64>), AppError> {
    let scaler = Scaler::fit(x, kind)?;
    let z = scaler.transform(x)?;
    Ok((scaler, z))
}

/// Scale `x` with an existing scaler, or fit a new one (`scaler_type`,
/// standard by default) when none is given.
pub fn transform(
    x: &DMatrix<f64>,
    scaler: Option<&Scaler>,
    scaler_type: Option<ScalerKind>,
) -> Result<(Scaler, DMatrix<f64>), AppError> {
    match scaler {
        Some(s) => Ok((s.clone(), s.transform(x)?)),
        None => fit_transform(x, scaler_type.unwrap_or_default()),
    }
}

/// Undo scaling and, optionally, add back a detrending component.
///
/// `x` may hold any real element type (e.g. `f32` model outputs); it is
/// converted to `f64` first. `trend` holds one value per row and is added to
/// every column of that row.
pub fn inverse_transform<T>(
    x: &DMatrix<T>,
    scaler: &Scaler,
    trend: Option<&[f64]>,
) -> Result<DMatrix<f64>, AppError>
where
    T: Scalar + Copy + Into<f64>,
{
    let x: DMatrix<f64> = x.map(|v| v.into());
    let mut out = scaler.inverse_transform(&x)?;
    if let Some(trend) = trend {
        if trend.len() != out.nrows() {
            return Err(AppError::data(format!(
                "Trend length {} does not match {} row(s).",
                trend.len(),
                out.nrows()
            )));
        }
        for (mut row, t) in out.row_iter_mut().zip(trend) {
            row.add_scalar_mut(*t);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DMatrix<f64> {
        DMatrix::from_row_slice(4, 2, &[1.0, 10.0, 2.0, 20.0, 3.0, 30.0, 4.0, 40.0])
    }

    #[test]
    fn standard_scaler_centers_and_scales() {
        let (scaler, z) = fit_transform(&sample(), ScalerKind::Standard).unwrap();
        assert!((scaler.offset()[0] - 2.5).abs() < 1e-12);
        assert!((scaler.scale()[0] - 1.25_f64.sqrt()).abs() < 1e-12);
        for col in z.column_iter() {
            let m: f64 = col.iter().sum::<f64>() / 4.0;
            let v: f64 = col.iter().map(|x| (x - m).powi(2)).sum::<f64>() / 4.0;
            assert!(m.abs() < 1e-12);
            assert!((v - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn minmax_scaler_maps_training_slice_to_unit_interval() {
        let (_, z) = fit_transform(&sample(), ScalerKind::MinMax).unwrap();
        assert!((z[(0, 0)] - 0.0).abs() < 1e-12);
        assert!((z[(3, 1)] - 1.0).abs() < 1e-12);
        assert!((z[(1, 0)] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn constant_column_does_not_divide_by_zero() {
        let x = DMatrix::from_element(3, 1, 5.0);
        let (scaler, z) = fit_transform(&x, ScalerKind::Standard).unwrap();
        assert_eq!(scaler.scale(), &[1.0]);
        assert!(z.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn empty_slice_is_rejected() {
        let x = DMatrix::<f64>::zeros(0, 1);
        let err = Scaler::fit(&x, ScalerKind::Standard).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Data);
    }

    #[test]
    fn existing_scaler_is_applied_without_refit() {
        let train = sample();
        let (scaler, _) = transform(&train, None, Some(ScalerKind::MinMax)).unwrap();
        let other = DMatrix::from_row_slice(1, 2, &[7.0, 70.0]);
        let (same, z) = transform(&other, Some(&scaler), None).unwrap();
        assert_eq!(same, scaler);
        assert!((z[(0, 0)] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn inverse_round_trips() {
        let x = sample();
        let (scaler, z) = fit_transform(&x, ScalerKind::Standard).unwrap();
        let back = inverse_transform(&z, &scaler, None).unwrap();
        assert!((back - x).abs().max() < 1e-9);
    }

    #[test]
    fn inverse_accepts_f32_and_adds_trend() {
        let x = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        let (scaler, z) = fit_transform(&x, ScalerKind::Standard).unwrap();
        let z32: DMatrix<f32> = z.map(|v| v as f32);
        let back = inverse_transform(&z32, &scaler, Some(&[10.0, 20.0, 30.0])).unwrap();
        assert!((back[(0, 0)] - 11.0).abs() < 1e-5);
        assert!((back[(2, 0)] - 33.0).abs() < 1e-5);

        let err = inverse_transform(&z, &scaler, Some(&[1.0])).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Data);
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let (scaler, _) = fit_transform(&sample(), ScalerKind::Standard).unwrap();
        let narrow = DMatrix::from_element(2, 1, 0.0);
        assert!(scaler.transform(&narrow).is_err());
    }
}
