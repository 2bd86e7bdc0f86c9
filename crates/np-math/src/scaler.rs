//! Per-feature standardization for detector inputs.
//!
//! Centers each feature on its training mean and divides by its training
//! standard deviation, with a floor on the divisor so constant features do
//! not blow up the transform.

use serde::{Deserialize, Serialize};

/// Minimum scale to avoid divide-by-zero on constant features.
const MIN_SCALE: f64 = 1e-9;

/// Fitted mean/scale standardizer.
///
/// `scale` is the population standard deviation per feature, floored at
/// `MIN_SCALE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit a scaler to `rows`. Returns `None` for empty input.
    pub fn fit<const N: usize>(rows: &[[f64; N]]) -> Option<Self> {
        if rows.is_empty() || N == 0 {
            return None;
        }
        let n = rows.len() as f64;

        let mut mean = vec![0.0; N];
        for row in rows {
            for (acc, value) in mean.iter_mut().zip(row.iter()) {
                *acc += value;
            }
        }
        for acc in &mut mean {
            *acc /= n;
        }

        let mut variance = vec![0.0; N];
        for row in rows {
            for ((acc, value), center) in variance.iter_mut().zip(row.iter()).zip(mean.iter()) {
                let d = value - center;
                *acc += d * d;
            }
        }
        let scale = variance
            .into_iter()
            .map(|v| (v / n).sqrt().max(MIN_SCALE))
            .collect();

        Some(StandardScaler { mean, scale })
    }

    /// Reconstruct a scaler from previously fitted parameters.
    ///
    /// Returns `None` when the parameter vectors disagree in length or
    /// contain non-finite values.
    pub fn from_params(mean: Vec<f64>, scale: Vec<f64>) -> Option<Self> {
        if mean.is_empty() || mean.len() != scale.len() {
            return None;
        }
        if mean.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
            return None;
        }
        let scale = scale.into_iter().map(|s| s.max(MIN_SCALE)).collect();
        Some(StandardScaler { mean, scale })
    }

    /// Number of features this scaler was fitted on.
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardize one row. The row width must match the fitted width.
    pub fn transform<const N: usize>(&self, row: &[f64; N]) -> [f64; N] {
        debug_assert_eq!(N, self.mean.len());
        let mut out = [0.0; N];
        for (i, value) in row.iter().enumerate() {
            out[i] = (value - self.mean[i]) / self.scale[i];
        }
        out
    }

    /// Fitted per-feature means.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Fitted per-feature scales.
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fit_empty_returns_none() {
        assert!(StandardScaler::fit::<2>(&[]).is_none());
    }

    #[test]
    fn test_transform_centers_on_mean() {
        let rows = [[1.0, 10.0], [3.0, 30.0], [5.0, 50.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let centered = scaler.transform(&[3.0, 30.0]);
        assert!(centered[0].abs() < 1e-9);
        assert!(centered[1].abs() < 1e-9);
    }

    #[test]
    fn test_transform_unit_variance() {
        let rows = [[0.0], [2.0], [4.0], [6.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let transformed: Vec<f64> = rows.iter().map(|r| scaler.transform(r)[0]).collect();
        let spread = transformed
            .iter()
            .map(|v| v * v)
            .sum::<f64>()
            / transformed.len() as f64;
        assert!((spread - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_feature_does_not_divide_by_zero() {
        let rows = [[7.0, 1.0], [7.0, 2.0], [7.0, 3.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let out = scaler.transform(&[7.0, 2.0]);
        assert!(out[0].is_finite());
        assert_eq!(out[0], 0.0);
    }

    #[test]
    fn test_from_params_rejects_mismatched_lengths() {
        assert!(StandardScaler::from_params(vec![0.0, 1.0], vec![1.0]).is_none());
        assert!(StandardScaler::from_params(vec![], vec![]).is_none());
        assert!(StandardScaler::from_params(vec![f64::NAN], vec![1.0]).is_none());
    }

    #[test]
    fn test_from_params_matches_fit() {
        let rows = [[1.0, -4.0], [5.0, 0.0], [9.0, 4.0]];
        let fitted = StandardScaler::fit(&rows).unwrap();
        let rebuilt =
            StandardScaler::from_params(fitted.mean().to_vec(), fitted.scale().to_vec()).unwrap();
        assert_eq!(fitted, rebuilt);
    }

    proptest! {
        #[test]
        fn prop_transform_is_finite(
            rows in proptest::collection::vec([-1e6f64..1e6, -1e6f64..1e6], 1..32),
        ) {
            let rows: Vec<[f64; 2]> = rows;
            let scaler = StandardScaler::fit(&rows).unwrap();
            for row in &rows {
                let out = scaler.transform(row);
                prop_assert!(out[0].is_finite());
                prop_assert!(out[1].is_finite());
            }
        }
    }
}
