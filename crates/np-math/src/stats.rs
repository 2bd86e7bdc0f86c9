//! Descriptive statistics for detector calibration.

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Linearly interpolated quantile of `samples` at `q` in [0, 1].
///
/// Matches the "linear" interpolation convention: the quantile sits at
/// fractional rank `q * (n - 1)` of the sorted samples. Non-finite samples
/// are ignored. Returns 0.0 when no finite sample remains.
pub fn quantile(samples: &[f64], q: f64) -> f64 {
    let mut values: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    let q = q.clamp(0.0, 1.0);
    let rank = q * (values.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        values[lower]
    } else {
        let weight = rank - lower as f64;
        values[lower] * (1.0 - weight) + values[upper] * weight
    }
}
