//! A single fitted outlier detector.
//!
//! Couples a standard scaler with an isolation forest and a decision
//! threshold calibrated from the training data. The decision function is
//! the negated forest score, so lower means more anomalous; the threshold
//! is the contamination quantile of the training decisions, making the
//! configured fraction of training points fall on the anomalous side.

use extended_isolation_forest::{Forest, ForestOptions};
use np_math::{quantile, StandardScaler};
use thiserror::Error;

/// Trees per forest.
const N_TREES: usize = 100;

/// Upper bound on the per-tree subsample.
const MAX_SAMPLE_SIZE: usize = 256;

/// Errors raised by model training.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainError {
    #[error("no snapshots provided for training")]
    EmptyInput,

    #[error("failed to fit outlier model: {0}")]
    ModelBuild(String),

    #[error("history query failed: {0}")]
    History(String),
}

/// One fitted detector over `N` features.
pub struct Detector<const N: usize> {
    scaler: StandardScaler,
    forest: Forest<f64, N>,
    threshold: f64,
    /// Scaled training rows, retained because the forest itself cannot be
    /// serialized; reload re-fits from these.
    samples: Vec<[f64; N]>,
}

impl<const N: usize> Detector<N> {
    /// Fit scaler, forest, and threshold on raw feature rows.
    pub fn fit(rows: &[[f64; N]], contamination: f64) -> Result<Self, TrainError> {
        let scaler = StandardScaler::fit(rows).ok_or(TrainError::EmptyInput)?;
        let samples: Vec<[f64; N]> = rows.iter().map(|row| scaler.transform(row)).collect();
        Self::fit_scaled(scaler, samples, contamination)
    }

    /// Re-fit a detector from previously persisted parameters: the fitted
    /// scaler and the scaled training matrix. The threshold is recalibrated
    /// against the rebuilt forest.
    pub fn from_params(
        scaler: StandardScaler,
        samples: Vec<[f64; N]>,
        contamination: f64,
    ) -> Result<Self, TrainError> {
        if scaler.n_features() != N {
            return Err(TrainError::ModelBuild(format!(
                "scaler width {} does not match feature count {}",
                scaler.n_features(),
                N
            )));
        }
        Self::fit_scaled(scaler, samples, contamination)
    }

    fn fit_scaled(
        scaler: StandardScaler,
        samples: Vec<[f64; N]>,
        contamination: f64,
    ) -> Result<Self, TrainError> {
        if samples.is_empty() {
            return Err(TrainError::EmptyInput);
        }
        let options = ForestOptions {
            n_trees: N_TREES,
            sample_size: samples.len().min(MAX_SAMPLE_SIZE),
            max_tree_depth: None,
            extension_level: N - 1,
        };
        let forest = Forest::from_slice(&samples, &options)
            .map_err(|e| TrainError::ModelBuild(format!("{e:?}")))?;

        let decisions: Vec<f64> = samples.iter().map(|row| -forest.score(row)).collect();
        let threshold = quantile(&decisions, contamination);

        Ok(Detector {
            scaler,
            forest,
            threshold,
            samples,
        })
    }

    /// Decision function for one raw feature row; lower means more
    /// anomalous.
    pub fn decision(&self, row: &[f64; N]) -> f64 {
        -self.forest.score(&self.scaler.transform(row))
    }

    /// Whether a decision value falls on the anomalous side of the
    /// calibrated boundary.
    pub fn is_anomalous(&self, decision: f64) -> bool {
        decision <= self.threshold
    }

    /// Calibrated decision threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// The fitted scaler.
    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Scaled training rows backing this detector.
    pub fn samples(&self) -> &[[f64; N]] {
        &self.samples
    }
}

impl<const N: usize> std::fmt::Debug for Detector<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("features", &N)
            .field("threshold", &self.threshold)
            .field("samples", &self.samples.len())
            .finish()
    }
}
