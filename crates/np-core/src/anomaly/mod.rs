//! Anomaly scoring over metrics snapshots.
//!
//! Two independent unsupervised detectors cover disjoint feature sets:
//! traffic shape (`[incoming_mbps, outgoing_mbps, active_connections]`)
//! and service health (`[average_latency_ms, packet_loss_pct]`). The pair
//! is replaced wholesale on every successful training cycle or startup
//! reload; concurrent scorers hold an `Arc` to whichever pair was current
//! when they looked.

pub mod detector;
pub mod persist;

use chrono::{DateTime, Utc};
use np_common::{AnomalyResult, MetricsSnapshot};
use np_math::StandardScaler;
use persist::{DetectorParams, ModelPayload};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

pub use detector::{Detector, TrainError};

/// Traffic-shape feature vector of a snapshot.
pub fn traffic_features(snapshot: &MetricsSnapshot) -> [f64; 3] {
    [
        snapshot.incoming_mbps,
        snapshot.outgoing_mbps,
        snapshot.active_connections as f64,
    ]
}

/// Service-health feature vector of a snapshot.
pub fn latency_features(snapshot: &MetricsSnapshot) -> [f64; 2] {
    [snapshot.average_latency_ms, snapshot.packet_loss_pct]
}

/// A trained detector pair. Immutable once built; replaced, never patched.
#[derive(Debug)]
pub struct ModelPair {
    pub trained_at: DateTime<Utc>,
    pub traffic: Detector<3>,
    pub latency: Detector<2>,
}

impl ModelPair {
    fn to_payload(&self, contamination: f64) -> ModelPayload {
        ModelPayload {
            contamination,
            traffic: detector_params(&self.traffic),
            latency: detector_params(&self.latency),
        }
    }

    fn from_payload(payload: ModelPayload) -> Result<Self, TrainError> {
        let traffic = rebuild_detector::<3>(&payload.traffic, payload.contamination)?;
        let latency = rebuild_detector::<2>(&payload.latency, payload.contamination)?;
        Ok(ModelPair {
            trained_at: Utc::now(),
            traffic,
            latency,
        })
    }
}

fn detector_params<const N: usize>(detector: &Detector<N>) -> DetectorParams {
    DetectorParams {
        mean: detector.scaler().mean().to_vec(),
        scale: detector.scaler().scale().to_vec(),
        samples: detector.samples().iter().map(|row| row.to_vec()).collect(),
    }
}

fn rebuild_detector<const N: usize>(
    params: &DetectorParams,
    contamination: f64,
) -> Result<Detector<N>, TrainError> {
    let scaler = StandardScaler::from_params(params.mean.clone(), params.scale.clone())
        .ok_or_else(|| TrainError::ModelBuild("invalid scaler parameters".into()))?;
    let mut samples = Vec::with_capacity(params.samples.len());
    for row in &params.samples {
        let row: [f64; N] = row.as_slice().try_into().map_err(|_| {
            TrainError::ModelBuild(format!(
                "training row width {} does not match feature count {}",
                row.len(),
                N
            ))
        })?;
        samples.push(row);
    }
    Detector::from_params(scaler, samples, contamination)
}

/// Trains, reloads, and serves the detector pair.
pub struct AnomalyScorer {
    contamination: f64,
    artifact_path: Option<PathBuf>,
    models: RwLock<Option<Arc<ModelPair>>>,
}

impl AnomalyScorer {
    /// Build an untrained scorer. `model_dir` selects where artifacts are
    /// persisted; `None` keeps trained pairs in memory only.
    pub fn new(contamination: f64, model_dir: Option<PathBuf>) -> Self {
        AnomalyScorer {
            contamination,
            artifact_path: model_dir.map(|dir| dir.join("anomaly_models.json")),
            models: RwLock::new(None),
        }
    }

    /// Attempt to restore the pair persisted by an earlier run. Missing or
    /// corrupt artifacts leave the scorer untrained; this never fails
    /// startup. Returns whether a pair was restored.
    pub fn load_persisted(&self) -> bool {
        let Some(path) = &self.artifact_path else {
            return false;
        };
        if !path.exists() {
            debug!(path = %path.display(), "no persisted anomaly models");
            return false;
        }
        let payload = match persist::load(path) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "persisted anomaly models rejected; starting untrained"
                );
                return false;
            }
        };
        match ModelPair::from_payload(payload) {
            Ok(pair) => {
                self.swap(Arc::new(pair));
                info!(path = %path.display(), "restored persisted anomaly models");
                true
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "persisted anomaly models unusable; starting untrained"
                );
                false
            }
        }
    }

    /// Fit a fresh pair on `snapshots` and swap it in.
    ///
    /// Empty input is an explicit failure that leaves any prior pair
    /// untouched. Artifact persistence is best-effort: a write failure is
    /// logged and the freshly trained in-memory pair still replaces the
    /// old one.
    pub fn train(&self, snapshots: &[MetricsSnapshot]) -> Result<(), TrainError> {
        if snapshots.is_empty() {
            return Err(TrainError::EmptyInput);
        }

        let traffic_rows: Vec<[f64; 3]> = snapshots.iter().map(traffic_features).collect();
        let latency_rows: Vec<[f64; 2]> = snapshots.iter().map(latency_features).collect();

        let pair = ModelPair {
            trained_at: Utc::now(),
            traffic: Detector::fit(&traffic_rows, self.contamination)?,
            latency: Detector::fit(&latency_rows, self.contamination)?,
        };

        if let Some(path) = &self.artifact_path {
            if let Err(err) = persist::save(path, &pair.to_payload(self.contamination)) {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to persist anomaly models; keeping in-memory pair"
                );
            }
        }

        self.swap(Arc::new(pair));
        info!(snapshots = snapshots.len(), "anomaly models trained");
        Ok(())
    }

    /// Score one snapshot. An untrained scorer returns the neutral result
    /// rather than an error.
    pub fn score(&self, snapshot: &MetricsSnapshot) -> AnomalyResult {
        let pair = {
            let guard = self.models.read().unwrap_or_else(|e| e.into_inner());
            guard.clone()
        };
        let Some(pair) = pair else {
            debug!("score requested before training; returning neutral result");
            return AnomalyResult::neutral();
        };

        let traffic_score = pair.traffic.decision(&traffic_features(snapshot));
        let latency_score = pair.latency.decision(&latency_features(snapshot));
        let traffic_anomaly = pair.traffic.is_anomalous(traffic_score);
        let latency_anomaly = pair.latency.is_anomalous(latency_score);

        AnomalyResult {
            is_anomaly: traffic_anomaly || latency_anomaly,
            traffic_anomaly,
            latency_anomaly,
            traffic_score,
            latency_score,
            overall_score: traffic_score.min(latency_score),
        }
    }

    /// Whether a trained pair is currently installed.
    pub fn is_trained(&self) -> bool {
        self.models
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn swap(&self, pair: Arc<ModelPair>) {
        *self.models.write().unwrap_or_else(|e| e.into_inner()) = Some(pair);
    }
}
