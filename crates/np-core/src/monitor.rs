//! The monitoring facade.
//!
//! `Monitor` composes the collector, the anomaly scorer, and a history
//! store behind the operations external consumers poll: start/stop,
//! snapshot, train, and score. It owns the degradation policy at the
//! seams — snapshot persistence and history queries are best-effort and
//! never take the pipeline down.

use crate::anomaly::{AnomalyScorer, TrainError};
use crate::collector::NetworkCollector;
use crate::history::SnapshotStore;
use chrono::{Duration, Utc};
use np_common::{AnomalyResult, MetricsSnapshot, MonitorConfig, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Default training lookback for `train_from_history`.
pub fn default_training_lookback() -> Duration {
    Duration::days(7)
}

/// Composes collection, scoring, and history behind the core operations.
pub struct Monitor {
    collector: NetworkCollector,
    scorer: AnomalyScorer,
    store: Arc<dyn SnapshotStore>,
}

impl Monitor {
    /// Build a monitor from validated configuration and a history store.
    ///
    /// Attempts to restore a persisted model pair before first use;
    /// missing or corrupt artifacts leave the scorer untrained rather than
    /// failing construction.
    pub fn new(config: MonitorConfig, store: Arc<dyn SnapshotStore>) -> Result<Self> {
        let scorer = AnomalyScorer::new(config.contamination, config.model_dir.clone());
        let collector = NetworkCollector::new(config)?;
        scorer.load_persisted();
        Ok(Monitor {
            collector,
            scorer,
            store,
        })
    }

    /// Start the collection session (idempotent).
    pub fn start(&self) -> Result<()> {
        self.collector.start()
    }

    /// Stop the collection session (idempotent, bounded).
    pub fn stop(&self) {
        self.collector.stop();
    }

    /// Whether a collection session is running.
    pub fn is_running(&self) -> bool {
        self.collector.is_running()
    }

    /// Build the current snapshot and persist it best-effort.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let snapshot = self.collector.snapshot();
        if let Err(err) = self.store.persist(&snapshot) {
            warn!(error = %err, "failed to persist snapshot; continuing with in-memory state");
        }
        snapshot
    }

    /// Train the detector pair on the given snapshots.
    pub fn train(&self, snapshots: &[MetricsSnapshot]) -> std::result::Result<(), TrainError> {
        self.scorer.train(snapshots)
    }

    /// Train on the history store's snapshots from the lookback window
    /// ending now. An empty window surfaces as `TrainError::EmptyInput`.
    pub fn train_from_history(&self, lookback: Duration) -> std::result::Result<(), TrainError> {
        let end = Utc::now();
        let start = end - lookback;
        let snapshots = self
            .store
            .query(start, end)
            .map_err(|err| TrainError::History(err.to_string()))?;
        info!(
            snapshots = snapshots.len(),
            lookback_hours = lookback.num_hours(),
            "training from history"
        );
        self.scorer.train(&snapshots)
    }

    /// Score one snapshot; neutral when untrained.
    pub fn score(&self, snapshot: &MetricsSnapshot) -> AnomalyResult {
        self.scorer.score(snapshot)
    }

    /// Whether a trained model pair is installed.
    pub fn is_trained(&self) -> bool {
        self.scorer.is_trained()
    }

    /// The active configuration.
    pub fn config(&self) -> &MonitorConfig {
        self.collector.config()
    }
}
