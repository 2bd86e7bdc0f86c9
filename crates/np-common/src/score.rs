//! Anomaly scoring results.

use serde::{Deserialize, Serialize};

/// Outcome of scoring one snapshot against the trained detector pair.
///
/// Scores come from the detectors' decision functions, where lower means
/// more anomalous; `overall_score` is the minimum of the two sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyResult {
    pub is_anomaly: bool,
    pub traffic_anomaly: bool,
    pub latency_anomaly: bool,
    pub traffic_score: f64,
    pub latency_score: f64,
    pub overall_score: f64,
}

impl AnomalyResult {
    /// The defined answer for queries against an untrained model pair.
    pub fn neutral() -> Self {
        AnomalyResult {
            is_anomaly: false,
            traffic_anomaly: false,
            latency_anomaly: false,
            traffic_score: 0.0,
            latency_score: 0.0,
            overall_score: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_result() {
        let neutral = AnomalyResult::neutral();
        assert!(!neutral.is_anomaly);
        assert!(!neutral.traffic_anomaly);
        assert!(!neutral.latency_anomaly);
        assert_eq!(neutral.overall_score, 0.0);
    }
}
