//! Traffic pattern analysis over a snapshot range.

use np_common::MetricsSnapshot;
use serde::{Deserialize, Serialize};

/// Aggregate shape of traffic over a period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PatternSummary {
    pub average_incoming_mbps: f64,
    pub average_outgoing_mbps: f64,
    pub peak_incoming_mbps: f64,
    pub peak_outgoing_mbps: f64,
    pub average_connections: f64,
    pub average_latency_ms: f64,
}

/// Summarize a range of snapshots; empty input yields the zeroed summary.
pub fn summarize_patterns(snapshots: &[MetricsSnapshot]) -> PatternSummary {
    if snapshots.is_empty() {
        return PatternSummary::default();
    }
    let n = snapshots.len() as f64;

    let mut summary = PatternSummary::default();
    for snapshot in snapshots {
        summary.average_incoming_mbps += snapshot.incoming_mbps;
        summary.average_outgoing_mbps += snapshot.outgoing_mbps;
        summary.average_connections += snapshot.active_connections as f64;
        summary.average_latency_ms += snapshot.average_latency_ms;
        summary.peak_incoming_mbps = summary.peak_incoming_mbps.max(snapshot.incoming_mbps);
        summary.peak_outgoing_mbps = summary.peak_outgoing_mbps.max(snapshot.outgoing_mbps);
    }
    summary.average_incoming_mbps /= n;
    summary.average_outgoing_mbps /= n;
    summary.average_connections /= n;
    summary.average_latency_ms /= n;
    summary
}
