//! Snapshot projection.
//!
//! `build_snapshot` is a pure function of the window, the query instant,
//! and the configured top-N size. All randomness lives in the aggregator,
//! so repeated calls without intervening events yield identical snapshots.

use crate::aggregate::AggregationWindow;
use chrono::{DateTime, Utc};
use np_common::{IpCount, MetricsSnapshot, PortBytes, ProtocolSplit};

/// Project the window into an immutable metrics snapshot.
pub fn build_snapshot(
    window: &AggregationWindow,
    now: DateTime<Utc>,
    top_n: usize,
) -> MetricsSnapshot {
    // Floor at one second so rates are defined for a just-started window.
    let elapsed_secs = ((now - window.started_at).num_milliseconds() as f64 / 1000.0).max(1.0);

    let incoming_mbps = mbps(window.incoming_bytes, elapsed_secs);
    let outgoing_mbps = mbps(window.outgoing_bytes, elapsed_secs);

    let average_latency_ms = window.latency_mean();
    let peer_latency = if window.latency_len() > 0 {
        Some(average_latency_ms)
    } else {
        None
    };

    let top_source_ips = window
        .source_ips
        .top(top_n)
        .into_iter()
        .map(|(ip, count)| IpCount {
            ip,
            count,
            location: None,
            latency_ms: peer_latency,
        })
        .collect();
    let top_dest_ips = window
        .dest_ips
        .top(top_n)
        .into_iter()
        .map(|(ip, count)| IpCount {
            ip,
            count,
            location: None,
            latency_ms: peer_latency,
        })
        .collect();
    let top_ports = window
        .port_bytes
        .top(top_n)
        .into_iter()
        .map(|(port, bytes)| PortBytes { port, bytes })
        .collect();

    let protocol_total = window.tcp_packets + window.udp_packets;
    let protocols = if protocol_total > 0 {
        let tcp_pct = window.tcp_packets as f64 / protocol_total as f64 * 100.0;
        ProtocolSplit {
            tcp_pct,
            udp_pct: 100.0 - tcp_pct,
        }
    } else {
        ProtocolSplit::default()
    };

    MetricsSnapshot {
        timestamp: now,
        incoming_mbps,
        outgoing_mbps,
        active_connections: window.source_ips.len() as u64,
        top_source_ips,
        top_dest_ips,
        top_ports,
        protocols,
        average_latency_ms,
        packet_loss_pct: window.packet_loss_pct,
    }
}

fn mbps(bytes: u64, elapsed_secs: f64) -> f64 {
    bytes as f64 * 8.0 / (elapsed_secs * 1_000_000.0)
}
