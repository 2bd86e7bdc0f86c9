//! Immutable metrics snapshots.
//!
//! A snapshot is a point-in-time projection of the aggregation window.
//! Instances are created per query, never mutated, and either persisted to a
//! history store or discarded by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// One entry of a top-N IP list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpCount {
    pub ip: IpAddr,
    pub count: u64,
    /// Geographic hint, when an enrichment source provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Window-average latency attributed to this peer, milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
}

/// One entry of the top-N ports list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBytes {
    pub port: u16,
    pub bytes: u64,
}

/// TCP/UDP share of protocol-bearing packets, in percent.
///
/// Both components are 0 when no TCP or UDP packet has been observed;
/// otherwise they sum to 100 within floating tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProtocolSplit {
    pub tcp_pct: f64,
    pub udp_pct: f64,
}

/// Point-in-time network metrics derived from the aggregation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub incoming_mbps: f64,
    pub outgoing_mbps: f64,
    /// Number of distinct source IPs observed in the window.
    pub active_connections: u64,
    pub top_source_ips: Vec<IpCount>,
    pub top_dest_ips: Vec<IpCount>,
    pub top_ports: Vec<PortBytes>,
    pub protocols: ProtocolSplit,
    pub average_latency_ms: f64,
    pub packet_loss_pct: f64,
}
