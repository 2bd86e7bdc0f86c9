//! Raw traffic events emitted by a capture source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Transport protocol of a captured packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Udp,
    /// Any IP protocol that is neither TCP nor UDP, and undecodable frames.
    Other,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
            Protocol::Other => write!(f, "other"),
        }
    }
}

/// A single observed packet, normalized across capture providers.
///
/// Ports are 0 for portless protocols (`Protocol::Other`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficEvent {
    pub protocol: Protocol,
    pub src_addr: IpAddr,
    pub dst_addr: IpAddr,
    pub src_port: u16,
    pub dst_port: u16,
    /// On-wire size in bytes.
    pub bytes: u32,
    pub observed_at: DateTime<Utc>,
    /// Measured round-trip latency in milliseconds, when the capture path
    /// can provide one. The aggregator substitutes a synthetic sample when
    /// absent.
    pub latency_ms: Option<f64>,
}
