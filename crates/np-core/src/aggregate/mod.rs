//! Rolling traffic statistics.
//!
//! The `AggregationWindow` is the only mutable state shared between the
//! collection tasks. It has exactly one writer — the consumer task calling
//! `apply_event` under the window's write lock — and any number of readers
//! (snapshot builder, training jobs) on the read side of the same lock, so
//! every event is observed fully applied or not at all.
//!
//! Counters grow monotonically until `reset`; the latency reservoir is a
//! fixed-capacity FIFO ring.

pub mod tables;

use chrono::{DateTime, Utc};
use ipnet::IpNet;
use np_common::{Protocol, TrafficEvent};
use rand::Rng;
use std::collections::VecDeque;
use std::net::IpAddr;

pub use tables::CountTable;

/// Synthetic latency draw bounds, milliseconds. Used when the capture path
/// provides no measurement.
const SYNTHETIC_LATENCY_MS: std::ops::RangeInclusive<f64> = 10.0..=200.0;

/// Synthetic packet-loss bounds, percent.
const SYNTHETIC_LOSS_PCT: std::ops::RangeInclusive<f64> = 0.0..=2.0;

/// Mutable rolling state since the last reset.
#[derive(Debug, Clone)]
pub struct AggregationWindow {
    pub started_at: DateTime<Utc>,
    pub total_packets: u64,
    pub tcp_packets: u64,
    pub udp_packets: u64,
    pub other_packets: u64,
    pub incoming_bytes: u64,
    pub outgoing_bytes: u64,
    pub source_ips: CountTable<IpAddr>,
    pub dest_ips: CountTable<IpAddr>,
    pub port_bytes: CountTable<u16>,
    /// Last measured or synthetic packet-loss sample, percent.
    pub packet_loss_pct: f64,
    latency: VecDeque<f64>,
    latency_capacity: usize,
}

impl AggregationWindow {
    /// Fresh window starting now. `latency_capacity` must be validated
    /// non-zero by configuration before this is reached.
    pub fn new(latency_capacity: usize) -> Self {
        AggregationWindow {
            started_at: Utc::now(),
            total_packets: 0,
            tcp_packets: 0,
            udp_packets: 0,
            other_packets: 0,
            incoming_bytes: 0,
            outgoing_bytes: 0,
            source_ips: CountTable::new(),
            dest_ips: CountTable::new(),
            port_bytes: CountTable::new(),
            packet_loss_pct: 0.0,
            latency: VecDeque::with_capacity(latency_capacity),
            latency_capacity,
        }
    }

    /// Discard all accumulated state and restart the window clock.
    pub fn reset(&mut self) {
        *self = AggregationWindow::new(self.latency_capacity);
    }

    /// Append a latency sample, evicting the oldest at capacity.
    pub fn push_latency(&mut self, sample_ms: f64) {
        if self.latency.len() >= self.latency_capacity {
            self.latency.pop_front();
        }
        self.latency.push_back(sample_ms);
    }

    /// Mean of the reservoir, 0.0 when empty.
    pub fn latency_mean(&self) -> f64 {
        if self.latency.is_empty() {
            return 0.0;
        }
        self.latency.iter().sum::<f64>() / self.latency.len() as f64
    }

    pub fn latency_len(&self) -> usize {
        self.latency.len()
    }

    /// Reservoir contents in insertion order, oldest first.
    pub fn latency_samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.latency.iter().copied()
    }
}

/// Fold one event into the window.
///
/// Direction is classified by the destination address: inside any of
/// `local_ranges` counts as incoming, everything else as outgoing. The rng
/// backs the synthetic latency and packet-loss samples for events that
/// carry no measurement.
pub fn apply_event<R: Rng>(
    window: &mut AggregationWindow,
    event: &TrafficEvent,
    local_ranges: &[IpNet],
    rng: &mut R,
) {
    window.total_packets += 1;
    match event.protocol {
        Protocol::Tcp => window.tcp_packets += 1,
        Protocol::Udp => window.udp_packets += 1,
        Protocol::Other => window.other_packets += 1,
    }

    if local_ranges.iter().any(|net| net.contains(&event.dst_addr)) {
        window.incoming_bytes += u64::from(event.bytes);
    } else {
        window.outgoing_bytes += u64::from(event.bytes);
    }

    window.source_ips.record(event.src_addr);
    window.dest_ips.record(event.dst_addr);

    // Port 0 stands for portless protocols; keep those out of the table.
    if event.dst_port != 0 {
        window.port_bytes.add(event.dst_port, u64::from(event.bytes));
    }

    let latency = event
        .latency_ms
        .unwrap_or_else(|| rng.random_range(SYNTHETIC_LATENCY_MS));
    window.push_latency(latency);

    // No loss measurement path exists yet (an accepted non-goal); refresh
    // the stored sample so snapshots stay pure projections.
    window.packet_loss_pct = rng.random_range(SYNTHETIC_LOSS_PCT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use np_common::config::default_local_ranges;
    use std::net::Ipv4Addr;

    fn event(protocol: Protocol, dst: [u8; 4], dst_port: u16, bytes: u32) -> TrafficEvent {
        TrafficEvent {
            protocol,
            src_addr: IpAddr::V4(Ipv4Addr::new(203, 0, 113, 5)),
            dst_addr: IpAddr::V4(Ipv4Addr::new(dst[0], dst[1], dst[2], dst[3])),
            src_port: 40000,
            dst_port,
            bytes,
            observed_at: Utc::now(),
            latency_ms: Some(25.0),
        }
    }

    #[test]
    fn test_counters_and_direction() {
        let mut window = AggregationWindow::new(100);
        let ranges = default_local_ranges();
        let mut rng = rand::rng();

        apply_event(
            &mut window,
            &event(Protocol::Tcp, [192, 168, 0, 9], 443, 1000),
            &ranges,
            &mut rng,
        );
        apply_event(
            &mut window,
            &event(Protocol::Udp, [8, 8, 8, 8], 53, 400),
            &ranges,
            &mut rng,
        );

        assert_eq!(window.total_packets, 2);
        assert_eq!(window.tcp_packets, 1);
        assert_eq!(window.udp_packets, 1);
        assert_eq!(window.incoming_bytes, 1000);
        assert_eq!(window.outgoing_bytes, 400);
        assert_eq!(window.dest_ips.len(), 2);
        assert_eq!(window.port_bytes.top(5), vec![(443, 1000), (53, 400)]);
    }

    #[test]
    fn test_other_protocol_skips_port_table() {
        let mut window = AggregationWindow::new(100);
        let ranges = default_local_ranges();
        let mut rng = rand::rng();

        apply_event(
            &mut window,
            &event(Protocol::Other, [10, 0, 0, 1], 0, 84),
            &ranges,
            &mut rng,
        );

        assert_eq!(window.other_packets, 1);
        assert!(window.port_bytes.is_empty());
        assert_eq!(window.incoming_bytes, 84);
    }

    #[test]
    fn test_reservoir_fifo_eviction() {
        let capacity = 8;
        let mut window = AggregationWindow::new(capacity);
        for i in 0..=capacity {
            window.push_latency(i as f64);
        }
        assert_eq!(window.latency_len(), capacity);
        let samples: Vec<f64> = window.latency_samples().collect();
        // Oldest sample (0.0) evicted, newest present.
        assert!(!samples.contains(&0.0));
        assert_eq!(samples.last().copied(), Some(capacity as f64));
    }

    #[test]
    fn test_reservoir_never_exceeds_capacity() {
        let mut window = AggregationWindow::new(16);
        for i in 0..1000 {
            window.push_latency(f64::from(i));
        }
        assert_eq!(window.latency_len(), 16);
    }

    #[test]
    fn test_measured_latency_preferred_over_synthetic() {
        let mut window = AggregationWindow::new(10);
        let ranges = default_local_ranges();
        let mut rng = rand::rng();
        let mut ev = event(Protocol::Tcp, [10, 0, 0, 2], 22, 100);
        ev.latency_ms = Some(7.5);

        apply_event(&mut window, &ev, &ranges, &mut rng);
        assert_eq!(window.latency_samples().next(), Some(7.5));
    }

    #[test]
    fn test_synthetic_samples_within_bounds() {
        let mut window = AggregationWindow::new(64);
        let ranges = default_local_ranges();
        let mut rng = rand::rng();
        let mut ev = event(Protocol::Tcp, [10, 0, 0, 2], 80, 100);
        ev.latency_ms = None;

        for _ in 0..64 {
            apply_event(&mut window, &ev, &ranges, &mut rng);
        }
        assert!(window.latency_samples().all(|s| (10.0..=200.0).contains(&s)));
        assert!((0.0..=2.0).contains(&window.packet_loss_pct));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut window = AggregationWindow::new(10);
        let ranges = default_local_ranges();
        let mut rng = rand::rng();
        apply_event(
            &mut window,
            &event(Protocol::Tcp, [10, 0, 0, 3], 443, 900),
            &ranges,
            &mut rng,
        );
        let before = window.started_at;

        window.reset();
        assert_eq!(window.total_packets, 0);
        assert_eq!(window.latency_len(), 0);
        assert!(window.source_ips.is_empty());
        assert!(window.started_at >= before);
    }
}
