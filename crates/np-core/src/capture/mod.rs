//! Capture providers.
//!
//! A provider is chosen exactly once at session start — live pcap capture
//! (behind the `live-capture` feature) or the synthetic generator — instead
//! of scattering fallback branches through the pipeline. Capture
//! unavailability is never an error for the caller: selection logs the
//! degradation and hands back the synthetic provider.

#[cfg(feature = "live-capture")]
pub mod live;

use crate::ingest::EventSender;
use chrono::Utc;
use np_common::{MonitorConfig, Protocol, TrafficEvent};
use rand::Rng;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Events emitted per synthetic tick.
const SYNTHETIC_BURST: RangeInclusive<u32> = 10..=50;

/// Pause between synthetic ticks.
const SYNTHETIC_TICK: Duration = Duration::from_millis(100);

/// Share of synthetic events carrying TCP (the rest are UDP).
const SYNTHETIC_TCP_RATIO: f64 = 0.8;

/// Synthetic packet sizes, bytes.
const SYNTHETIC_BYTES: RangeInclusive<u32> = 500..=1500;

/// The traffic source driving a collection session.
pub enum CaptureProvider {
    #[cfg(feature = "live-capture")]
    Live {
        capture: live::LiveCapture,
        /// Degrade to the synthetic generator on a mid-run capture failure.
        fallback: bool,
    },
    Synthetic(SyntheticSource),
}

impl CaptureProvider {
    /// Short provider name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            #[cfg(feature = "live-capture")]
            CaptureProvider::Live { .. } => "live",
            CaptureProvider::Synthetic(_) => "synthetic",
        }
    }

    /// Produce events until the stop signal is set or the consumer hangs
    /// up. This is the body of the producer task.
    pub fn run(self, events: EventSender, stop: &AtomicBool) {
        match self {
            #[cfg(feature = "live-capture")]
            CaptureProvider::Live { capture, fallback } => {
                if let Err(err) = capture.run(&events, stop) {
                    if stop.load(Ordering::Relaxed) {
                        return;
                    }
                    if fallback {
                        warn!(error = %err, "live capture failed; degrading to synthetic generator");
                        SyntheticSource::default().run(&events, stop);
                    } else {
                        tracing::error!(
                            error = %err,
                            "live capture failed and synthetic fallback is disabled; producer exiting"
                        );
                    }
                }
            }
            CaptureProvider::Synthetic(source) => source.run(&events, stop),
        }
    }
}

/// Choose the provider for a session. Never fails: every degraded path
/// lands on the synthetic generator.
pub fn select_provider(config: &MonitorConfig) -> CaptureProvider {
    if !config.capture_enabled {
        info!("packet capture disabled by configuration; using synthetic generator");
        return CaptureProvider::Synthetic(SyntheticSource::default());
    }
    open_live(config).unwrap_or_else(|| CaptureProvider::Synthetic(SyntheticSource::default()))
}

#[cfg(feature = "live-capture")]
fn open_live(config: &MonitorConfig) -> Option<CaptureProvider> {
    match live::LiveCapture::open(&config.interface) {
        Ok(capture) => Some(CaptureProvider::Live {
            capture,
            fallback: config.synthetic_fallback,
        }),
        Err(err) => {
            warn!(
                error = %err,
                interface = %config.interface,
                "live capture unavailable; falling back to synthetic generator"
            );
            None
        }
    }
}

#[cfg(not(feature = "live-capture"))]
fn open_live(config: &MonitorConfig) -> Option<CaptureProvider> {
    warn!(
        interface = %config.interface,
        "live capture capability not built in; falling back to synthetic generator"
    );
    None
}

/// Synthetic traffic generator.
///
/// Emits bursts of randomized events at a fixed tick, approximating a
/// modest LAN: 80/20 tcp/udp, uniform addresses and ports, packet sizes in
/// [500, 1500] bytes. The stop signal is checked every tick.
pub struct SyntheticSource {
    burst: RangeInclusive<u32>,
    tick: Duration,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        SyntheticSource {
            burst: SYNTHETIC_BURST,
            tick: SYNTHETIC_TICK,
        }
    }
}

impl SyntheticSource {
    pub fn run(&self, events: &EventSender, stop: &AtomicBool) {
        let mut rng = rand::rng();
        info!("synthetic traffic generator started");
        while !stop.load(Ordering::Relaxed) {
            let burst = rng.random_range(self.burst.clone());
            for _ in 0..burst {
                if !events.send(synthetic_event(&mut rng)) {
                    // Consumer went away; nothing left to produce for.
                    return;
                }
            }
            std::thread::sleep(self.tick);
        }
        info!("synthetic traffic generator stopped");
    }
}

/// One randomized traffic event.
pub fn synthetic_event<R: Rng>(rng: &mut R) -> TrafficEvent {
    let protocol = if rng.random_bool(SYNTHETIC_TCP_RATIO) {
        Protocol::Tcp
    } else {
        Protocol::Udp
    };
    TrafficEvent {
        protocol,
        src_addr: random_ip(rng),
        dst_addr: random_ip(rng),
        src_port: rng.random_range(1..=u16::MAX),
        dst_port: rng.random_range(1..=u16::MAX),
        bytes: rng.random_range(SYNTHETIC_BYTES),
        observed_at: Utc::now(),
        latency_ms: None,
    }
}

fn random_ip<R: Rng>(rng: &mut R) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(
        rng.random_range(1..=255),
        rng.random_range(0..=255),
        rng.random_range(0..=255),
        rng.random_range(1..=254),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[test]
    fn test_synthetic_event_within_bounds() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let event = synthetic_event(&mut rng);
            assert!(matches!(event.protocol, Protocol::Tcp | Protocol::Udp));
            assert!((500..=1500).contains(&event.bytes));
            assert!(event.src_port >= 1);
            assert!(event.dst_port >= 1);
            assert!(event.latency_ms.is_none());
        }
    }

    #[test]
    fn test_synthetic_protocol_mix_roughly_80_20() {
        let mut rng = rand::rng();
        let n = 2000;
        let tcp = (0..n)
            .filter(|_| matches!(synthetic_event(&mut rng).protocol, Protocol::Tcp))
            .count();
        let ratio = tcp as f64 / n as f64;
        // 8 sigma of slack around the configured 0.8.
        assert!((0.7..0.9).contains(&ratio), "tcp ratio {ratio}");
    }

    #[test]
    fn test_synthetic_run_stops_on_signal() {
        let (tx, rx) = ingest::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_worker = Arc::clone(&stop);

        let worker = std::thread::spawn(move || {
            SyntheticSource::default().run(&tx, &stop_worker);
        });

        std::thread::sleep(Duration::from_millis(250));
        stop.store(true, Ordering::Relaxed);
        worker.join().expect("generator thread panicked");

        let mut received = 0;
        while let ingest::PopResult::Event(_) = rx.pop(Duration::from_millis(1)) {
            received += 1;
        }
        // At least two full ticks of at least 10 events each.
        assert!(received >= 20, "only {received} events emitted");
    }

    #[test]
    fn test_select_provider_respects_disabled_capture() {
        let config = MonitorConfig {
            capture_enabled: false,
            ..Default::default()
        };
        assert_eq!(select_provider(&config).kind(), "synthetic");
    }

    #[cfg(not(feature = "live-capture"))]
    #[test]
    fn test_select_provider_falls_back_without_capability() {
        let config = MonitorConfig::default();
        assert_eq!(select_provider(&config).kind(), "synthetic");
    }
}
