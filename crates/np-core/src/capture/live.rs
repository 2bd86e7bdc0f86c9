//! Live packet capture via libpcap.
//!
//! Opens a promiscuous handle with a 1 s read timeout so the capture loop
//! re-checks the stop signal even on a quiet interface. Frames are decoded
//! with etherparse; frames without an IP layer are skipped, IP packets with
//! a transport other than TCP/UDP surface as `Protocol::Other` with zero
//! ports.

use crate::ingest::EventSender;
use chrono::{DateTime, Utc};
use etherparse::{InternetSlice, SlicedPacket, TransportSlice};
use np_common::{Error, InterfaceSelector, Protocol, Result, TrafficEvent};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, trace};

/// Read timeout on the pcap handle, milliseconds. Bounds how long the loop
/// can go without re-checking the stop signal.
const READ_TIMEOUT_MS: i32 = 1000;

/// An open live capture handle.
pub struct LiveCapture {
    capture: pcap::Capture<pcap::Active>,
    device_name: String,
}

impl LiveCapture {
    /// Open the selected interface. Every failure maps to
    /// `Error::CaptureUnavailable` so the caller can fall back without
    /// special-casing.
    pub fn open(interface: &InterfaceSelector) -> Result<Self> {
        let device = match interface {
            InterfaceSelector::Name(name) => pcap::Device::list()
                .map_err(|e| Error::CaptureUnavailable(e.to_string()))?
                .into_iter()
                .find(|d| d.name == *name)
                .ok_or_else(|| {
                    Error::CaptureUnavailable(format!("no capture device named {name}"))
                })?,
            InterfaceSelector::All => pcap::Device::lookup()
                .map_err(|e| Error::CaptureUnavailable(e.to_string()))?
                .ok_or_else(|| Error::CaptureUnavailable("no default capture device".into()))?,
        };
        let device_name = device.name.clone();
        let capture = pcap::Capture::from_device(device)
            .map_err(|e| Error::CaptureUnavailable(e.to_string()))?
            .promisc(true)
            .snaplen(65_535)
            .timeout(READ_TIMEOUT_MS)
            .open()
            .map_err(|e| Error::CaptureUnavailable(e.to_string()))?;
        Ok(LiveCapture {
            capture,
            device_name,
        })
    }

    /// Device this handle is attached to.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Capture until the stop signal is set or the handle fails.
    ///
    /// A clean stop returns `Ok(())`; a runtime capture failure returns
    /// `Error::Capture` so the provider can degrade to synthetic.
    pub fn run(mut self, events: &EventSender, stop: &AtomicBool) -> Result<()> {
        info!(device = %self.device_name, "live capture started");
        loop {
            if stop.load(Ordering::Relaxed) {
                info!(device = %self.device_name, "live capture stopped");
                return Ok(());
            }
            match self.capture.next_packet() {
                Ok(packet) => {
                    if let Some(event) = decode_packet(packet.data, Utc::now()) {
                        if !events.send(event) {
                            return Ok(());
                        }
                    }
                }
                // Quiet interface: the read timeout lets us re-check stop.
                Err(pcap::Error::TimeoutExpired) => continue,
                Err(err) => return Err(Error::Capture(err.to_string())),
            }
        }
    }
}

/// Decode one captured frame into a traffic event.
///
/// Returns `None` for frames etherparse cannot slice and for frames
/// without an IP layer (ARP, LLDP, ...).
pub fn decode_packet(data: &[u8], observed_at: DateTime<Utc>) -> Option<TrafficEvent> {
    let sliced = match SlicedPacket::from_ethernet(data) {
        Ok(sliced) => sliced,
        Err(err) => {
            trace!(error = %err, "undecodable frame");
            return None;
        }
    };

    let (src_addr, dst_addr) = match sliced.ip? {
        InternetSlice::Ipv4(header, _) => (
            IpAddr::V4(header.source_addr()),
            IpAddr::V4(header.destination_addr()),
        ),
        InternetSlice::Ipv6(header, _) => (
            IpAddr::V6(header.source_addr()),
            IpAddr::V6(header.destination_addr()),
        ),
    };

    let (protocol, src_port, dst_port) = match sliced.transport {
        Some(TransportSlice::Tcp(tcp)) => (Protocol::Tcp, tcp.source_port(), tcp.destination_port()),
        Some(TransportSlice::Udp(udp)) => (Protocol::Udp, udp.source_port(), udp.destination_port()),
        _ => (Protocol::Other, 0, 0),
    };

    Some(TrafficEvent {
        protocol,
        src_addr,
        dst_addr,
        src_port,
        dst_port,
        bytes: data.len() as u32,
        observed_at,
        latency_ms: None,
    })
}
