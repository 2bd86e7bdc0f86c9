//! Ingestion queue between the capture producer and the stats consumer.
//!
//! A thin typed wrapper around `std::sync::mpsc`: single producer, single
//! consumer, FIFO, unbounded. There is deliberately no capacity bound or
//! drop policy — the pipeline has no flow control, so under sustained
//! overload the queue grows; a documented limitation, not a bug.

use np_common::TrafficEvent;
use std::sync::mpsc;
use std::time::Duration;

/// Producer half of the ingestion queue.
pub struct EventSender(mpsc::Sender<TrafficEvent>);

/// Consumer half of the ingestion queue.
pub struct EventReceiver(mpsc::Receiver<TrafficEvent>);

/// Outcome of a bounded-wait pop.
#[derive(Debug)]
pub enum PopResult {
    /// An event arrived within the timeout.
    Event(TrafficEvent),
    /// Nothing arrived; the caller should re-check the stop signal.
    Empty,
    /// The producer hung up and the queue is drained.
    Closed,
}

/// Create a connected sender/receiver pair.
pub fn channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel();
    (EventSender(tx), EventReceiver(rx))
}

impl EventSender {
    /// Enqueue an event. Returns false when the consumer is gone, which
    /// tells the producer to wind down.
    pub fn send(&self, event: TrafficEvent) -> bool {
        self.0.send(event).is_ok()
    }
}

impl EventReceiver {
    /// Pop with a bounded wait so the consumer can periodically re-check
    /// the shared stop signal even when no events arrive.
    pub fn pop(&self, timeout: Duration) -> PopResult {
        match self.0.recv_timeout(timeout) {
            Ok(event) => PopResult::Event(event),
            Err(mpsc::RecvTimeoutError::Timeout) => PopResult::Empty,
            Err(mpsc::RecvTimeoutError::Disconnected) => PopResult::Closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use np_common::Protocol;
    use std::net::{IpAddr, Ipv4Addr};

    fn event(src_port: u16) -> TrafficEvent {
        TrafficEvent {
            protocol: Protocol::Tcp,
            src_addr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
            dst_addr: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)),
            src_port,
            dst_port: 443,
            bytes: 600,
            observed_at: Utc::now(),
            latency_ms: None,
        }
    }

    #[test]
    fn test_fifo_order_preserved() {
        let (tx, rx) = channel();
        for port in 1..=5 {
            assert!(tx.send(event(port)));
        }
        for port in 1..=5 {
            match rx.pop(Duration::from_millis(50)) {
                PopResult::Event(ev) => assert_eq!(ev.src_port, port),
                other => panic!("expected event, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_empty_pop_times_out() {
        let (_tx, rx) = channel();
        assert!(matches!(
            rx.pop(Duration::from_millis(10)),
            PopResult::Empty
        ));
    }

    #[test]
    fn test_closed_after_producer_drops_and_drains() {
        let (tx, rx) = channel();
        assert!(tx.send(event(9)));
        drop(tx);
        // Buffered events drain before the hangup is reported.
        assert!(matches!(
            rx.pop(Duration::from_millis(10)),
            PopResult::Event(_)
        ));
        assert!(matches!(
            rx.pop(Duration::from_millis(10)),
            PopResult::Closed
        ));
    }

    #[test]
    fn test_send_fails_without_consumer() {
        let (tx, rx) = channel();
        drop(rx);
        assert!(!tx.send(event(1)));
    }
}
