//! Netpulse Core Library
//!
//! This library provides the core functionality for network monitoring:
//! - Capture providers (live pcap or synthetic generator)
//! - Single-producer/single-consumer ingestion pipeline
//! - Rolling statistics aggregation and snapshot projection
//! - Unsupervised anomaly scoring with durable model storage
//! - History stores for persisted snapshots
//!
//! HTTP/API surfaces and CLI bootstrapping live with external consumers;
//! this crate is the engine they poll.

pub mod aggregate;
pub mod analysis;
pub mod anomaly;
pub mod capture;
pub mod collector;
pub mod history;
pub mod ingest;
pub mod logging;
pub mod monitor;
pub mod snapshot;

pub use anomaly::{AnomalyScorer, TrainError};
pub use collector::NetworkCollector;
pub use history::{JsonlStore, MemoryStore, SnapshotStore};
pub use monitor::Monitor;
