//! Netpulse common types, IDs, and errors.
//!
//! This crate provides foundational types shared across np-core modules:
//! - Traffic event and metrics snapshot types
//! - Anomaly scoring results
//! - Snapshot identity for storage-assigned ids
//! - Common error types
//! - Monitor configuration and validation

pub mod config;
pub mod error;
pub mod event;
pub mod id;
pub mod score;
pub mod snapshot;

pub use config::{ConfigError, InterfaceSelector, MonitorConfig};
pub use error::{Error, Result};
pub use event::{Protocol, TrafficEvent};
pub use id::SnapshotId;
pub use score::AnomalyResult;
pub use snapshot::{IpCount, MetricsSnapshot, PortBytes, ProtocolSplit};
