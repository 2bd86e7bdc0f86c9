//! Monitor configuration and validation.
//!
//! Configuration is plain data with semantic validation at construction
//! time. Malformed configuration is the only fatal startup class; every
//! runtime fault after a successful `validate()` degrades instead of
//! propagating.

use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default latency reservoir capacity (samples).
pub const DEFAULT_RESERVOIR_CAPACITY: usize = 1000;

/// Default size of the top-N lists in a snapshot.
pub const DEFAULT_TOP_N: usize = 5;

/// Default expected fraction of training data treated as outliers.
pub const DEFAULT_CONTAMINATION: f64 = 0.05;

/// Default bounded wait for the consumer's queue pop.
pub const DEFAULT_QUEUE_POP_TIMEOUT: Duration = Duration::from_secs(1);

/// Default bound on joining collection tasks at shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised by semantic configuration validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("latency reservoir capacity must be at least 1")]
    ZeroReservoirCapacity,

    #[error("top-N size must be at least 1")]
    ZeroTopN,

    #[error("contamination rate must be in (0, 0.5], got {value}")]
    InvalidContamination { value: f64 },

    #[error("local IP range list must not be empty")]
    EmptyLocalRanges,

    #[error("queue pop timeout must be non-zero")]
    ZeroQueueTimeout,

    #[error("shutdown timeout must be non-zero")]
    ZeroShutdownTimeout,
}

/// Which interface a live capture should attach to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceSelector {
    /// Capture on the platform's default device.
    #[default]
    All,
    /// Capture on a named interface (e.g. "eth0").
    Name(String),
}

impl std::fmt::Display for InterfaceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterfaceSelector::All => write!(f, "all"),
            InterfaceSelector::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Configuration for a monitoring session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Attempt live packet capture before falling back to synthetic data.
    pub capture_enabled: bool,
    /// Degrade to the synthetic generator when live capture fails mid-run.
    pub synthetic_fallback: bool,
    /// Interface selector for live capture.
    pub interface: InterfaceSelector,
    /// Address prefixes considered inside the monitored network. A
    /// destination inside any prefix counts as incoming traffic.
    pub local_ranges: Vec<IpNet>,
    /// Capacity of the latency sample reservoir.
    pub latency_reservoir_capacity: usize,
    /// Size of the top-N IP and port lists in snapshots.
    pub top_n: usize,
    /// Expected fraction of training data flagged anomalous.
    pub contamination: f64,
    /// Bounded wait for the consumer's queue pop.
    pub queue_pop_timeout: Duration,
    /// Bound on joining collection tasks at shutdown.
    pub shutdown_timeout: Duration,
    /// Directory for persisted anomaly model artifacts. `None` keeps the
    /// trained pair in memory only.
    pub model_dir: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            capture_enabled: true,
            synthetic_fallback: true,
            interface: InterfaceSelector::All,
            local_ranges: default_local_ranges(),
            latency_reservoir_capacity: DEFAULT_RESERVOIR_CAPACITY,
            top_n: DEFAULT_TOP_N,
            contamination: DEFAULT_CONTAMINATION,
            queue_pop_timeout: DEFAULT_QUEUE_POP_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            model_dir: None,
        }
    }
}

impl MonitorConfig {
    /// Validate semantic constraints.
    ///
    /// Shape/type errors are caught by serde at parse time; this checks the
    /// constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.latency_reservoir_capacity == 0 {
            return Err(ConfigError::ZeroReservoirCapacity);
        }
        if self.top_n == 0 {
            return Err(ConfigError::ZeroTopN);
        }
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(ConfigError::InvalidContamination {
                value: self.contamination,
            });
        }
        if self.local_ranges.is_empty() {
            return Err(ConfigError::EmptyLocalRanges);
        }
        if self.queue_pop_timeout.is_zero() {
            return Err(ConfigError::ZeroQueueTimeout);
        }
        if self.shutdown_timeout.is_zero() {
            return Err(ConfigError::ZeroShutdownTimeout);
        }
        Ok(())
    }

    /// True when `addr` falls inside any configured local range.
    pub fn is_local(&self, addr: &std::net::IpAddr) -> bool {
        self.local_ranges.iter().any(|net| net.contains(addr))
    }
}

/// The RFC 1918 private ranges used for incoming/outgoing classification
/// when no site-specific ranges are configured.
pub fn default_local_ranges() -> Vec<IpNet> {
    ["10.0.0.0/8", "172.16.0.0/12", "192.168.0.0/16"]
        .iter()
        .map(|cidr| cidr.parse().expect("built-in CIDR literal is valid"))
        .collect()
}

/// Default location for persisted model artifacts
/// (`<platform data dir>/netpulse/models`), when the platform exposes one.
pub fn default_model_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|base| base.join("netpulse").join("models"))
}
