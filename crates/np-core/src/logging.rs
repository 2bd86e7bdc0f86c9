//! Structured logging bootstrap.
//!
//! Dual-mode output on stderr: human-readable console format for
//! interactive use, JSONL for daemonized deployments. Filtering honors
//! `NP_LOG` (then `RUST_LOG`) before falling back to the configured level.

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// Machine-parseable JSON lines.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "console" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" | "structured" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default level filter when no env override is present.
    pub level: tracing::Level,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: tracing::Level::INFO,
            format: LogFormat::Human,
        }
    }
}

impl LogConfig {
    /// Resolve format from `NP_LOG_FORMAT`, keeping the configured level.
    pub fn from_env() -> Self {
        let mut config = LogConfig::default();
        if let Ok(raw) = std::env::var("NP_LOG_FORMAT") {
            if let Ok(format) = raw.parse() {
                config.format = format;
            }
        }
        config
    }
}

/// Initialize the logging subsystem.
///
/// Safe to call more than once; only the first call installs a subscriber
/// (later calls are ignored, which keeps test binaries happy).
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_env("NP_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(format!("np_core={}", config.level)));

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init();
        }
        LogFormat::Jsonl => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false);
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init();
        }
    }
}
