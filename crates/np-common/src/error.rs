//! Error types for Netpulse.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for callers that retry
//!
//! The core's degradation policy lives with the components themselves
//! (capture falls back to synthetic, persistence failures are logged and
//! swallowed); the variants here exist for the paths that do surface an
//! error to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Netpulse operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration validation errors.
    Config,
    /// Capture source errors (device open, decode, runtime).
    Capture,
    /// Collection pipeline errors (task spawn, queue).
    Collection,
    /// Anomaly model errors.
    Model,
    /// History store and model artifact I/O.
    Persistence,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Capture => write!(f, "capture"),
            ErrorCategory::Collection => write!(f, "collection"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Persistence => write!(f, "persistence"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for Netpulse.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    // Capture errors (20-29)
    #[error("capture capability unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("capture failed: {0}")]
    Capture(String),

    // Collection errors (30-39)
    #[error("collection pipeline error: {0}")]
    Collection(String),

    // Model errors (40-49)
    #[error("anomaly model error: {0}")]
    Model(String),

    // Persistence errors (50-59)
    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("model artifact rejected: {0}")]
    ArtifactRejected(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the stable error code for this error type.
    ///
    /// Codes are grouped by category:
    /// - 10-19: Configuration
    /// - 20-29: Capture
    /// - 30-39: Collection
    /// - 40-49: Model
    /// - 50-59: Persistence
    /// - 60-69: I/O
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::CaptureUnavailable(_) => 20,
            Error::Capture(_) => 21,
            Error::Collection(_) => 30,
            Error::Model(_) => 40,
            Error::Persistence(_) => 50,
            Error::ArtifactRejected(_) => 51,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::Config,
            Error::CaptureUnavailable(_) | Error::Capture(_) => ErrorCategory::Capture,
            Error::Collection(_) => ErrorCategory::Collection,
            Error::Model(_) => ErrorCategory::Model,
            Error::Persistence(_) | Error::ArtifactRejected(_) => ErrorCategory::Persistence,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Config must be fixed before the monitor can start.
            Error::Config(_) => false,

            // Capture degrades to the synthetic provider.
            Error::CaptureUnavailable(_) => true,
            Error::Capture(_) => true,

            // Pipeline errors are usually transient (spawn pressure).
            Error::Collection(_) => true,

            // Model errors resolve with better training input.
            Error::Model(_) => true,

            // The core keeps operating on in-memory state.
            Error::Persistence(_) => true,
            Error::ArtifactRejected(_) => true,

            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_error_code_grouping() {
        assert_eq!(Error::Config(ConfigError::ZeroReservoirCapacity).code(), 10);
        assert_eq!(Error::CaptureUnavailable("no device".into()).code(), 20);
        assert_eq!(Error::Persistence("disk full".into()).code(), 50);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            Error::Capture("device vanished".into()).category(),
            ErrorCategory::Capture
        );
        assert_eq!(
            Error::ArtifactRejected("integrity mismatch".into()).category(),
            ErrorCategory::Persistence
        );
    }

    #[test]
    fn test_config_is_fatal() {
        assert!(!Error::Config(ConfigError::ZeroTopN).is_recoverable());
        assert!(Error::Persistence("transient".into()).is_recoverable());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Capture.to_string(), "capture");
        assert_eq!(ErrorCategory::Persistence.to_string(), "persistence");
    }
}
