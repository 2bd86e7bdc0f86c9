//! Netpulse math utilities.

pub mod scaler;
pub mod stats;

pub use scaler::StandardScaler;
pub use stats::{mean, quantile};
