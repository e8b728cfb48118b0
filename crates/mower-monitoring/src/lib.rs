//! Prometheus metrics and structured logging for the mower dashboard.
//!
//! - Channel lifecycle and message counters per telemetry stream
//! - Command counts and latency per action
//! - Structured logging, JSON in production

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{MonitoringError, MonitoringResult};
pub use logging::init_logging;
pub use metrics::Metrics;
