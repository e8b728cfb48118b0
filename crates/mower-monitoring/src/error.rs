//! Monitoring error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitoringError {
    #[error("Logging initialization failed: {0}")]
    LoggingInit(String),

    #[error("Metrics error: {0}")]
    Metrics(String),
}

pub type MonitoringResult<T> = Result<T, MonitoringError>;
