//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Stream error: {0}")]
    Stream(#[from] mower_stream::StreamError),

    #[error("Command error: {0}")]
    Command(#[from] mower_command::CommandError),

    #[error("Monitoring error: {0}")]
    Monitoring(#[from] mower_monitoring::MonitoringError),
}

pub type AppResult<T> = Result<T, AppError>;
