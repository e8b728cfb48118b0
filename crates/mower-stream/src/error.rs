//! Stream error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Stream read failed: {0}")]
    ReadFailed(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

pub type StreamResult<T> = Result<T, StreamError>;
