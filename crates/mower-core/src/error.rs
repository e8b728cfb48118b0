//! Error types for mower-core.

use thiserror::Error;

/// Failure to turn one raw push message into a typed payload.
///
/// Local to a single message: it never says anything about the health of
/// the connection that delivered it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("Malformed JSON: {0}")]
    Malformed(String),

    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Schema mismatch: {0}")]
    Schema(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),
}

/// Result type alias for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
