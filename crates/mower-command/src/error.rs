//! Command error types.
//!
//! These cover setting up the dispatcher. The result of sending a command is
//! a `CommandOutcome`, never an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Invalid action name: {0:?}")]
    InvalidAction(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type CommandResult<T> = Result<T, CommandError>;
