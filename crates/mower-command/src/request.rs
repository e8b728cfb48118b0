//! Command request and outcome types.

use crate::error::{CommandError, CommandResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scalar argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl std::str::FromStr for ArgValue {
    type Err = std::convert::Infallible;

    /// Infer the narrowest scalar: bool, then integer, then finite float,
    /// otherwise text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(b) = s.parse::<bool>() {
            return Ok(Self::Bool(b));
        }
        if let Ok(i) = s.parse::<i64>() {
            return Ok(Self::Int(i));
        }
        match s.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Self::Float(f)),
            _ => Ok(Self::Text(s.to_string())),
        }
    }
}

/// Arguments of a command. Ordered so request bodies are deterministic.
pub type CommandArgs = BTreeMap<String, ArgValue>;

/// A named action with arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandRequest {
    pub action: String,
    pub arguments: CommandArgs,
}

impl CommandRequest {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            arguments: CommandArgs::new(),
        }
    }

    /// Like `new`, but rejects names that cannot be a single path segment.
    pub fn checked(action: impl Into<String>) -> CommandResult<Self> {
        let action = action.into();
        if !is_valid_action(&action) {
            return Err(CommandError::InvalidAction(action));
        }
        Ok(Self::new(action))
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn with_args(mut self, args: CommandArgs) -> Self {
        self.arguments.extend(args);
        self
    }
}

/// Action names go into the URL path as one segment.
pub(crate) fn is_valid_action(action: &str) -> bool {
    !action.is_empty()
        && action
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Parse a `key=value` argument as given on the command line.
pub fn parse_key_value(s: &str) -> CommandResult<(String, ArgValue)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| CommandError::InvalidArgument(format!("expected key=value, got {s:?}")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CommandError::InvalidArgument(format!("empty key in {s:?}")));
    }
    let value = match value.parse::<ArgValue>() {
        Ok(v) => v,
        Err(never) => match never {},
    };
    Ok((key.to_string(), value))
}

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    Failure { message: String },
}

impl CommandOutcome {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Failure message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::Failure { message } => Some(message),
        }
    }

    /// Label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure { .. } => "failure",
        }
    }
}
