//! HTTP command dispatcher.
//!
//! `POST {base_url}{call_path}/{action}` with the arguments as a JSON object.
//! The response decides the outcome:
//! - no response at all: failure with the transport error
//! - a body with a truthy `error` field: failure with that message verbatim
//! - any other non-2xx: failure `HTTP <status>`, plus the body when present
//! - otherwise: success

use crate::error::{CommandError, CommandResult};
use crate::request::{is_valid_action, CommandArgs, CommandOutcome, CommandRequest};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default path prefix of the control endpoint.
pub const DEFAULT_CALL_PATH: &str = "/api/openmower/call";

/// Dispatcher configuration.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub base_url: String,
    pub call_path: String,
    /// Total request timeout.
    pub timeout_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4006".to_string(),
            call_path: DEFAULT_CALL_PATH.to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Sends commands to the control endpoint. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    client: Client,
    call_url: String,
}

impl CommandDispatcher {
    /// Create a new dispatcher.
    pub fn new(config: DispatcherConfig) -> CommandResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| CommandError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        let call_url = format!(
            "{}/{}",
            config.base_url.trim_end_matches('/'),
            config.call_path.trim_matches('/')
        );

        Ok(Self { client, call_url })
    }

    /// Full URL an action is posted to.
    pub fn url_for(&self, action: &str) -> String {
        format!("{}/{}", self.call_url, action)
    }

    /// Send `action` with `args`.
    pub async fn dispatch(&self, action: &str, args: CommandArgs) -> CommandOutcome {
        self.send(&CommandRequest::new(action).with_args(args)).await
    }

    /// Send a prepared request. Exactly one HTTP call, never retried.
    pub async fn send(&self, request: &CommandRequest) -> CommandOutcome {
        if !is_valid_action(&request.action) {
            warn!(action = %request.action, "Rejected command with invalid action name");
            let err = CommandError::InvalidAction(request.action.clone());
            return CommandOutcome::failure(err.to_string());
        }

        let url = self.url_for(&request.action);
        info!(action = %request.action, url = %url, "Sending command");

        let response = match self
            .client
            .post(&url)
            .json(&request.arguments)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(action = %request.action, error = %e, "Command request failed");
                return CommandOutcome::failure(format!("HTTP request failed: {e}"));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(action = %request.action, error = %e, "Failed to read command response");
                return CommandOutcome::failure(format!("Failed to read response: {e}"));
            }
        };
        debug!(action = %request.action, status = status.as_u16(), body = %body, "Command response");

        let outcome = outcome_from_response(status.as_u16(), status.is_success(), &body);
        match &outcome {
            CommandOutcome::Success => info!(action = %request.action, "Command accepted"),
            CommandOutcome::Failure { message } => {
                warn!(action = %request.action, status = status.as_u16(), message = %message, "Command rejected")
            }
        }
        outcome
    }
}

/// Classify a received response.
fn outcome_from_response(status: u16, is_success: bool, body: &str) -> CommandOutcome {
    if let Some(message) = error_field(body) {
        return CommandOutcome::failure(message);
    }
    if !is_success {
        let body = body.trim();
        return if body.is_empty() {
            CommandOutcome::failure(format!("HTTP {status}"))
        } else {
            CommandOutcome::failure(format!("HTTP {status}: {body}"))
        };
    }
    CommandOutcome::Success
}

/// Message of a truthy `error` field in a JSON object body.
///
/// Strings are taken verbatim; other values are rendered as JSON text.
/// `null`, `false` and `""` do not count as errors.
fn error_field(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_joins_segments() {
        let dispatcher = CommandDispatcher::new(DispatcherConfig {
            base_url: "http://mower.local:4006/".to_string(),
            call_path: "/api/openmower/call/".to_string(),
            timeout_ms: 1000,
        })
        .unwrap();
        assert_eq!(
            dispatcher.url_for("mower_start"),
            "http://mower.local:4006/api/openmower/call/mower_start"
        );
    }

    #[test]
    fn test_error_field_string_is_verbatim() {
        assert_eq!(
            outcome_from_response(500, false, r#"{"error":"device offline"}"#),
            CommandOutcome::failure("device offline")
        );
        // error field wins even on 2xx
        assert_eq!(
            outcome_from_response(200, true, r#"{"error":"device offline"}"#),
            CommandOutcome::failure("device offline")
        );
    }

    #[test]
    fn test_error_field_non_string_rendered_as_json() {
        assert_eq!(
            outcome_from_response(200, true, r#"{"error":{"code":3}}"#),
            CommandOutcome::failure(r#"{"code":3}"#)
        );
        assert_eq!(
            outcome_from_response(200, true, r#"{"error":true}"#),
            CommandOutcome::failure("true")
        );
    }

    #[test]
    fn test_falsy_error_field_is_success() {
        for body in [r#"{"error":null}"#, r#"{"error":false}"#, r#"{"error":""}"#] {
            assert_eq!(outcome_from_response(200, true, body), CommandOutcome::Success);
        }
    }

    #[test]
    fn test_non_success_status_without_error_field() {
        assert_eq!(
            outcome_from_response(502, false, ""),
            CommandOutcome::failure("HTTP 502")
        );
        assert_eq!(
            outcome_from_response(404, false, "no such action\n"),
            CommandOutcome::failure("HTTP 404: no such action")
        );
    }

    #[test]
    fn test_success_bodies() {
        assert_eq!(outcome_from_response(200, true, ""), CommandOutcome::Success);
        assert_eq!(outcome_from_response(200, true, "{}"), CommandOutcome::Success);
        assert_eq!(outcome_from_response(204, true, "ok"), CommandOutcome::Success);
        assert_eq!(
            outcome_from_response(200, true, "[1,2]"),
            CommandOutcome::Success
        );
    }
}
