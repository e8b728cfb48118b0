//! Pure decoding of raw push text into typed payloads.
//!
//! Streams deliver one JSON object per event. The guard here runs before the
//! schema: serde would happily read a JSON array into a struct by position,
//! which is never what the backend means.

use crate::error::{DecodeError, DecodeResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode `raw` as a JSON object of schema `T`.
pub fn decode_object<T: DeserializeOwned>(raw: &str) -> DecodeResult<T> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    if !value.is_object() {
        return Err(DecodeError::NotAnObject(json_kind(&value)));
    }

    serde_json::from_value(value).map_err(|e| DecodeError::Schema(e.to_string()))
}

/// Human readable JSON type name, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
