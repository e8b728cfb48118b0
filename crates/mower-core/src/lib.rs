//! Core domain types for the mower telemetry dashboard.
//!
//! This crate provides the pieces every other crate agrees on:
//! - Payload schemas for each telemetry stream (`Status`, `Imu`, `Gps`, ...)
//! - `MowerChannel`: the catalog of known streams and their endpoints
//! - Pure decode functions from raw push text to typed payloads

pub mod channels;
pub mod decode;
pub mod error;
pub mod types;

pub use channels::{MowerChannel, TelemetryPayload, DEFAULT_SUBSCRIBE_PATH};
pub use decode::{decode_object, json_kind};
pub use error::{DecodeError, DecodeResult};
pub use types::{
    EscStatus, Gps, HighLevelStatus, Imu, MowerState, Point, Pose, PoseWithCovariance,
    Quaternion, Status, Vector3, WheelTick, MOWER_STATUS_ON,
};
