//! Catalog of the mower telemetry streams.
//!
//! Each stream is served under a common subscribe prefix and carries a single
//! payload schema. `TelemetryPayload` is the uniform value type the
//! subscription layer stores, so one manager can own every stream.

use crate::decode::decode_object;
use crate::error::{DecodeError, DecodeResult};
use crate::types::{Gps, HighLevelStatus, Imu, Status, WheelTick};
use serde::{Deserialize, Serialize};

/// Default path prefix of the push endpoints.
pub const DEFAULT_SUBSCRIBE_PATH: &str = "/api/openmower/subscribe";

/// Known telemetry streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MowerChannel {
    Status,
    Imu,
    Gps,
    WheelTicks,
    HighLevelStatus,
}

impl MowerChannel {
    /// All streams, in dashboard order.
    pub const ALL: [MowerChannel; 5] = [
        Self::Status,
        Self::Imu,
        Self::Gps,
        Self::WheelTicks,
        Self::HighLevelStatus,
    ];

    /// Channel name; also the last path segment of the endpoint.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Imu => "imu",
            Self::Gps => "gps",
            Self::WheelTicks => "ticks",
            Self::HighLevelStatus => "highLevelStatus",
        }
    }

    /// Operator facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Status => "Status",
            Self::Imu => "IMU",
            Self::Gps => "GPS",
            Self::WheelTicks => "Wheel Ticks",
            Self::HighLevelStatus => "High Level Status",
        }
    }

    /// Look up a channel by its name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Endpoint path under the given subscribe prefix.
    pub fn endpoint(&self, subscribe_path: &str) -> String {
        format!("{}/{}", subscribe_path.trim_end_matches('/'), self.name())
    }

    /// Decode one raw message of this stream.
    pub fn decode(&self, raw: &str) -> DecodeResult<TelemetryPayload> {
        Ok(match self {
            Self::Status => TelemetryPayload::Status(decode_object(raw)?),
            Self::Imu => TelemetryPayload::Imu(decode_object(raw)?),
            Self::Gps => TelemetryPayload::Gps(decode_object(raw)?),
            Self::WheelTicks => TelemetryPayload::WheelTicks(decode_object(raw)?),
            Self::HighLevelStatus => TelemetryPayload::HighLevelStatus(decode_object(raw)?),
        })
    }
}

impl std::fmt::Display for MowerChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for MowerChannel {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| DecodeError::UnknownChannel(s.to_string()))
    }
}

/// Decoded value of any telemetry stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelemetryPayload {
    Status(Status),
    Imu(Imu),
    Gps(Gps),
    WheelTicks(WheelTick),
    HighLevelStatus(HighLevelStatus),
}

impl TelemetryPayload {
    /// The stream this payload belongs to.
    pub fn channel(&self) -> MowerChannel {
        match self {
            Self::Status(_) => MowerChannel::Status,
            Self::Imu(_) => MowerChannel::Imu,
            Self::Gps(_) => MowerChannel::Gps,
            Self::WheelTicks(_) => MowerChannel::WheelTicks,
            Self::HighLevelStatus(_) => MowerChannel::HighLevelStatus,
        }
    }
}
