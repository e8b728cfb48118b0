//! Telemetry payload schemas.
//!
//! One struct per push stream, mirroring the JSON the mower backend emits
//! (PascalCase keys). Every field is optional: a message that omits a field
//! yields `None` for it, and nothing is carried over from earlier messages.

use serde::{Deserialize, Serialize};

/// `MowerStatus` value reported while the mower controller is powered.
pub const MOWER_STATUS_ON: u8 = 255;

/// 3D point (metres).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Point {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

/// Orientation quaternion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Quaternion {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub w: Option<f64>,
}

/// Free vector (velocities, accelerations, motion).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vector3 {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Pose {
    pub position: Option<Point>,
    pub orientation: Option<Quaternion>,
}

/// Pose with its row-major 6x6 covariance matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PoseWithCovariance {
    pub pose: Option<Pose>,
    pub covariance: Option<Vec<f64>>,
}

/// Motor controller (ESC) status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EscStatus {
    pub status: Option<String>,
    pub current: Option<f64>,
    pub tacho: Option<f64>,
    pub temperature_motor: Option<f64>,
    pub temperature_pcb: Option<f64>,
}

/// Low-level board status (`status` stream).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Status {
    pub mower_status: Option<u8>,
    pub raspberry_pi_power: Option<bool>,
    pub gps_power: Option<bool>,
    pub esc_power: Option<bool>,
    pub rain_detected: Option<bool>,
    pub sound_module_available: Option<bool>,
    pub sound_module_busy: Option<bool>,
    pub ui_board_available: Option<bool>,
    pub ultrasonic_ranges: Option<[f64; 5]>,
    pub emergency: Option<bool>,
    pub v_charge: Option<f64>,
    pub v_battery: Option<f64>,
    pub charge_current: Option<f64>,
    pub left_esc_status: Option<EscStatus>,
    pub right_esc_status: Option<EscStatus>,
    pub mow_esc_status: Option<EscStatus>,
}

impl Status {
    /// Whether the mower controller reports itself powered.
    pub fn is_mower_on(&self) -> bool {
        self.mower_status == Some(MOWER_STATUS_ON)
    }
}

/// Inertial measurement (`imu` stream).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Imu {
    pub orientation: Option<Quaternion>,
    pub orientation_covariance: Option<Vec<f64>>,
    pub angular_velocity: Option<Vector3>,
    pub angular_velocity_covariance: Option<Vec<f64>>,
    pub linear_acceleration: Option<Vector3>,
    pub linear_acceleration_covariance: Option<Vec<f64>>,
}

/// Absolute pose from the GPS receiver (`gps` stream).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Gps {
    pub sensor_stamp: Option<u32>,
    pub received_stamp: Option<u32>,
    pub source: Option<u8>,
    pub flags: Option<u16>,
    pub orientation_valid: Option<u8>,
    pub motion_vector_valid: Option<u8>,
    pub position_accuracy: Option<f64>,
    pub orientation_accuracy: Option<f64>,
    pub pose: Option<PoseWithCovariance>,
    pub motion_vector: Option<Vector3>,
    pub vehicle_heading: Option<f64>,
    pub motion_heading: Option<f64>,
}

impl Gps {
    /// Position of the pose, if every level of nesting is present.
    pub fn position(&self) -> Option<&Point> {
        self.pose.as_ref()?.pose.as_ref()?.position.as_ref()
    }
}

/// Wheel odometry counters (`ticks` stream).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WheelTick {
    pub wheel_tick_factor: Option<u32>,
    pub valid_wheels: Option<u8>,
    pub wheel_direction_fl: Option<u8>,
    pub wheel_ticks_fl: Option<u32>,
    pub wheel_direction_fr: Option<u8>,
    pub wheel_ticks_fr: Option<u32>,
    pub wheel_direction_rl: Option<u8>,
    pub wheel_ticks_rl: Option<u32>,
    pub wheel_direction_rr: Option<u8>,
    pub wheel_ticks_rr: Option<u32>,
}

/// State machine summary (`highLevelStatus` stream).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HighLevelStatus {
    pub state: Option<u8>,
    pub state_name: Option<String>,
    pub sub_state_name: Option<String>,
    /// Fraction in `0.0..=1.0`.
    pub gps_quality_percent: Option<f64>,
    /// Fraction in `0.0..=1.0`.
    pub battery_percent: Option<f64>,
    pub is_charging: Option<bool>,
    pub emergency: Option<bool>,
}

impl HighLevelStatus {
    /// Decoded state name.
    pub fn mower_state(&self) -> MowerState {
        self.state_name
            .as_deref()
            .map(MowerState::from_name)
            .unwrap_or(MowerState::Unknown)
    }

    /// Battery level in percent (missing reads as 0).
    pub fn battery_level_percent(&self) -> f64 {
        self.battery_percent.unwrap_or(0.0) * 100.0
    }

    /// GPS fix quality in percent (missing reads as 0).
    pub fn gps_quality_level_percent(&self) -> f64 {
        self.gps_quality_percent.unwrap_or(0.0) * 100.0
    }
}

/// High level mower state as reported in `StateName`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MowerState {
    Idle,
    Mowing,
    Docking,
    Undocking,
    AreaRecording,
    Unknown,
}

impl MowerState {
    /// Map a raw `StateName`; anything unrecognised is `Unknown`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "IDLE" => Self::Idle,
            "MOWING" => Self::Mowing,
            "DOCKING" => Self::Docking,
            "UNDOCKING" => Self::Undocking,
            "AREA_RECORDING" => Self::AreaRecording,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for MowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Mowing => write!(f, "Mowing"),
            Self::Docking => write!(f, "Docking"),
            Self::Undocking => write!(f, "Undocking"),
            Self::AreaRecording => write!(f, "Area Recording"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}
