//! Live telemetry dashboard and command console for OpenMower robots.
//!
//! Ties the stream, command and monitoring crates together:
//! - `TelemetryAggregator`: one dashboard session over every telemetry stream
//! - `TelemetrySnapshot`: latest value per stream, readable at any time
//! - `MowerAction`: operator presets for the control endpoint
//! - `AppConfig`: file and environment configuration

pub mod actions;
pub mod aggregator;
pub mod config;
pub mod error;
pub mod notify;
pub mod snapshot;

pub use actions::MowerAction;
pub use aggregator::{channel_descriptor, channel_descriptors, send_and_notify, TelemetryAggregator};
pub use config::{AppConfig, CommandConfig, StreamConfig};
pub use error::{AppError, AppResult};
pub use notify::{Notification, NotificationLevel, Notifier, TracingNotifier};
pub use snapshot::{SnapshotEntry, SnapshotHandle, TelemetrySnapshot};
