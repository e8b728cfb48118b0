//! Prometheus metrics for the mower dashboard.
//!
//! Covers:
//! - Channel connection state per telemetry stream
//! - Message and decode error counts
//! - Disconnects by reason
//! - Command outcomes and latency
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. A failure means a duplicate metric
//! name, which is a programming error and only surfaces during static
//! initialization.

use crate::error::{MonitoringError, MonitoringResult};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, CounterVec, Encoder,
    GaugeVec, HistogramVec, TextEncoder,
};

/// Channel states exported as a one-hot gauge.
const CHANNEL_STATES: [&str; 5] = ["idle", "connecting", "open", "closed", "errored"];

/// Channel open (1) or not (0).
pub static CHANNEL_CONNECTED: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "mower_channel_connected",
        "Telemetry channel connection state (1=open)",
        &["channel"]
    )
    .unwrap()
});

/// Current lifecycle state of each channel.
pub static CHANNEL_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "mower_channel_state",
        "Telemetry channel lifecycle state (1=active, 0=inactive)",
        &["channel", "state"]
    )
    .unwrap()
});

pub static MESSAGES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mower_messages_total",
        "Telemetry messages decoded successfully",
        &["channel"]
    )
    .unwrap()
});

pub static DECODE_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mower_decode_errors_total",
        "Telemetry messages that failed to decode",
        &["channel"]
    )
    .unwrap()
});

/// Labels: reason (stopped/remote_closed/failed)
pub static DISCONNECTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mower_disconnects_total",
        "Telemetry channel disconnects",
        &["channel", "reason"]
    )
    .unwrap()
});

/// Labels: outcome (success/failure)
pub static COMMANDS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "mower_commands_total",
        "Commands dispatched to the control endpoint",
        &["action", "outcome"]
    )
    .unwrap()
});

pub static COMMAND_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "mower_command_latency_ms",
        "Command round trip in milliseconds",
        &["action"],
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 10000.0]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record a channel reaching Open.
    pub fn channel_connected(channel: &str) {
        CHANNEL_CONNECTED.with_label_values(&[channel]).set(1.0);
    }

    /// Record a channel leaving Open.
    pub fn channel_disconnected(channel: &str, reason: &str) {
        CHANNEL_CONNECTED.with_label_values(&[channel]).set(0.0);
        DISCONNECTS_TOTAL
            .with_label_values(&[channel, reason])
            .inc();
    }

    /// Set the lifecycle state of a channel.
    /// Only the active state is 1, all others 0.
    pub fn channel_state_set(channel: &str, state: &str) {
        for s in CHANNEL_STATES {
            CHANNEL_STATE
                .with_label_values(&[channel, s])
                .set(if s == state { 1.0 } else { 0.0 });
        }
    }

    pub fn message_received(channel: &str) {
        MESSAGES_TOTAL.with_label_values(&[channel]).inc();
    }

    pub fn decode_failed(channel: &str) {
        DECODE_ERRORS_TOTAL.with_label_values(&[channel]).inc();
    }

    /// Record a command outcome and its round trip.
    pub fn command_sent(action: &str, outcome: &str, latency_ms: f64) {
        COMMANDS_TOTAL
            .with_label_values(&[action, outcome])
            .inc();
        COMMAND_LATENCY_MS
            .with_label_values(&[action])
            .observe(latency_ms);
    }

    /// Encode the default registry in the Prometheus text format.
    pub fn render() -> MonitoringResult<String> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&prometheus::gather(), &mut buf)
            .map_err(|e| MonitoringError::Metrics(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| MonitoringError::Metrics(e.to_string()))
    }
}
