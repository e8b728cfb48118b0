//! Telemetry snapshot: latest known value per channel.
//!
//! Written only by channel message handlers, one key per channel. Readers get
//! a clone through `SnapshotHandle`, so the write lock is never held by
//! presentation code.

use chrono::{DateTime, Utc};
use mower_core::{Gps, HighLevelStatus, Imu, Status, TelemetryPayload, WheelTick};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Latest value of one channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry {
    pub payload: TelemetryPayload,
    pub received_at: DateTime<Utc>,
}

/// Point-in-time view of all channels that have delivered a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    entries: BTreeMap<String, SnapshotEntry>,
}

impl TelemetrySnapshot {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, channel: &str) -> Option<&SnapshotEntry> {
        self.entries.get(channel)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &SnapshotEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn insert(&mut self, channel: &str, payload: TelemetryPayload) {
        self.entries.insert(
            channel.to_string(),
            SnapshotEntry {
                payload,
                received_at: Utc::now(),
            },
        );
    }

    pub(crate) fn remove(&mut self, channel: &str) {
        self.entries.remove(channel);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    fn payloads(&self) -> impl Iterator<Item = &TelemetryPayload> {
        self.entries.values().map(|e| &e.payload)
    }

    pub fn status(&self) -> Option<&Status> {
        self.payloads().find_map(|p| match p {
            TelemetryPayload::Status(v) => Some(v),
            _ => None,
        })
    }

    pub fn imu(&self) -> Option<&Imu> {
        self.payloads().find_map(|p| match p {
            TelemetryPayload::Imu(v) => Some(v),
            _ => None,
        })
    }

    pub fn gps(&self) -> Option<&Gps> {
        self.payloads().find_map(|p| match p {
            TelemetryPayload::Gps(v) => Some(v),
            _ => None,
        })
    }

    pub fn wheel_ticks(&self) -> Option<&WheelTick> {
        self.payloads().find_map(|p| match p {
            TelemetryPayload::WheelTicks(v) => Some(v),
            _ => None,
        })
    }

    pub fn high_level_status(&self) -> Option<&HighLevelStatus> {
        self.payloads().find_map(|p| match p {
            TelemetryPayload::HighLevelStatus(v) => Some(v),
            _ => None,
        })
    }

    /// One-line operator summary for logs.
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "no telemetry yet".to_string();
        }

        let mut parts = Vec::new();
        if let Some(hls) = self.high_level_status() {
            parts.push(format!(
                "state={} battery={:.0}% gps={:.0}%",
                hls.mower_state(),
                hls.battery_level_percent(),
                hls.gps_quality_level_percent()
            ));
            if hls.is_charging == Some(true) {
                parts.push("charging".to_string());
            }
        }
        if let Some(status) = self.status() {
            if let Some(v) = status.v_battery {
                parts.push(format!("v_battery={v:.2}V"));
            }
            if status.emergency == Some(true) {
                parts.push("EMERGENCY".to_string());
            }
        }
        if let Some(p) = self.gps().and_then(Gps::position) {
            parts.push(format!(
                "pos=({:.2}, {:.2})",
                p.x.unwrap_or_default(),
                p.y.unwrap_or_default()
            ));
        }
        if parts.is_empty() {
            parts.push(format!("{} channel(s) reporting", self.len()));
        }
        parts.join(" ")
    }
}

/// Cloneable read-only view of the live snapshot.
#[derive(Clone, Default)]
pub struct SnapshotHandle {
    inner: Arc<RwLock<TelemetrySnapshot>>,
}

impl SnapshotHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Clone of the current snapshot.
    pub fn read(&self) -> TelemetrySnapshot {
        self.inner.read().clone()
    }

    pub(crate) fn record(&self, channel: &str, payload: TelemetryPayload) {
        self.inner.write().insert(channel, payload);
    }

    /// Drop the value of a channel that is starting over.
    pub(crate) fn forget(&self, channel: &str) {
        self.inner.write().remove(channel);
    }

    /// Drop every value at the start of a session.
    pub(crate) fn reset(&self) {
        self.inner.write().clear();
    }
}
