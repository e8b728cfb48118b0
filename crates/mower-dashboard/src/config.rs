//! Application configuration.
//!
//! Loaded from a TOML file, then overridden by `MOWER__`-prefixed environment
//! variables (`MOWER__BASE_URL`, `MOWER__COMMAND__TIMEOUT_MS`, ...).

use crate::error::{AppError, AppResult};
use config::{Config, Environment, File, FileFormat};
use mower_command::{DispatcherConfig, DEFAULT_CALL_PATH};
use mower_core::{MowerChannel, DEFAULT_SUBSCRIBE_PATH};
use mower_stream::{SseConfig, DEFAULT_EVENT_BUFFER};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Push stream settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Connect timeout per stream (ms). Default: 5,000.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Capacity of the shared event queue. Default: 256.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_event_buffer() -> usize {
    DEFAULT_EVENT_BUFFER
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// Control endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Path prefix actions are posted under.
    #[serde(default = "default_call_path")]
    pub call_path: String,
    /// Total request timeout (ms). Default: 10,000.
    #[serde(default = "default_command_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_call_path() -> String {
    DEFAULT_CALL_PATH.to_string()
}

fn default_command_timeout_ms() -> u64 {
    10_000
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            call_path: default_call_path(),
            timeout_ms: default_command_timeout_ms(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend base URL (e.g., "http://openmower.local:4006").
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path prefix of the push endpoints.
    #[serde(default = "default_subscribe_path")]
    pub subscribe_path: String,
    /// Streams to attach, by channel name. Default: all.
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub command: CommandConfig,
    /// How often `watch` logs a snapshot summary (ms). 0 disables.
    #[serde(default = "default_snapshot_log_interval_ms")]
    pub snapshot_log_interval_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:4006".to_string()
}

fn default_subscribe_path() -> String {
    DEFAULT_SUBSCRIBE_PATH.to_string()
}

fn default_channels() -> Vec<String> {
    MowerChannel::ALL
        .iter()
        .map(|c| c.name().to_string())
        .collect()
}

fn default_snapshot_log_interval_ms() -> u64 {
    5_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            subscribe_path: default_subscribe_path(),
            channels: default_channels(),
            stream: StreamConfig::default(),
            command: CommandConfig::default(),
            snapshot_log_interval_ms: default_snapshot_log_interval_ms(),
        }
    }
}

impl AppConfig {
    /// Load from a file plus environment overrides.
    ///
    /// A missing file is not an error: defaults and environment apply.
    pub fn load(path: &str) -> AppResult<Self> {
        if !Path::new(path).exists() {
            tracing::warn!(path = %path, "Config file not found, using defaults");
        }
        Self::build(File::new(path, FileFormat::Toml).required(false))
    }

    /// Parse TOML text plus environment overrides.
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        Self::build(File::from_str(content, FileFormat::Toml))
    }

    fn build<S>(source: S) -> AppResult<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config: Self = Config::builder()
            .add_source(source)
            .add_source(
                Environment::with_prefix("MOWER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| AppError::Config(format!("Failed to load config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot.
    pub fn validate(&self) -> AppResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.stream.event_buffer == 0 {
            return Err(AppError::Config("stream.event_buffer must be > 0".to_string()));
        }
        if self.stream.connect_timeout_ms == 0 || self.command.timeout_ms == 0 {
            return Err(AppError::Config("timeouts must be > 0".to_string()));
        }
        self.mower_channels().map(|_| ())
    }

    /// Configured channels, resolved against the catalog.
    pub fn mower_channels(&self) -> AppResult<Vec<MowerChannel>> {
        if self.channels.is_empty() {
            return Err(AppError::Config("channels must not be empty".to_string()));
        }
        let mut seen = HashSet::new();
        self.channels
            .iter()
            .map(|name| {
                let channel = MowerChannel::from_name(name)
                    .ok_or_else(|| AppError::Config(format!("Unknown channel: {name}")))?;
                if !seen.insert(channel) {
                    return Err(AppError::Config(format!("Duplicate channel: {name}")));
                }
                Ok(channel)
            })
            .collect()
    }

    pub fn sse_config(&self) -> SseConfig {
        SseConfig {
            base_url: self.base_url.clone(),
            connect_timeout_ms: self.stream.connect_timeout_ms,
        }
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            base_url: self.base_url.clone(),
            call_path: self.command.call_path.clone(),
            timeout_ms: self.command.timeout_ms,
        }
    }
}
