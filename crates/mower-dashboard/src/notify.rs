//! Operator notifications.
//!
//! The aggregator reports stream lifecycle changes and command outcomes as
//! short notifications through an injected `Notifier`.

use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A short message with an optional description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub description: Option<String>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
            description: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
            description: None,
        }
    }

    pub fn error(message: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            description: Some(description.into()),
        }
    }
}

/// Sink for operator notifications.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        let description = n.description.as_deref().unwrap_or("");
        match n.level {
            NotificationLevel::Info | NotificationLevel::Success => {
                info!(target: "mower::notify", description, "{}", n.message)
            }
            NotificationLevel::Error => {
                error!(target: "mower::notify", description, "{}", n.message)
            }
        }
    }
}
