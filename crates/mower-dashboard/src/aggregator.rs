//! Telemetry aggregator.
//!
//! Owns the subscription manager for the dashboard session, keeps the
//! telemetry snapshot current, and forwards operator commands to the
//! dispatcher. Lifecycle:
//!
//! ```text
//! attach(descriptors) -> run_until(shutdown) / process_next()* -> detach()
//! ```
//!
//! `detach` runs once per session; dropping an attached aggregator detaches it.

use crate::notify::{Notification, Notifier};
use crate::snapshot::{SnapshotHandle, TelemetrySnapshot};
use mower_command::{CommandDispatcher, CommandOutcome, CommandRequest};
use mower_core::{MowerChannel, TelemetryPayload};
use mower_monitoring::Metrics;
use mower_stream::{
    ChannelDescriptor, ChannelError, ChannelEvent, ChannelHandlers, ConnectionState,
    SubscriptionManager, Transport, DEFAULT_EVENT_BUFFER,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Descriptor of a catalog stream under `subscribe_path`.
pub fn channel_descriptor(
    channel: MowerChannel,
    subscribe_path: &str,
) -> ChannelDescriptor<TelemetryPayload> {
    ChannelDescriptor::new(
        channel.name(),
        channel.endpoint(subscribe_path),
        move |raw: &str| channel.decode(raw),
    )
}

/// Descriptors for several catalog streams.
pub fn channel_descriptors(
    channels: &[MowerChannel],
    subscribe_path: &str,
) -> Vec<ChannelDescriptor<TelemetryPayload>> {
    channels
        .iter()
        .map(|c| channel_descriptor(*c, subscribe_path))
        .collect()
}

/// Operator facing name of a channel.
fn label_for(name: &str) -> String {
    MowerChannel::from_name(name)
        .map(|c| c.label().to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Aggregates the telemetry streams of one dashboard session.
pub struct TelemetryAggregator {
    manager: SubscriptionManager<TelemetryPayload>,
    snapshot: SnapshotHandle,
    dispatcher: CommandDispatcher,
    notifier: Arc<dyn Notifier>,
    attached: bool,
    snapshot_log_interval: Option<Duration>,
}

impl TelemetryAggregator {
    pub fn new(
        transport: Arc<dyn Transport>,
        dispatcher: CommandDispatcher,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_event_buffer(transport, dispatcher, notifier, DEFAULT_EVENT_BUFFER)
    }

    pub fn with_event_buffer(
        transport: Arc<dyn Transport>,
        dispatcher: CommandDispatcher,
        notifier: Arc<dyn Notifier>,
        event_buffer: usize,
    ) -> Self {
        Self {
            manager: SubscriptionManager::with_event_buffer(transport, event_buffer),
            snapshot: SnapshotHandle::new(),
            dispatcher,
            notifier,
            attached: false,
            snapshot_log_interval: None,
        }
    }

    /// Log a snapshot summary at this interval while `run_until` runs.
    pub fn with_snapshot_log_interval(mut self, interval: Duration) -> Self {
        self.snapshot_log_interval = (!interval.is_zero()).then_some(interval);
        self
    }

    /// Start every listed channel. Returns immediately; connection progress
    /// is applied by `process_next`/`run_until`.
    ///
    /// A fresh session starts with an empty snapshot. A channel that is
    /// (re)started also loses its previous value; channels already
    /// Connecting or Open keep theirs.
    ///
    /// Must be called within a tokio runtime.
    pub fn attach(&mut self, descriptors: Vec<ChannelDescriptor<TelemetryPayload>>) {
        info!(channels = descriptors.len(), "Attaching telemetry streams");
        if !self.attached {
            self.snapshot.reset();
        }
        self.attached = true;

        for descriptor in descriptors {
            let name = descriptor.name().to_string();
            let restarting = !self
                .manager
                .state(&name)
                .is_some_and(|state| state.is_active());
            let handlers = self.handlers_for(&name);
            let handle = self.manager.start(descriptor, handlers);
            if restarting {
                self.snapshot.forget(&name);
            }
            if let Some(state) = self.manager.state(&name) {
                Metrics::channel_state_set(&name, &state.to_string());
            }
            debug!(channel = %name, handle = %handle, restarting, "Stream attached");
        }
    }

    fn handlers_for(&self, name: &str) -> ChannelHandlers<TelemetryPayload> {
        let label = label_for(name);
        let on_connect = self.notifier.clone();
        let on_disconnect = self.notifier.clone();
        let connected_label = label.clone();
        let snapshot = self.snapshot.clone();

        ChannelHandlers::<TelemetryPayload>::new()
            .on_connected(move |channel| {
                Metrics::channel_connected(channel);
                on_connect.notify(Notification::info(format!(
                    "{connected_label} Stream connected"
                )));
            })
            .on_message(move |channel, payload: &TelemetryPayload| {
                snapshot.record(channel, payload.clone());
            })
            .on_disconnected(move |channel, reason| {
                Metrics::channel_disconnected(channel, reason.as_str());
                on_disconnect.notify(Notification::info(format!("{label} Stream closed")));
            })
    }

    /// Stop every channel. Only the first call after `attach` does anything.
    pub fn detach(&mut self) -> usize {
        if !self.attached {
            return 0;
        }
        self.attached = false;

        let names = self.manager.channel_names();
        let stopped = self.manager.stop_all();
        for name in &names {
            Metrics::channel_state_set(name, "closed");
        }
        info!(stopped, "Telemetry streams detached");
        stopped
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Clone of the current snapshot. Empty until the first message.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.snapshot.read()
    }

    /// Read-only view for presentation code.
    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.snapshot.clone()
    }

    pub fn channel_state(&self, name: &str) -> Option<ConnectionState> {
        self.manager.state(name)
    }

    pub fn channel_error(&self, name: &str) -> Option<&ChannelError> {
        self.manager.last_error(name)
    }

    pub fn live_handles(&self) -> usize {
        self.manager.live_handles()
    }

    /// Dispatcher for sending commands from other tasks.
    pub fn command_handle(&self) -> CommandDispatcher {
        self.dispatcher.clone()
    }

    /// Send one command and notify its outcome.
    pub async fn dispatch(&self, request: &CommandRequest) -> CommandOutcome {
        send_and_notify(&self.dispatcher, self.notifier.as_ref(), request).await
    }

    /// Wait for and apply the next channel event.
    pub async fn process_next(&mut self) -> ChannelEvent {
        let event = self.manager.next_event().await;
        record_event(self.notifier.as_ref(), &event);
        event
    }

    /// Apply every queued channel event without waiting.
    pub fn drain_pending(&mut self) -> usize {
        let events = self.manager.drain_pending();
        for event in &events {
            record_event(self.notifier.as_ref(), event);
        }
        events.len()
    }

    /// Process channel events until `shutdown` fires, then detach.
    pub async fn run_until(&mut self, shutdown: CancellationToken) {
        let mut summary_tick = self.snapshot_log_interval.map(|interval| {
            let mut tick = tokio::time::interval(interval);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tick
        });

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break;
                }
                event = self.manager.next_event() => {
                    record_event(self.notifier.as_ref(), &event);
                }
                _ = async {
                    match summary_tick.as_mut() {
                        Some(tick) => tick.tick().await,
                        None => std::future::pending().await,
                    }
                } => {
                    let snapshot = self.snapshot.read();
                    info!(channels = snapshot.len(), summary = %snapshot.summary(), "Telemetry snapshot");
                }
            }
        }

        self.detach();
    }
}

impl Drop for TelemetryAggregator {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Metrics for an applied channel event.
///
/// A stream that fails before opening gets an error notification here; once
/// open, the disconnect handler reports the loss.
fn record_event(notifier: &dyn Notifier, event: &ChannelEvent) {
    match event {
        ChannelEvent::Connected { channel } => Metrics::channel_state_set(channel, "open"),
        ChannelEvent::Message { channel } => Metrics::message_received(channel),
        ChannelEvent::DecodeFailed { channel, .. } => Metrics::decode_failed(channel),
        ChannelEvent::Lost {
            channel,
            error,
            was_open,
        } => {
            Metrics::channel_state_set(channel, "errored");
            if !was_open {
                notifier.notify(Notification::error(
                    format!("{} Stream failed", label_for(channel)),
                    error.to_string(),
                ));
            }
        }
    }
}

/// Send `request`, record metrics and emit exactly one notification.
pub async fn send_and_notify(
    dispatcher: &CommandDispatcher,
    notifier: &dyn Notifier,
    request: &CommandRequest,
) -> CommandOutcome {
    let started = Instant::now();
    let outcome = dispatcher.send(request).await;
    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

    Metrics::command_sent(&request.action, outcome.as_str(), latency_ms);
    match &outcome {
        CommandOutcome::Success => notifier.notify(Notification::success("Command sent")),
        CommandOutcome::Failure { message } => notifier.notify(Notification::error(
            "Unable to send command",
            message.clone(),
        )),
    }
    outcome
}
