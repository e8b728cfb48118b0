//! Subscription manager for push channels.
//!
//! Owns a set of independent channels. Each started channel gets one
//! background pump task that drives the transport and forwards raw events
//! into a single queue; the manager applies them one at a time in
//! `next_event`/`drain_pending`, so handler calls never overlap and state is
//! only ever touched by the owner.
//!
//! Guarantees:
//! - at most one live transport handle per channel
//! - `stop`/`stop_all` release handles before returning, from any state
//! - connected/disconnected are reported exactly once per open connection
//! - decode failures never replace the latest value
//! - no automatic reconnect; a lost channel stays `Errored` until `start`

use crate::channel::{
    Channel, ChannelDescriptor, ChannelError, ChannelHandlers, ConnectionState, DisconnectReason,
    HandleId, TransportHandle,
};
use crate::transport::{ConnectFuture, Transport};
use futures_util::StreamExt;
use mower_core::DecodeError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default capacity of the shared event queue.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Raw event posted by a pump task.
#[derive(Debug)]
struct PumpEvent {
    channel: String,
    handle: HandleId,
    kind: PumpEventKind,
}

#[derive(Debug)]
enum PumpEventKind {
    Opened,
    Message(String),
    Failed(String),
    Ended,
}

/// What applying one event did to the managed channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Handshake completed; the channel is Open.
    Connected { channel: String },
    /// A message decoded and replaced the latest value.
    Message { channel: String },
    /// A message failed to decode; the latest value is unchanged.
    DecodeFailed { channel: String, error: DecodeError },
    /// The connection was lost (or never established); the channel is Errored.
    Lost {
        channel: String,
        error: ChannelError,
        was_open: bool,
    },
}

impl ChannelEvent {
    pub fn channel(&self) -> &str {
        match self {
            Self::Connected { channel }
            | Self::Message { channel }
            | Self::DecodeFailed { channel, .. }
            | Self::Lost { channel, .. } => channel,
        }
    }
}

/// Channel subscription manager.
///
/// `P` is the decoded payload type shared by every managed channel.
pub struct SubscriptionManager<P> {
    transport: Arc<dyn Transport>,
    channels: HashMap<String, Channel<P>>,
    events_tx: mpsc::Sender<PumpEvent>,
    events_rx: mpsc::Receiver<PumpEvent>,
    next_handle: u64,
}

impl<P: Send + 'static> SubscriptionManager<P> {
    /// Create a new subscription manager.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_event_buffer(transport, DEFAULT_EVENT_BUFFER)
    }

    /// Create with a custom event queue capacity.
    pub fn with_event_buffer(transport: Arc<dyn Transport>, capacity: usize) -> Self {
        let (events_tx, events_rx) = mpsc::channel(capacity.max(1));
        Self {
            transport,
            channels: HashMap::new(),
            events_tx,
            events_rx,
            next_handle: 0,
        }
    }

    /// Start a channel.
    ///
    /// If a channel of that name is already Connecting or Open this is a
    /// no-op returning the existing handle; `descriptor` and `handlers` are
    /// dropped. Otherwise a fresh channel replaces any Idle/Closed/Errored one
    /// and a connection attempt begins.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(
        &mut self,
        descriptor: ChannelDescriptor<P>,
        handlers: ChannelHandlers<P>,
    ) -> HandleId {
        let name = descriptor.name().to_string();

        if let Some(existing) = self.channels.get(&name) {
            if let Some(id) = existing.handle_id() {
                debug!(channel = %name, handle = %id, state = %existing.state, "Channel already started");
                return id;
            }
        }

        self.next_handle += 1;
        let id = HandleId(self.next_handle);
        let endpoint = descriptor.endpoint().to_string();

        let connect = self.transport.connect(&endpoint);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(pump(
            name.clone(),
            id,
            connect,
            self.events_tx.clone(),
            cancel.clone(),
        ));

        let mut channel = Channel::new(descriptor, handlers);
        channel.handle = Some(TransportHandle { id, cancel, task });
        channel.state = ConnectionState::Connecting;
        self.channels.insert(name.clone(), channel);

        info!(channel = %name, endpoint = %endpoint, handle = %id, "Channel connecting");
        id
    }

    /// Stop a channel.
    ///
    /// Releases the transport handle, moves to Closed and reports a disconnect
    /// if the channel was Open. Returns `false` when there was nothing to do
    /// (unknown name or already Closed).
    pub fn stop(&mut self, name: &str) -> bool {
        let Some(channel) = self.channels.get_mut(name) else {
            debug!(channel = %name, "Stop on unknown channel");
            return false;
        };

        let previous = channel.state;
        let released = channel.handle.take().is_some();
        if previous == ConnectionState::Closed && !released {
            return false;
        }

        channel.state = ConnectionState::Closed;
        channel.report_disconnect(&DisconnectReason::Stopped);

        info!(channel = %name, from = %previous, "Channel closed");
        true
    }

    /// Stop every channel, whatever its state.
    pub fn stop_all(&mut self) -> usize {
        let names: Vec<String> = self.channels.keys().cloned().collect();
        names.iter().filter(|name| self.stop(name)).count()
    }

    /// Connection state of a channel.
    pub fn state(&self, name: &str) -> Option<ConnectionState> {
        self.channels.get(name).map(|c| c.state)
    }

    /// Latest successfully decoded value of a channel.
    pub fn latest_value(&self, name: &str) -> Option<&P> {
        self.channels.get(name)?.latest_value.as_ref()
    }

    /// Last error recorded on a channel.
    pub fn last_error(&self, name: &str) -> Option<&ChannelError> {
        self.channels.get(name)?.last_error.as_ref()
    }

    /// Names of every channel the manager knows about.
    pub fn channel_names(&self) -> Vec<String> {
        self.channels.keys().cloned().collect()
    }

    /// Number of outstanding transport handles.
    pub fn live_handles(&self) -> usize {
        self.channels.values().filter(|c| c.handle.is_some()).count()
    }

    /// Wait for the next transport event and apply it.
    ///
    /// Events from handles that were released in the meantime are skipped.
    /// Pending forever while no channel produces anything.
    pub async fn next_event(&mut self) -> ChannelEvent {
        loop {
            // The manager holds a sender itself, so the queue never closes.
            let Some(event) = self.events_rx.recv().await else {
                continue;
            };
            if let Some(applied) = self.apply(event) {
                return applied;
            }
        }
    }

    /// Apply every event already queued, without waiting.
    pub fn drain_pending(&mut self) -> Vec<ChannelEvent> {
        let mut applied = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            if let Some(e) = self.apply(event) {
                applied.push(e);
            }
        }
        applied
    }

    fn apply(&mut self, event: PumpEvent) -> Option<ChannelEvent> {
        let PumpEvent {
            channel: name,
            handle,
            kind,
        } = event;

        let Some(channel) = self.channels.get_mut(&name) else {
            return None;
        };
        if channel.handle_id() != Some(handle) {
            debug!(channel = %name, handle = %handle, "Dropping event from released handle");
            return None;
        }

        match kind {
            PumpEventKind::Opened => {
                channel.state = ConnectionState::Open;
                channel.disconnect_pending = true;
                info!(channel = %name, handle = %handle, "Channel open");
                if let Some(f) = channel.handlers.on_connected.as_mut() {
                    f(&name);
                }
                Some(ChannelEvent::Connected { channel: name })
            }
            PumpEventKind::Message(raw) => match channel.descriptor.decode(&raw) {
                Ok(value) => {
                    let value = channel.latest_value.insert(value);
                    if let Some(f) = channel.handlers.on_message.as_mut() {
                        f(&name, value);
                    }
                    Some(ChannelEvent::Message { channel: name })
                }
                Err(error) => {
                    warn!(channel = %name, error = %error, "Failed to decode message");
                    channel.last_error = Some(ChannelError::Decode(error.clone()));
                    Some(ChannelEvent::DecodeFailed {
                        channel: name,
                        error,
                    })
                }
            },
            PumpEventKind::Failed(reason) => {
                Some(Self::lose(channel, name, ChannelError::Connection(reason)))
            }
            PumpEventKind::Ended => Some(Self::lose(channel, name, ChannelError::RemoteClosed)),
        }
    }

    fn lose(channel: &mut Channel<P>, name: String, error: ChannelError) -> ChannelEvent {
        let was_open = channel.state == ConnectionState::Open;
        warn!(channel = %name, error = %error, was_open, "Channel lost");

        channel.handle = None;
        channel.state = ConnectionState::Errored;
        channel.last_error = Some(error.clone());
        channel.report_disconnect(&DisconnectReason::Failed(error.clone()));

        ChannelEvent::Lost {
            channel: name,
            error,
            was_open,
        }
    }
}

impl<P> Drop for SubscriptionManager<P> {
    fn drop(&mut self) {
        let live = self.channels.values().filter(|c| c.handle.is_some()).count();
        if live > 0 {
            debug!(live, "Subscription manager dropped with live handles");
        }
    }
}

/// Drive one connection: handshake, then forward every message until the
/// stream ends, fails or the handle is cancelled.
async fn pump(
    channel: String,
    handle: HandleId,
    connect: ConnectFuture,
    tx: mpsc::Sender<PumpEvent>,
    cancel: CancellationToken,
) {
    let send = |kind: PumpEventKind| {
        let event = PumpEvent {
            channel: channel.clone(),
            handle,
            kind,
        };
        let tx = tx.clone();
        async move { tx.send(event).await.is_ok() }
    };

    let run = async {
        let mut stream = match connect.await {
            Ok(stream) => stream,
            Err(e) => {
                send(PumpEventKind::Failed(e.to_string())).await;
                return;
            }
        };
        if !send(PumpEventKind::Opened).await {
            return;
        }

        while let Some(item) = stream.next().await {
            let delivered = match item {
                Ok(raw) => send(PumpEventKind::Message(raw)).await,
                Err(e) => {
                    send(PumpEventKind::Failed(e.to_string())).await;
                    return;
                }
            };
            if !delivered {
                return;
            }
        }
        send(PumpEventKind::Ended).await;
    };

    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            debug!(channel = %channel, handle = %handle, "Pump cancelled");
        }
        () = run => {}
    }
}
