//! Channel building blocks: descriptor, connection state, handler slots and
//! the owned transport handle.

use mower_core::{DecodeError, DecodeResult};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Pure decode function from raw message text to a typed payload.
pub type DecodeFn<P> = Arc<dyn Fn(&str) -> DecodeResult<P> + Send + Sync>;

/// Immutable description of one push subscription.
pub struct ChannelDescriptor<P> {
    name: String,
    endpoint: String,
    decode: DecodeFn<P>,
}

impl<P> ChannelDescriptor<P> {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        decode: impl Fn(&str) -> DecodeResult<P> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            decode: Arc::new(decode),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn decode(&self, raw: &str) -> DecodeResult<P> {
        (self.decode)(raw)
    }
}

impl<P> Clone for ChannelDescriptor<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            endpoint: self.endpoint.clone(),
            decode: self.decode.clone(),
        }
    }
}

impl<P> std::fmt::Debug for ChannelDescriptor<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelDescriptor")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Connection state of a channel.
///
/// ```text
/// Idle -> Connecting -> Open -> Closed
///         Connecting | Open -> Errored -> Closed
/// ```
/// `stop` is allowed from every state and always ends in `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed,
    Errored,
}

impl ConnectionState {
    /// Connecting or Open: a transport handle is outstanding.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Open)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Errored => write!(f, "errored"),
        }
    }
}

/// Last error recorded on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Connection closed by remote")]
    RemoteClosed,
}

/// Why a channel reported a disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Closed locally via `stop`/`stop_all`.
    Stopped,
    /// Transport failed or the remote closed the stream.
    Failed(ChannelError),
}

impl DisconnectReason {
    /// Short label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Failed(ChannelError::RemoteClosed) => "remote_closed",
            Self::Failed(_) => "failed",
        }
    }
}

type ConnectedFn = Box<dyn FnMut(&str) + Send>;
type MessageFn<P> = Box<dyn FnMut(&str, &P) + Send>;
type DisconnectedFn = Box<dyn FnMut(&str, &DisconnectReason) + Send>;

/// Externally supplied handlers of one channel.
///
/// Each slot receives the channel name first. Handlers run synchronously on
/// the task that drives the subscription manager.
pub struct ChannelHandlers<P> {
    pub(crate) on_connected: Option<ConnectedFn>,
    pub(crate) on_message: Option<MessageFn<P>>,
    pub(crate) on_disconnected: Option<DisconnectedFn>,
}

impl<P> ChannelHandlers<P> {
    pub fn new() -> Self {
        Self {
            on_connected: None,
            on_message: None,
            on_disconnected: None,
        }
    }

    /// Called once per successful open.
    pub fn on_connected(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_connected = Some(Box::new(f));
        self
    }

    /// Called with every successfully decoded value.
    pub fn on_message(mut self, f: impl FnMut(&str, &P) + Send + 'static) -> Self {
        self.on_message = Some(Box::new(f));
        self
    }

    /// Called once per open connection when it goes away, whether stopped
    /// locally or lost.
    pub fn on_disconnected(
        mut self,
        f: impl FnMut(&str, &DisconnectReason) + Send + 'static,
    ) -> Self {
        self.on_disconnected = Some(Box::new(f));
        self
    }
}

impl<P> Default for ChannelHandlers<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of one transport handle. A fresh id is issued per connection
/// attempt, so events from a released handle can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(pub(crate) u64);

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Live transport handle; owned by exactly one channel.
///
/// Dropping it cancels the pump task and aborts it, which drops the pending
/// connect future or the open stream.
pub(crate) struct TransportHandle {
    pub(crate) id: HandleId,
    pub(crate) cancel: CancellationToken,
    pub(crate) task: JoinHandle<()>,
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

/// One subscription and its lifecycle.
pub(crate) struct Channel<P> {
    pub(crate) descriptor: ChannelDescriptor<P>,
    pub(crate) handlers: ChannelHandlers<P>,
    pub(crate) state: ConnectionState,
    pub(crate) latest_value: Option<P>,
    pub(crate) last_error: Option<ChannelError>,
    pub(crate) handle: Option<TransportHandle>,
    /// Reached Open and the matching disconnect has not been reported yet.
    pub(crate) disconnect_pending: bool,
}

impl<P> Channel<P> {
    pub(crate) fn new(descriptor: ChannelDescriptor<P>, handlers: ChannelHandlers<P>) -> Self {
        Self {
            descriptor,
            handlers,
            state: ConnectionState::Idle,
            latest_value: None,
            last_error: None,
            handle: None,
            disconnect_pending: false,
        }
    }

    pub(crate) fn handle_id(&self) -> Option<HandleId> {
        self.handle.as_ref().map(|h| h.id)
    }

    /// Fire the disconnected handler if a connect was reported and not yet
    /// matched by a disconnect.
    pub(crate) fn report_disconnect(&mut self, reason: &DisconnectReason) -> bool {
        if !self.disconnect_pending {
            return false;
        }
        self.disconnect_pending = false;
        if let Some(f) = self.handlers.on_disconnected.as_mut() {
            f(self.descriptor.name(), reason);
        }
        true
    }
}
