//! Push channel subscriptions for mower telemetry.
//!
//! Provides:
//! - `Transport`: the contract a push source must satisfy (SSE by default)
//! - `SubscriptionManager`: owns a set of channels, their lifecycle and
//!   latest decoded values
//! - Per-channel connected/message/disconnected handler slots
//!
//! Transport I/O runs in background tasks that only forward events. All state
//! changes and handler calls happen inside `SubscriptionManager::next_event`
//! or `drain_pending`, on whichever task owns the manager.

pub mod channel;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod sse;
pub mod subscription;
pub mod transport;

pub use channel::{
    ChannelDescriptor, ChannelError, ChannelHandlers, ConnectionState, DecodeFn,
    DisconnectReason, HandleId,
};
pub use error::{StreamError, StreamResult};
pub use sse::{sse_messages, SseConfig, SseDecoder, SseTransport, DEFAULT_MAX_LINE_LEN};
pub use subscription::{ChannelEvent, SubscriptionManager, DEFAULT_EVENT_BUFFER};
pub use transport::{ConnectFuture, MessageStream, Transport};
