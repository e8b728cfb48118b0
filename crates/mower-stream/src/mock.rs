//! Scripted in-memory transport.
//!
//! Every `connect` parks a pending handshake per endpoint; the test decides
//! when and how it resolves (`open`/`refuse`) and then drives the open stream
//! (`push`/`fail`/`close`).

use crate::error::{StreamError, StreamResult};
use crate::transport::{ConnectFuture, MessageStream, Transport};
use futures_util::{FutureExt, StreamExt};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

type Handshake = oneshot::Sender<StreamResult<MessageStream>>;
type Feed = mpsc::UnboundedSender<StreamResult<String>>;

#[derive(Default)]
struct Endpoint {
    connects: usize,
    pending: VecDeque<Handshake>,
    live: Option<Feed>,
    open_streams: Arc<AtomicUsize>,
}

/// Decrements the open stream count when the stream is dropped.
struct StreamGuard(Arc<AtomicUsize>);

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Test transport driven by hand.
#[derive(Default)]
pub struct MockTransport {
    endpoints: Mutex<HashMap<String, Endpoint>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete the oldest pending handshake on `endpoint`.
    pub fn open(&self, endpoint: &str) {
        let mut endpoints = self.endpoints.lock();
        let entry = endpoints.entry(endpoint.to_string()).or_default();
        let Some(handshake) = entry.pending.pop_front() else {
            return;
        };

        let (tx, rx) = mpsc::unbounded_channel();
        entry.open_streams.fetch_add(1, Ordering::SeqCst);
        let guard = StreamGuard(entry.open_streams.clone());

        let stream = futures_util::stream::unfold((rx, guard), |(mut rx, guard)| async move {
            rx.recv().await.map(|item| (item, (rx, guard)))
        })
        .boxed();

        if handshake.send(Ok(stream)).is_ok() {
            entry.live = Some(tx);
        }
    }

    /// Fail the oldest pending handshake on `endpoint`.
    pub fn refuse(&self, endpoint: &str, reason: &str) {
        let mut endpoints = self.endpoints.lock();
        if let Some(handshake) = endpoints
            .get_mut(endpoint)
            .and_then(|e| e.pending.pop_front())
        {
            let _ = handshake.send(Err(StreamError::ConnectionFailed(reason.to_string())));
        }
    }

    /// Deliver a raw message on the open stream of `endpoint`.
    pub fn push(&self, endpoint: &str, raw: &str) {
        self.feed(endpoint, Ok(raw.to_string()));
    }

    /// Emit a transport error on the open stream of `endpoint`.
    pub fn fail(&self, endpoint: &str, reason: &str) {
        self.feed(endpoint, Err(StreamError::ReadFailed(reason.to_string())));
    }

    /// End the open stream of `endpoint`, as if the remote closed it.
    pub fn close(&self, endpoint: &str) {
        if let Some(entry) = self.endpoints.lock().get_mut(endpoint) {
            entry.live = None;
        }
    }

    /// Number of `connect` calls made for `endpoint`.
    pub fn connect_count(&self, endpoint: &str) -> usize {
        self.endpoints
            .lock()
            .get(endpoint)
            .map_or(0, |e| e.connects)
    }

    /// Streams handed out for `endpoint` that are still held by someone.
    pub fn open_streams(&self, endpoint: &str) -> usize {
        self.endpoints
            .lock()
            .get(endpoint)
            .map_or(0, |e| e.open_streams.load(Ordering::SeqCst))
    }

    fn feed(&self, endpoint: &str, item: StreamResult<String>) {
        if let Some(tx) = self
            .endpoints
            .lock()
            .get(endpoint)
            .and_then(|e| e.live.as_ref())
        {
            let _ = tx.send(item);
        }
    }
}

impl Transport for MockTransport {
    fn connect(&self, endpoint: &str) -> ConnectFuture {
        let (tx, rx) = oneshot::channel();
        {
            let mut endpoints = self.endpoints.lock();
            let entry = endpoints.entry(endpoint.to_string()).or_default();
            entry.connects += 1;
            entry.pending.push_back(tx);
        }

        async move {
            rx.await
                .unwrap_or_else(|_| Err(StreamError::ConnectionFailed("mock dropped".into())))
        }
        .boxed()
    }
}
