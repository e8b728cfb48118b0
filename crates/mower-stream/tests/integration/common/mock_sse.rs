//! Mock server-sent events server for integration tests.
//!
//! Serves `GET /api/openmower/subscribe/{name}` as an event stream and lets the
//! test publish raw payloads to, or hang up on, every subscriber of a name.
//! Any other path answers 404.

use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::Router;
use futures_util::Stream;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

type Subscribers = Arc<Mutex<HashMap<String, Vec<mpsc::UnboundedSender<String>>>>>;

#[derive(Clone, Default)]
struct MockState {
    subscribers: Subscribers,
    connections: Arc<AtomicU32>,
}

/// A mock SSE server for testing.
pub struct MockSseServer {
    addr: SocketAddr,
    state: MockState,
    task: JoinHandle<()>,
}

impl MockSseServer {
    /// Start a new mock server on an available port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = MockState::default();

        let app = Router::new()
            .route("/api/openmower/subscribe/{name}", get(subscribe))
            .with_state(state.clone());

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state, task }
    }

    /// Base URL of the server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of stream requests received.
    pub fn connection_count(&self) -> u32 {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// Subscribers of `name` whose stream is still held by a client.
    pub fn subscriber_count(&self, name: &str) -> usize {
        let mut subscribers = self.state.subscribers.lock();
        let Some(list) = subscribers.get_mut(name) else {
            return 0;
        };
        list.retain(|tx| !tx.is_closed());
        list.len()
    }

    /// Send one event with `raw` as data to every subscriber of `name`.
    pub fn publish(&self, name: &str, raw: &str) {
        if let Some(list) = self.state.subscribers.lock().get(name) {
            for tx in list {
                let _ = tx.send(raw.to_string());
            }
        }
    }

    /// End the event stream of every subscriber of `name`.
    pub fn hang_up(&self, name: &str) {
        self.state.subscribers.lock().remove(name);
    }

    /// Shutdown the server.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

async fn subscribe(
    State(state): State<MockState>,
    Path(name): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    state.connections.fetch_add(1, Ordering::SeqCst);

    let (tx, rx) = mpsc::unbounded_channel::<String>();
    state.subscribers.lock().entry(name).or_default().push(tx);

    let events = futures_util::stream::unfold(rx, |mut rx| async move {
        let raw = rx.recv().await?;
        Some((Ok(Event::default().data(raw)), rx))
    });
    Sse::new(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_starts() {
        let server = MockSseServer::start().await;
        assert!(server.url().starts_with("http://127.0.0.1:"));
        assert_eq!(server.connection_count(), 0);
        server.shutdown();
    }
}
