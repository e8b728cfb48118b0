//! Mock OpenMower backend for integration tests.
//!
//! Serves the push streams (`GET /api/openmower/subscribe/{name}`) and the
//! control endpoint (`POST /api/openmower/call/{action}`) from one server.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::Stream;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Clone, Default)]
struct BackendState {
    subscribers: Arc<Mutex<HashMap<String, Vec<mpsc::UnboundedSender<String>>>>>,
    command_error: Arc<Mutex<Option<String>>>,
    commands: Arc<Mutex<Vec<(String, Value)>>>,
}

/// A mock backend for testing.
pub struct MockBackend {
    addr: SocketAddr,
    state: BackendState,
    task: JoinHandle<()>,
}

impl MockBackend {
    /// Start a new mock backend on an available port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = BackendState::default();

        let app = Router::new()
            .route("/api/openmower/subscribe/{name}", get(subscribe))
            .route("/api/openmower/call/{action}", post(call))
            .with_state(state.clone());

        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state, task }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Send one event to every subscriber of `name`.
    pub fn publish(&self, name: &str, raw: &str) {
        if let Some(list) = self.state.subscribers.lock().get(name) {
            for tx in list {
                let _ = tx.send(raw.to_string());
            }
        }
    }

    /// Live subscribers of `name`.
    pub fn subscriber_count(&self, name: &str) -> usize {
        let mut subscribers = self.state.subscribers.lock();
        let Some(list) = subscribers.get_mut(name) else {
            return 0;
        };
        list.retain(|tx| !tx.is_closed());
        list.len()
    }

    /// Answer every following command with `{"error": message}`.
    pub fn fail_commands(&self, message: &str) {
        *self.state.command_error.lock() = Some(message.to_string());
    }

    pub fn commands(&self) -> Vec<(String, Value)> {
        self.state.commands.lock().clone()
    }

    pub fn shutdown(self) {
        self.task.abort();
    }
}

async fn subscribe(
    State(state): State<BackendState>,
    Path(name): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    state.subscribers.lock().entry(name).or_default().push(tx);

    let events = futures_util::stream::unfold(rx, |mut rx| async move {
        let raw = rx.recv().await?;
        Some((Ok(Event::default().data(raw)), rx))
    });
    Sse::new(events)
}

async fn call(
    State(state): State<BackendState>,
    Path(action): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.commands.lock().push((action, body));
    match state.command_error.lock().clone() {
        Some(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": message })),
        ),
        None => (StatusCode::OK, Json(serde_json::json!({}))),
    }
}
