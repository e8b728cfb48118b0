//! Mock control endpoint for integration tests.
//!
//! Accepts `POST /api/openmower/call/{action}`, records the action and JSON
//! body, and answers with a per-action scripted response (`200 {}` unless
//! told otherwise).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Clone, Default)]
struct ControlState {
    responses: Arc<Mutex<HashMap<String, (StatusCode, String)>>>,
    received: Arc<Mutex<Vec<(String, Value)>>>,
}

/// A mock control endpoint for testing.
pub struct MockControlServer {
    addr: SocketAddr,
    state: ControlState,
    task: JoinHandle<()>,
}

impl MockControlServer {
    /// Start a new mock server on an available port.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = ControlState::default();

        let app = Router::new()
            .route("/api/openmower/call/{action}", post(call))
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

    /// Script the response for `action`.
    pub fn respond(&self, action: &str, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap();
        self.state
            .responses
            .lock()
            .insert(action.to_string(), (status, body.to_string()));
    }

    /// All (action, body) pairs received so far.
    pub fn received(&self) -> Vec<(String, Value)> {
        self.state.received.lock().clone()
    }

    /// Shutdown the server.
    pub fn shutdown(self) {
        self.task.abort();
    }
}

async fn call(
    State(state): State<ControlState>,
    Path(action): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    state.received.lock().push((action.clone(), body));
    state
        .responses
        .lock()
        .get(&action)
        .cloned()
        .unwrap_or((StatusCode::OK, "{}".to_string()))
}
