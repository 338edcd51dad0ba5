// src/test_utils/mock_llm_server.rs
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crate::core_types::Message;

/// One scripted answer of the mock completion API.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// 200 with an OpenAI-shaped completion wrapping this message.
    Completion(Message),
    /// Any status with a raw body, e.g. a 429 rate-limit error.
    Status { status: u16, body: String },
    /// 200 with a raw body, for malformed-response cases.
    Raw(String),
}

impl MockReply {
    pub fn assistant(content: impl Into<String>) -> Self {
        MockReply::Completion(Message::assistant(content))
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        MockReply::Status {
            status,
            body: body.into(),
        }
    }
}

/// A request as seen by the mock completion API.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockServerState {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<MockRequest>>>,
}

impl MockServerState {
    fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

async fn chat_completions_handler(
    State(state): State<MockServerState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let authorization = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    log::debug!(
        "Mock completion server received {} messages",
        body["messages"].as_array().map(Vec::len).unwrap_or(0)
    );
    state.requests.lock().unwrap().push(MockRequest {
        authorization,
        body,
    });

    match state.replies.lock().unwrap().pop_front() {
        Some(MockReply::Completion(message)) => Json(json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": message,
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
        Some(MockReply::Status { status, body }) => {
            log::debug!("Mock completion server simulating status {}", status);
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, body).into_response()
        }
        Some(MockReply::Raw(body)) => (StatusCode::OK, body).into_response(),
        None => {
            log::error!("Mock completion server ran out of replies!");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

pub struct MockLLMServer {
    addr: SocketAddr,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    pub recorded_requests: Arc<Mutex<Vec<MockRequest>>>,
}

impl MockLLMServer {
    pub async fn start(replies: Vec<MockReply>) -> Self {
        let state = MockServerState::new(replies);
        let recorded_requests = state.requests.clone();

        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap_or_else(|e| {
            panic!("Failed to bind mock server to 127.0.0.1:0. Error: {}", e);
        });
        let addr = listener.local_addr().unwrap();
        log::info!("Mock completion server listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap_or_else(|e| {
                    log::error!("Mock completion server error: {}", e);
                });
        });

        MockLLMServer {
            addr,
            shutdown_tx,
            recorded_requests,
        }
    }

    pub fn address(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Base URL to configure as the upstream API base.
    pub fn api_base(&self) -> String {
        format!("{}/v1", self.address())
    }

    pub async fn shutdown(self) {
        if self.shutdown_tx.send(()).is_err() {
            log::warn!("Mock completion server shutdown signal already sent or receiver dropped.");
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }

    pub fn get_requests(&self) -> Vec<MockRequest> {
        self.recorded_requests.lock().unwrap().clone()
    }
}
