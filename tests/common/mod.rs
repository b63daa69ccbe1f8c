//! Stub upstream inference server shared by the integration tests.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use ollama_relay::config::UpstreamConfig;

struct StubState {
    status: StatusCode,
    body: String,
    calls: AtomicUsize,
    last_body: Mutex<Option<serde_json::Value>>,
}

/// A running stub of the upstream `/api/generate` endpoint.
pub struct StubUpstream {
    pub addr: SocketAddr,
    state: Arc<StubState>,
}

impl StubUpstream {
    /// Serve `body` with `status` for every generate call.
    pub async fn spawn(status: StatusCode, body: &str) -> Self {
        let state = Arc::new(StubState {
            status,
            body: body.to_string(),
            calls: AtomicUsize::new(0),
            last_body: Mutex::new(None),
        });

        let app = Router::new()
            .route("/api/generate", post(generate))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Serve a well-formed generate response carrying `text`.
    pub async fn ok(text: &str) -> Self {
        let body = serde_json::json!({
            "model": "llama2",
            "created_at": "t",
            "response": text,
        });
        Self::spawn(StatusCode::OK, &body.to_string()).await
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self, default_model: &str) -> UpstreamConfig {
        UpstreamConfig {
            base_url: self.base_url(),
            default_model: default_model.to_string(),
            ..UpstreamConfig::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// The JSON body of the most recent generate call.
    pub fn last_body(&self) -> Option<serde_json::Value> {
        self.state.last_body.lock().unwrap().clone()
    }
}

async fn generate(State(state): State<Arc<StubState>>, body: Bytes) -> (StatusCode, String) {
    state.calls.fetch_add(1, Ordering::SeqCst);
    *state.last_body.lock().unwrap() = serde_json::from_slice(&body).ok();
    (state.status, state.body.clone())
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// An upstream that accepts connections, writes `head` (possibly nothing) and
/// then holds the connection open without sending anything else.
pub struct StalledUpstream {
    pub addr: SocketAddr,
}

impl StalledUpstream {
    pub async fn spawn(head: Vec<u8>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let head = head.clone();
                tokio::spawn(async move {
                    let mut request = [0u8; 4096];
                    let _ = stream.read(&mut request).await;
                    let _ = stream.write_all(&head).await;
                    let _ = stream.flush().await;
                    tokio::time::sleep(Duration::from_secs(30)).await;
                });
            }
        });

        Self { addr }
    }

    /// A 200 response that streams one NDJSON line and then stalls.
    pub async fn first_line_only(line: &str) -> Self {
        let chunk = format!("{line}\n");
        let head = format!(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: application/x-ndjson\r\n\
             Transfer-Encoding: chunked\r\n\
             \r\n\
             {:x}\r\n{chunk}\r\n",
            chunk.len()
        );
        Self::spawn(head.into_bytes()).await
    }

    pub fn config(&self, timeout: Duration) -> UpstreamConfig {
        UpstreamConfig {
            base_url: format!("http://{}", self.addr),
            timeout,
            ..UpstreamConfig::default()
        }
    }
}
