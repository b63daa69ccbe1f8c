//! Public HTTP API.
//!
//! - POST /api/complete
//! - GET /health
//! - OPTIONS on any path (CORS preflight)

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::relay::client::Completer;
use crate::relay::error::RelayError;
use crate::server::cors::cors_middleware;
use crate::server::elapsed::format_elapsed;

/// Application state shared across handlers.
pub struct AppState {
    pub relay: Arc<dyn Completer>,
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/complete", post(complete))
        .route("/health", get(health))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(cors_middleware)),
        )
        .with_state(state)
}

// ─── Request/Response Types ────────────────────────────────────────────────

/// A validated completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Non-empty prompt text.
    pub prompt: String,
    /// Requested model; empty means "use the default".
    pub model: String,
}

#[derive(Debug, Deserialize)]
struct RawCompletionRequest {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

impl CompletionRequest {
    /// Parse and validate a JSON request body.
    pub fn from_json(body: &[u8]) -> Result<Self, ApiError> {
        let raw: RawCompletionRequest = serde_json::from_slice(body)
            .map_err(|e| ApiError::Validation(format!("invalid request body: {e}")))?;

        match raw.prompt {
            Some(prompt) if !prompt.is_empty() => Ok(Self {
                prompt,
                model: raw.model.unwrap_or_default(),
            }),
            _ => Err(ApiError::Validation("prompt is required".to_string())),
        }
    }
}

/// Successful completion response.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub response: String,
    /// The model as requested by the caller, not the default substituted upstream.
    pub model: String,
    pub time: String,
}

/// Error envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Errors surfaced to HTTP callers.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("not found")]
    NotFound,

    #[error("method not allowed")]
    MethodNotAllowed,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn complete(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CompletionResponse>, ApiError> {
    let req = CompletionRequest::from_json(&body)?;
    let request_id = Uuid::new_v4().to_string();

    info!(
        request_id,
        model = req.model,
        prompt_len = req.prompt.len(),
        "Completion request"
    );

    let start = Instant::now();
    let text = state
        .relay
        .complete(&req.prompt, &req.model)
        .await
        .inspect_err(|e| error!(request_id, kind = %e.kind(), error = %e, "Relay call failed"))?;
    let elapsed = start.elapsed();

    info!(
        request_id,
        elapsed_ms = elapsed.as_millis() as u64,
        response_len = text.len(),
        "Completion finished"
    );

    Ok(Json(CompletionResponse {
        response: text,
        model: req.model,
        time: format_elapsed(elapsed),
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prompt_and_model() {
        let req = CompletionRequest::from_json(br#"{"prompt":"hello","model":"mistral"}"#).unwrap();
        assert_eq!(req.prompt, "hello");
        assert_eq!(req.model, "mistral");
    }

    #[test]
    fn test_missing_model_is_empty() {
        let bodies: [&[u8]; 2] = [br#"{"prompt":"hello"}"#, br#"{"prompt":"hello","model":null}"#];
        for body in bodies {
            let req = CompletionRequest::from_json(body).unwrap();
            assert_eq!(req.model, "");
        }
    }

    #[test]
    fn test_prompt_required() {
        let bodies: [&[u8]; 3] = [br#"{}"#, br#"{"prompt":""}"#, br#"{"prompt":null,"model":"m"}"#];
        for body in bodies {
            let err = CompletionRequest::from_json(body).unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert_eq!(err.to_string(), "prompt is required");
        }
    }

    #[test]
    fn test_prompt_not_trimmed() {
        let req = CompletionRequest::from_json(br#"{"prompt":"  "}"#).unwrap();
        assert_eq!(req.prompt, "  ");
    }

    #[test]
    fn test_malformed_body() {
        let err = CompletionRequest::from_json(b"{not json").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().starts_with("invalid request body: "));
    }

    #[test]
    fn test_relay_error_is_internal() {
        let err = ApiError::from(RelayError::upstream_status(503, "overloaded"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "upstream returned status 503: overloaded");
    }
}
