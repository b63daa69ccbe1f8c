//! The relay service.
//!
//! One call in, one upstream `POST /api/generate` out. No retries; the
//! request is bounded by the client timeout, and the body is read only until
//! the first JSON value is complete.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::relay::error::RelayError;
use crate::relay::types::{GenerateRequest, GenerateResponse};

/// Something that turns a prompt into generated text.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Generate text for `prompt`. An empty `model` selects the default model.
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, RelayError>;
}

/// Relay to an Ollama-compatible generate endpoint.
pub struct OllamaRelay {
    client: reqwest::Client,
    generate_url: String,
    default_model: String,
}

impl OllamaRelay {
    /// Build a relay with its own HTTP client.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            generate_url: config.generate_url(),
            default_model: config.default_model.clone(),
        })
    }

    /// The model actually sent upstream for a requested `model`.
    pub fn effective_model<'a>(&'a self, model: &'a str) -> &'a str {
        if model.is_empty() {
            &self.default_model
        } else {
            model
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn generate_url(&self) -> &str {
        &self.generate_url
    }
}

#[async_trait]
impl Completer for OllamaRelay {
    async fn complete(&self, prompt: &str, model: &str) -> Result<String, RelayError> {
        let model = self.effective_model(model);

        let body = serde_json::to_vec(&GenerateRequest { model, prompt })
            .map_err(RelayError::request_construction)?;

        debug!(url = %self.generate_url, model, "Sending upstream generate request");

        let mut resp = self
            .client
            .post(&self.generate_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(RelayError::upstream_unreachable)?;

        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            return Err(RelayError::upstream_status(status.as_u16(), &text));
        }

        // Ollama streams newline-delimited objects unless told otherwise.
        // Stop at the first complete value so a long stream cannot outlive
        // the client timeout.
        let mut buf = Vec::new();
        while let Some(chunk) = resp.chunk().await.map_err(RelayError::response_decode)? {
            buf.extend_from_slice(&chunk);
            match first_value(&buf) {
                Some(Ok(parsed)) => return Ok(parsed.response),
                Some(Err(e)) if !e.is_eof() => return Err(RelayError::response_decode(e)),
                _ => {}
            }
        }

        decode_first(&buf).map(|r| r.response)
    }
}

fn first_value(body: &[u8]) -> Option<serde_json::Result<GenerateResponse>> {
    serde_json::Deserializer::from_slice(body)
        .into_iter::<GenerateResponse>()
        .next()
}

/// Decode the first JSON value of a complete body; anything after it is ignored.
fn decode_first(body: &[u8]) -> Result<GenerateResponse, RelayError> {
    match first_value(body) {
        Some(Ok(resp)) => Ok(resp),
        Some(Err(e)) => Err(RelayError::response_decode(e)),
        None => Err(RelayError::response_decode("empty response body")),
    }
}
