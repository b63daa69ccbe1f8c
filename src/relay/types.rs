//! Wire types for the upstream `/api/generate` endpoint.

use serde::{Deserialize, Serialize};

/// Body sent to the upstream generate endpoint.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
}

/// Body returned by the upstream generate endpoint.
///
/// Only `response` is consumed by the relay.
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub created_at: String,
    pub response: String,
}
