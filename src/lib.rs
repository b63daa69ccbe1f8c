//! ollama-relay: a minimal HTTP relay in front of a local Ollama server.
//!
//! Accepts a prompt on `POST /api/complete`, forwards it to the upstream
//! `/api/generate` endpoint with a single bounded request, and returns the
//! generated text together with the elapsed wall-clock time.

pub mod config;
pub mod relay;
pub mod server;
