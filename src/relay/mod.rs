//! Relay service: adapts a prompt to the upstream Ollama generate API.
//!
//! - [`client`]: The relay itself and the [`client::Completer`] seam
//! - [`error`]: Tagged relay errors
//! - [`types`]: Upstream request/response bodies

pub mod client;
pub mod error;
pub mod types;
