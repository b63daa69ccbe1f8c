//! HTTP server exposing the relay.
//!
//! - [`api`]: Request/response types, route handlers and the router
//! - [`cors`]: Cross-origin headers and preflight short-circuit
//! - [`elapsed`]: Duration formatting for responses

pub mod api;
pub mod cors;
pub mod elapsed;
