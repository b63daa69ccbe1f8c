//! Runtime configuration for ollama-relay.
//!
//! Every setting comes from the process environment (or the matching long
//! flag) and is resolved once at startup into an immutable [`Config`].

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Parser;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama2";
pub const DEFAULT_PORT: u16 = 8080;

/// Upstream request timeout.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "ollama-relay", version, about = "HTTP relay for a local Ollama server")]
pub struct Cli {
    /// Base URL of the upstream Ollama server.
    #[arg(long, env = "OLLAMA_URL", default_value = DEFAULT_OLLAMA_URL)]
    pub ollama_url: String,

    /// Model used when a request does not name one.
    #[arg(long, env = "DEFAULT_MODEL", default_value = DEFAULT_MODEL)]
    pub default_model: String,

    /// HTTP listen port.
    #[arg(long, env = "PORT", default_value = "8080")]
    pub port: String,

    /// Log format: "text" or "json".
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: String,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,

    /// Upstream inference server configuration.
    pub upstream: UpstreamConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on, on all interfaces.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

/// Upstream inference server settings.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL, e.g. "http://localhost:11434".
    pub base_url: String,

    /// Model substituted when the caller leaves `model` empty.
    pub default_model: String,

    /// Whole-request timeout for the upstream call.
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            timeout: UPSTREAM_TIMEOUT,
        }
    }
}

impl UpstreamConfig {
    /// Full URL of the upstream generate endpoint.
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

impl Config {
    /// Resolve parsed arguments into a configuration.
    ///
    /// Blank values fall back to the built-in defaults, matching the way an
    /// unset environment variable behaves.
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let port = match non_blank(&cli.port) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("invalid PORT {raw:?}: {e}"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            server: ServerConfig { port },
            upstream: UpstreamConfig {
                base_url: non_blank(&cli.ollama_url)
                    .unwrap_or(DEFAULT_OLLAMA_URL)
                    .to_string(),
                default_model: non_blank(&cli.default_model)
                    .unwrap_or(DEFAULT_MODEL)
                    .to_string(),
                timeout: UPSTREAM_TIMEOUT,
            },
        })
    }
}

/// `Some(value)` unchanged unless it is empty or all whitespace.
fn non_blank(value: &str) -> Option<&str> {
    (!value.trim().is_empty()).then_some(value)
}
