//! Errors produced by the relay.

use std::fmt;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What went wrong during a relay call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayErrorKind {
    /// The upstream request body could not be built.
    RequestConstruction,
    /// The upstream server could not be reached (connect, DNS, timeout).
    UpstreamUnreachable,
    /// The upstream server answered with a non-200 status.
    UpstreamStatus,
    /// The upstream body did not match the expected JSON shape.
    ResponseDecode,
}

impl fmt::Display for RelayErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RequestConstruction => "request_construction",
            Self::UpstreamUnreachable => "upstream_unreachable",
            Self::UpstreamStatus => "upstream_status",
            Self::ResponseDecode => "response_decode",
        };
        f.write_str(name)
    }
}

/// A relay failure: a kind, a diagnostic message and the underlying cause.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct RelayError {
    kind: RelayErrorKind,
    message: String,
    status: Option<u16>,
    #[source]
    source: Option<BoxError>,
}

impl RelayError {
    pub fn request_construction(cause: impl Into<BoxError>) -> Self {
        Self::with_cause(
            RelayErrorKind::RequestConstruction,
            "failed to encode upstream request",
            cause,
        )
    }

    pub fn upstream_unreachable(cause: impl Into<BoxError>) -> Self {
        Self::with_cause(
            RelayErrorKind::UpstreamUnreachable,
            "upstream request failed",
            cause,
        )
    }

    /// Non-200 answer; `body` is kept verbatim.
    pub fn upstream_status(status: u16, body: &str) -> Self {
        Self {
            kind: RelayErrorKind::UpstreamStatus,
            message: format!("upstream returned status {status}: {body}"),
            status: Some(status),
            source: None,
        }
    }

    pub fn response_decode(cause: impl Into<BoxError>) -> Self {
        Self::with_cause(
            RelayErrorKind::ResponseDecode,
            "failed to decode upstream response",
            cause,
        )
    }

    fn with_cause(kind: RelayErrorKind, context: &str, cause: impl Into<BoxError>) -> Self {
        let source = cause.into();
        Self {
            kind,
            message: format!("{context}: {source}"),
            status: None,
            source: Some(source),
        }
    }

    pub fn kind(&self) -> RelayErrorKind {
        self.kind
    }

    /// Upstream HTTP status, for [`RelayErrorKind::UpstreamStatus`].
    pub fn status(&self) -> Option<u16> {
        self.status
    }
}
