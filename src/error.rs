//! Error types for the hub client.
//!
//! Every phase of the connection lifecycle returns [`Error`] to its direct
//! caller. Transport implementations report failures as [`BoxError`], which
//! the phases wrap together with the [`Phase`] they happened in.

use std::fmt;

/// Boxed error returned by transport implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Lifecycle phase an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Initial capability exchange over HTTP.
    Negotiate,
    /// Opening the WebSocket channel.
    Connect,
    /// Start confirmation and init message.
    Start,
    /// Sending an invocation.
    Write,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Negotiate => "negotiate",
            Self::Connect => "connect",
            Self::Start => "start",
            Self::Write => "write",
        };
        f.write_str(name)
    }
}

/// Errors produced by the hub client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The HTTP or WebSocket transport failed.
    #[error("{phase} transport error: {source}")]
    Transport {
        /// Phase the failure happened in.
        phase: Phase,
        /// Underlying transport error.
        #[source]
        source: BoxError,
    },

    /// Every negotiate attempt answered with a non-success status.
    #[error("negotiation failed after {attempts} attempts (last status {last_status})")]
    NegotiationExhausted {
        /// Number of requests issued.
        attempts: u32,
        /// HTTP status of the final attempt.
        last_status: u16,
    },

    /// The server refused the WebSocket upgrade.
    #[error("websocket handshake rejected with status {status}: {body}")]
    HandshakeRejected {
        /// HTTP status returned instead of 101.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The start request answered something other than `started`.
    #[error("start response is not 'started': {0}")]
    UnexpectedStartResponse(String),

    /// The init message arrived in a non-text frame.
    #[error("unexpected websocket frame kind during init: {0}")]
    UnexpectedFrameKind(&'static str),

    /// The init message carried the wrong `S` value, or none.
    #[error("unexpected S value received from server: {0:?}")]
    UnexpectedInitValue(Option<i64>),

    /// The channel ended before the init message arrived.
    #[error("websocket closed before init message")]
    ClosedBeforeInit,

    /// A body or frame could not be decoded.
    #[error("failed to decode {what}: {source}")]
    Decode {
        /// What was being decoded.
        what: &'static str,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A message could not be serialized.
    #[error("failed to encode {what}: {source}")]
    Encode {
        /// What was being encoded.
        what: &'static str,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An invocation argument is neither bytes nor text.
    #[error("unsupported argument type: argument {index} is {kind}")]
    UnsupportedArgument {
        /// Position of the argument.
        index: usize,
        /// JSON kind of the offending value.
        kind: &'static str,
    },

    /// The HTTP client could not be built. No request was issued.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] BoxError),

    /// An endpoint URL could not be built from the negotiated values.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Wrap a transport failure with the phase it happened in.
    pub fn transport(phase: Phase, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            phase,
            source: source.into(),
        }
    }

    /// Wrap a JSON decode failure.
    pub fn decode(what: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { what, source }
    }

    /// Returns `true` if the error is a protocol violation by the server.
    ///
    /// Protocol violations are fatal to the phase they happen in and are
    /// never retried.
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedStartResponse(_)
                | Self::UnexpectedFrameKind(_)
                | Self::UnexpectedInitValue(_)
                | Self::ClosedBeforeInit
                | Self::Decode { .. }
        )
    }
}
