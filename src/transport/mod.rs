//! Transport seams used by the lifecycle phases.
//!
//! The handshake needs two collaborators: a request/response transport for
//! negotiate and start, and a dialer that opens the duplex channel. Both are
//! traits so the phases can be driven by scripted fakes in tests.
//!
//! # Architecture
//!
//! ```text
//!   HttpTransport ──► negotiate, start
//!
//!   Dialer ──► (FrameWriter, FrameReader)
//!                   │             │
//!                Session     reader task
//! ```
//!
//! The duplex channel is handed out as two halves. The reader half is moved
//! into the background reader task; the writer half stays with the session.
//!
//! # Implementations
//!
//! - [`http::ReqwestTransport`] - `reqwest` client
//! - [`ws::WsDialer`] - `tokio-tungstenite` WebSocket

pub mod http;
pub mod ws;

use async_trait::async_trait;

use crate::error::BoxError;

/// Response of a request/response round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Full response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns `true` for `200 OK`, the only status the handshake accepts.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Body as lossy UTF-8, for diagnostics.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Request/response transport.
#[async_trait]
pub trait HttpTransport: Send + Sync + std::fmt::Debug {
    /// Issue a `GET` and read the whole body.
    ///
    /// Non-success statuses are returned as responses, not errors.
    async fn get(&self, url: &str) -> Result<HttpResponse, BoxError>;
}

/// One frame read from the duplex channel.
///
/// Ping/pong and raw frames are handled below this level and never surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
    /// Close frame with status code and reason.
    Close {
        /// WebSocket close code (1000 = normal, 1005 = no code).
        code: u16,
        /// Human-readable close reason.
        reason: String,
    },
}

impl Frame {
    /// Short name of the frame kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
            Self::Close { .. } => "close",
        }
    }
}

/// Read half of the duplex channel.
#[async_trait]
pub trait FrameReader: Send + std::fmt::Debug {
    /// Receive the next frame, returning `None` when the stream ends.
    async fn recv(&mut self) -> Option<Result<Frame, BoxError>>;
}

/// Write half of the duplex channel.
#[async_trait]
pub trait FrameWriter: Send + std::fmt::Debug {
    /// Send a UTF-8 text frame.
    async fn send_text(&mut self, text: &str) -> Result<(), BoxError>;

    /// Send a close frame and flush.
    async fn close(&mut self) -> Result<(), BoxError>;
}

/// Both halves of an open channel.
#[derive(Debug)]
pub struct DuplexChannel {
    /// Write half, kept by the session.
    pub writer: Box<dyn FrameWriter>,
    /// Read half, moved into the reader task.
    pub reader: Box<dyn FrameReader>,
}

/// Failure to open the duplex channel.
#[derive(Debug)]
pub enum DialError {
    /// The server answered the upgrade with a non-101 response.
    Rejected {
        /// HTTP status of the rejection.
        status: u16,
        /// Response body, if any.
        body: String,
    },
    /// Any other failure (DNS, TCP, TLS, invalid URL).
    Other(BoxError),
}

/// Opens the duplex channel.
#[async_trait]
pub trait Dialer: Send + Sync + std::fmt::Debug {
    /// Connect to `url` and return both halves of the channel.
    async fn dial(&self, url: &str) -> Result<DuplexChannel, DialError>;
}
