//! SignalR hub client - persistent-connection push over WebSockets.
//!
//! This crate connects to an ASP.NET SignalR (classic, protocol 1.x)
//! endpoint, keeps a WebSocket session open, and delivers every message the
//! server pushes to a single consumer in arrival order.
//!
//! # Architecture
//!
//! A session comes up in three ordered phases:
//!
//! - **Negotiate** - HTTP capability exchange, retried on non-200 answers
//! - **Connect** - WebSocket open using the negotiated connection token
//! - **Start** - HTTP start confirmation, then the server's init message
//!
//! After that a background reader task forwards decoded envelopes through a
//! bounded queue, dropping keep-alives. Any read or decode failure ends the
//! session and the reason is published alongside the queue.
//!
//! # Modules
//!
//! - [`session`] - [`Client`], [`Session`] and the lifecycle phases
//! - [`protocol`] - wire types, invocation encoding and endpoint URLs
//! - [`transport`] - HTTP and WebSocket seams plus their default impls
//! - [`config`] - Configuration loading/saving
//! - [`diagnostics`] - Pluggable sink for lifecycle events
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> signalr_client::Result<()> {
//! use signalr_client::{initialize, ClientInvocationMessage};
//!
//! let mut session = initialize("hub.example.com", "1.5", r#"[{"name":"chat"}]"#).await?;
//! let mut messages = session.messages().expect("first call");
//!
//! session
//!     .write(&ClientInvocationMessage::new(1, "chat", "send").arg("hello"))
//!     .await?;
//!
//! while let Some(envelope) = messages.recv().await {
//!     println!("{:?}", envelope.messages);
//! }
//! println!("ended: {:?}", messages.termination());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use config::ClientConfig;
pub use diagnostics::{Component, DiagnosticSink, Diagnostics, LogSink, NoopSink, RecordingSink};
pub use error::{Error, Phase, Result};
pub use protocol::{
    Argument, ClientInvocationMessage, HubInvocation, InvocationFrame, NegotiationResult,
    PushEnvelope, ServerResultMessage,
};
pub use session::inbox::{Messages, SessionState, Termination};
pub use session::{initialize, Client, Session};
