//! Connection lifecycle and the client facade.
//!
//! # Architecture
//!
//! ```text
//!   Client::initialize
//!         │
//!         ├─► negotiate ── HTTP ──► NegotiationResult
//!         ├─► connect ─── WS ────► DuplexChannel { writer, reader }
//!         ├─► start ───── HTTP + one WS read (init message)
//!         │
//!         ▼
//!   Session ──────────── writer ──► write(invocation)
//!         │
//!         └─ spawn(reader) ──► bounded queue ──► Messages
//! ```
//!
//! Each phase depends on what the previous one learned, so they run in
//! order inside `initialize` and the first failure stops the sequence. The
//! reader task only exists once all three phases succeeded.
//!
//! # Modules
//!
//! - [`negotiate`] - capability exchange with bounded retry
//! - [`connect`] - WebSocket open
//! - [`start`] - start confirmation and init message
//! - [`inbox`] - consumer side of the message queue

pub mod connect;
pub mod inbox;
pub mod negotiate;
mod reader;
pub mod start;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::diagnostics::{Component, DiagnosticSink, Diagnostics, Level, LogSink};
use crate::error::{Error, Phase, Result};
use crate::protocol::{ClientInvocationMessage, NegotiationResult};
use crate::transport::http::ReqwestTransport;
use crate::transport::ws::WsDialer;
use crate::transport::{Dialer, DuplexChannel, FrameWriter, HttpTransport};

use inbox::{Messages, SessionState, Termination};

/// Report `err` to the sink and hand it back for propagation.
pub(crate) fn report(diag: &dyn DiagnosticSink, component: Component, err: Error) -> Error {
    diag.event(Level::Error, component, &err.to_string());
    err
}

/// Hub client: configuration plus the transports used to reach the server.
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
    http: Arc<dyn HttpTransport>,
    dialer: Arc<dyn Dialer>,
    diagnostics: Diagnostics,
}

impl Client {
    /// Client using `reqwest` and `tokio-tungstenite`, logging via `log`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HttpClient`] if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = ReqwestTransport::new(&config).map_err(|e| Error::HttpClient(e.into()))?;
        Ok(Self::with_transports(
            config,
            Arc::new(http),
            Arc::new(WsDialer::new()),
        ))
    }

    /// Client using the given transports.
    pub fn with_transports(
        config: ClientConfig,
        http: Arc<dyn HttpTransport>,
        dialer: Arc<dyn Dialer>,
    ) -> Self {
        Self {
            config,
            http,
            dialer,
            diagnostics: Arc::new(LogSink),
        }
    }

    /// Replace the diagnostic sink.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run negotiate, connect and start, then spawn the reader task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns the error of the first phase that failed. No session exists
    /// in that case and any opened channel is dropped.
    pub async fn initialize(&self) -> Result<Session> {
        let diag = self.diagnostics.as_ref();

        let negotiated = negotiate::negotiate(&self.config, self.http.as_ref(), diag).await?;
        let mut channel =
            connect::connect(&self.config, &negotiated, self.dialer.as_ref(), diag).await?;
        start::start(
            &self.config,
            &negotiated,
            self.http.as_ref(),
            &mut channel,
            diag,
        )
        .await?;

        Ok(Session::spawn(
            negotiated,
            channel,
            self.config.queue_capacity(),
            Arc::clone(&self.diagnostics),
        ))
    }
}

/// Connect to `host` with default settings and return a started session.
///
/// # Errors
///
/// Returns the error of the first lifecycle phase that failed.
pub async fn initialize(
    host: &str,
    protocol_version: &str,
    connection_data: &str,
) -> Result<Session> {
    Client::new(ClientConfig::new(host, protocol_version, connection_data))?
        .initialize()
        .await
}

/// A started session.
///
/// Holds the write half of the channel; the read half belongs to the
/// background reader task. `write` takes `&mut self`, so concurrent writers
/// must share the session behind their own lock.
#[derive(Debug)]
pub struct Session {
    negotiated: NegotiationResult,
    writer: Box<dyn FrameWriter>,
    messages: Option<Messages>,
    state: watch::Receiver<SessionState>,
    reader_task: JoinHandle<()>,
    diagnostics: Diagnostics,
}

impl Session {
    fn spawn(
        negotiated: NegotiationResult,
        channel: DuplexChannel,
        capacity: usize,
        diagnostics: Diagnostics,
    ) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (state_tx, state_rx) = watch::channel(SessionState::Running);

        let reader_task = tokio::spawn(reader::run_reader(
            channel.reader,
            tx,
            state_tx,
            Arc::clone(&diagnostics),
        ));

        diagnostics.event(
            Level::Info,
            Component::Session,
            &format!("Session {} started", negotiated.connection_id),
        );

        Self {
            negotiated,
            writer: channel.writer,
            messages: Some(Messages::new(rx, state_rx.clone())),
            state: state_rx,
            reader_task,
            diagnostics,
        }
    }

    /// Encode `message` and send it as one text frame.
    ///
    /// Failures are returned, never retried.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedArgument`] if an argument is neither bytes nor
    ///   text; nothing is sent
    /// - [`Error::Transport`] if the frame could not be sent
    pub async fn write(&mut self, message: &ClientInvocationMessage) -> Result<()> {
        let diag = self.diagnostics.as_ref();
        let text = message
            .encode()
            .map_err(|e| report(diag, Component::Session, e))?;

        self.writer
            .send_text(&text)
            .await
            .map_err(|e| report(diag, Component::Session, Error::transport(Phase::Write, e)))?;

        diag.event(
            Level::Debug,
            Component::Session,
            &format!(
                "Sent invocation {} {}.{}",
                message.invocation_id, message.hub, message.method
            ),
        );
        Ok(())
    }

    /// Take the consumer end of the message queue.
    ///
    /// Returns `None` on every call after the first.
    pub fn messages(&mut self) -> Option<Messages> {
        self.messages.take()
    }

    /// Parameters negotiated for this session.
    pub fn negotiation(&self) -> &NegotiationResult {
        &self.negotiated
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Why the session ended, or `None` while it is running.
    pub fn termination(&self) -> Option<Termination> {
        match self.state() {
            SessionState::Running => None,
            SessionState::Terminated(reason) => Some(reason),
        }
    }

    /// Returns `true` while the reader task is forwarding messages.
    pub fn is_running(&self) -> bool {
        !self.reader_task.is_finished() && self.termination().is_none()
    }

    /// Send a close frame.
    ///
    /// The reader task stops once the server acknowledges the close.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the close frame could not be sent.
    pub async fn close(&mut self) -> Result<()> {
        self.diagnostics
            .event(Level::Info, Component::Session, "Closing session");
        self.writer
            .close()
            .await
            .map_err(|e| Error::transport(Phase::Write, e))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // An untaken queue has no consumer left once the session is gone.
        if self.messages.is_some() {
            self.reader_task.abort();
        }
    }
}
