//! Consumer side of the session's message queue.
//!
//! The reader task pushes every decoded [`PushEnvelope`] into a bounded
//! queue and awaits each send, so a slow consumer stalls the reader instead
//! of growing a buffer. When the reader stops it first publishes a
//! [`Termination`] and then drops the sending side: once [`Messages::recv`]
//! returns `None`, [`Messages::termination`] says why.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::{mpsc, watch};

use crate::protocol::PushEnvelope;

/// Why the reader task stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The server sent a close frame.
    Closed {
        /// WebSocket close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
    /// The stream ended without a close frame.
    StreamEnded,
    /// Reading the channel failed.
    ReadFailed(String),
    /// A frame could not be decoded into an envelope.
    DecodeFailed(String),
    /// The consumer dropped its end of the queue.
    ConsumerDropped,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed { code, reason } => write!(f, "closed by server ({code}): {reason}"),
            Self::StreamEnded => f.write_str("stream ended"),
            Self::ReadFailed(e) => write!(f, "read failed: {e}"),
            Self::DecodeFailed(e) => write!(f, "decode failed: {e}"),
            Self::ConsumerDropped => f.write_str("consumer dropped"),
        }
    }
}

/// Lifecycle state of a started session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// The reader task is forwarding messages.
    Running,
    /// The reader task has stopped for good.
    Terminated(Termination),
}

/// In-order sequence of envelopes pushed by the server.
///
/// Handed out once per session. Ends (yields `None`) when the reader task
/// stops; it cannot be restarted.
#[derive(Debug)]
pub struct Messages {
    rx: mpsc::Receiver<PushEnvelope>,
    state: watch::Receiver<SessionState>,
}

impl Messages {
    pub(crate) fn new(rx: mpsc::Receiver<PushEnvelope>, state: watch::Receiver<SessionState>) -> Self {
        Self { rx, state }
    }

    /// Wait for the next envelope. Returns `None` once the session ended.
    pub async fn recv(&mut self) -> Option<PushEnvelope> {
        self.rx.recv().await
    }

    /// Try to receive the next envelope (non-blocking).
    ///
    /// Returns `None` if no envelope is pending.
    pub fn try_recv(&mut self) -> Option<PushEnvelope> {
        self.rx.try_recv().ok()
    }

    /// Why the session ended, or `None` while it is running.
    pub fn termination(&self) -> Option<Termination> {
        match &*self.state.borrow() {
            SessionState::Running => None,
            SessionState::Terminated(reason) => Some(reason.clone()),
        }
    }

    /// Wait until the session ends and return why.
    ///
    /// Envelopes still queued stay available to [`Self::recv`].
    pub async fn terminated(&mut self) -> Termination {
        let result = self
            .state
            .wait_for(|s| matches!(s, SessionState::Terminated(_)))
            .await;
        match result.as_deref() {
            Ok(SessionState::Terminated(reason)) => reason.clone(),
            _ => Termination::StreamEnded,
        }
    }
}

impl Stream for Messages {
    type Item = PushEnvelope;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
