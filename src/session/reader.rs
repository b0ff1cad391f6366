//! Background reader loop.
//!
//! Owns the read half of the channel for the lifetime of the session.
//! Keep-alive frames are dropped, everything else is decoded into a
//! [`PushEnvelope`] and handed to the consumer in arrival order. The first
//! read, decode or close ends the loop for good; there is no reconnect.
//!
//! The loop also stops as soon as the consumer drops its end of the queue,
//! even while the server only sends keep-alives.

use tokio::sync::{mpsc, watch};

use super::inbox::{SessionState, Termination};
use crate::constants;
use crate::diagnostics::{preview, Component, Diagnostics, DiagnosticSink, Level};
use crate::protocol::{is_keep_alive, PushEnvelope};
use crate::transport::{Frame, FrameReader};

/// Run the reader until the channel ends, then publish why.
pub(crate) async fn run_reader(
    mut reader: Box<dyn FrameReader>,
    tx: mpsc::Sender<PushEnvelope>,
    state: watch::Sender<SessionState>,
    diag: Diagnostics,
) {
    let termination = read_messages(reader.as_mut(), &tx, diag.as_ref()).await;

    let level = match termination {
        Termination::Closed { .. } => Level::Info,
        _ => Level::Warn,
    };
    diag.event(level, Component::Reader, &format!("Reader stopped: {}", termination));

    // Publish before `tx` drops so a consumer seeing end-of-stream can
    // always read the reason.
    state.send_replace(SessionState::Terminated(termination));
}

async fn read_messages(
    reader: &mut dyn FrameReader,
    tx: &mpsc::Sender<PushEnvelope>,
    diag: &dyn DiagnosticSink,
) -> Termination {
    loop {
        // Claim the queue slot before touching the channel, so no frame is
        // read until the consumer has taken the previous envelope.
        let Ok(permit) = tx.reserve().await else {
            return Termination::ConsumerDropped;
        };

        let envelope = loop {
            diag.event(Level::Trace, Component::Reader, "Waiting for message...");

            let frame = tokio::select! {
                frame = reader.recv() => frame,
                () = tx.closed() => return Termination::ConsumerDropped,
            };

            let body = match frame {
                Some(Ok(Frame::Text(text))) => text.into_bytes(),
                Some(Ok(Frame::Binary(data))) => data,
                Some(Ok(Frame::Close { code, reason })) => {
                    return Termination::Closed { code, reason };
                }
                Some(Err(e)) => return Termination::ReadFailed(e.to_string()),
                None => return Termination::StreamEnded,
            };

            if is_keep_alive(&body) {
                diag.event(Level::Trace, Component::Reader, "Keep-alive received");
                continue;
            }

            diag.event(
                Level::Debug,
                Component::Reader,
                &format!(
                    "Message received: {}",
                    preview(&String::from_utf8_lossy(&body), constants::LOG_PREVIEW_LEN)
                ),
            );

            match PushEnvelope::from_slice(&body) {
                Ok(envelope) => break envelope,
                Err(e) => return Termination::DecodeFailed(e.to_string()),
            }
        };

        permit.send(envelope);
    }
}
