//! Connect phase: open the duplex channel.

use crate::config::ClientConfig;
use crate::diagnostics::{Component, DiagnosticSink, Level};
use crate::error::{Error, Phase, Result};
use crate::protocol::endpoint;
use crate::protocol::NegotiationResult;
use crate::transport::{DialError, Dialer, DuplexChannel};

use super::report;

/// Open the WebSocket channel for a negotiated connection.
///
/// Only the WebSocket transport is attempted.
///
/// # Errors
///
/// - [`Error::HandshakeRejected`] if the server refused the upgrade; the
///   rejection body is reported to the diagnostic sink first
/// - [`Error::Transport`] for any other connection failure
pub async fn connect(
    config: &ClientConfig,
    negotiated: &NegotiationResult,
    dialer: &dyn Dialer,
    diag: &dyn DiagnosticSink,
) -> Result<DuplexChannel> {
    let url = endpoint::connect_url(config, negotiated)
        .map_err(|e| report(diag, Component::Connect, e))?;

    diag.event(
        Level::Info,
        Component::Connect,
        &format!(
            "Connecting to {}://{}{}/connect",
            config.ws_scheme(),
            config.host,
            negotiated.url
        ),
    );

    match dialer.dial(&url).await {
        Ok(channel) => {
            diag.event(Level::Info, Component::Connect, "WebSocket connected");
            Ok(channel)
        }
        Err(DialError::Rejected { status, body }) => {
            diag.event(
                Level::Error,
                Component::Connect,
                &format!("Handshake rejected with status {}: {}", status, body),
            );
            Err(Error::HandshakeRejected { status, body })
        }
        Err(DialError::Other(e)) => Err(report(
            diag,
            Component::Connect,
            Error::transport(Phase::Connect, e),
        )),
    }
}
