//! Negotiate phase: capability exchange before the channel opens.
//!
//! The negotiate request is retried a bounded number of times while the
//! server answers with a non-success status. A transport failure aborts
//! immediately, and a body that does not decode is fatal.

use crate::config::ClientConfig;
use crate::diagnostics::{Component, DiagnosticSink, Level};
use crate::error::{Error, Phase, Result};
use crate::protocol::endpoint;
use crate::protocol::NegotiationResult;
use crate::transport::HttpTransport;

use super::report;

/// Negotiate connection parameters with the server.
///
/// Issues up to `config.negotiate_attempts` requests, sleeping
/// `config.negotiate_retry_delay()` after each non-success status except the
/// last one.
///
/// # Errors
///
/// - [`Error::Transport`] if a request fails at the transport level
/// - [`Error::Decode`] if the success body is not a negotiation result
/// - [`Error::NegotiationExhausted`] if no attempt succeeded
pub async fn negotiate(
    config: &ClientConfig,
    http: &dyn HttpTransport,
    diag: &dyn DiagnosticSink,
) -> Result<NegotiationResult> {
    let url = endpoint::negotiate_url(config).map_err(|e| report(diag, Component::Negotiate, e))?;
    let attempts = config.negotiate_attempts.max(1);
    let mut last_status = 0;

    for attempt in 1..=attempts {
        diag.event(
            Level::Debug,
            Component::Negotiate,
            &format!("GET {} (attempt {}/{})", url, attempt, attempts),
        );

        let response = http
            .get(&url)
            .await
            .map_err(|e| report(diag, Component::Negotiate, Error::transport(Phase::Negotiate, e)))?;

        if !response.is_ok() {
            last_status = response.status;
            diag.event(
                Level::Warn,
                Component::Negotiate,
                &format!("non-200 response while negotiating: {}", response.status),
            );
            if attempt < attempts {
                tokio::time::sleep(config.negotiate_retry_delay()).await;
            }
            continue;
        }

        let result: NegotiationResult = serde_json::from_slice(&response.body).map_err(|e| {
            report(diag, Component::Negotiate, Error::decode("negotiate response", e))
        })?;

        diag.event(
            Level::Info,
            Component::Negotiate,
            &format!(
                "Negotiated connection {} (protocol {}, websockets {})",
                result.connection_id, result.protocol_version, result.try_web_sockets
            ),
        );
        return Ok(result);
    }

    Err(report(
        diag,
        Component::Negotiate,
        Error::NegotiationExhausted {
            attempts,
            last_status,
        },
    ))
}
