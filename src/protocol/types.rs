//! HTTP response bodies of the handshake.
//!
//! Field names follow the server's PascalCase wire names; a few differ from
//! the semantic name (`Url` is the base path of the duplex endpoint,
//! `ConnectionId` the connection identifier).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection parameters returned by the negotiate request.
///
/// Produced once per session and consumed by connect and start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NegotiationResult {
    /// Base path of the duplex endpoint (e.g. `/signalr`).
    pub url: String,
    /// Opaque token identifying the connection. Percent-encode before use.
    pub connection_token: String,
    /// Connection identifier.
    #[serde(rename = "ConnectionId")]
    pub connection_id: String,
    /// Keep-alive timeout in seconds; `null` when keep-alives are disabled.
    pub keep_alive_timeout: Option<f64>,
    /// Seconds after which the server considers the client gone.
    pub disconnect_timeout: f64,
    /// Long-poll connection timeout in seconds.
    pub connection_timeout: f64,
    /// Whether the server supports the WebSocket transport.
    pub try_web_sockets: bool,
    /// Protocol version the server speaks.
    pub protocol_version: String,
    /// Seconds allowed for the transport to connect.
    pub transport_connect_timeout: f64,
    /// Long-poll delay in seconds.
    pub long_poll_delay: f64,
}

impl NegotiationResult {
    /// Keep-alive timeout, if the server sends keep-alives.
    #[must_use]
    pub fn keep_alive(&self) -> Option<Duration> {
        self.keep_alive_timeout.and_then(secs)
    }

    /// Disconnect timeout.
    #[must_use]
    pub fn disconnect(&self) -> Option<Duration> {
        secs(self.disconnect_timeout)
    }

    /// Transport connect timeout.
    #[must_use]
    pub fn transport_connect(&self) -> Option<Duration> {
        secs(self.transport_connect_timeout)
    }
}

fn secs(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

/// Body of the start request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartResponse {
    /// `"started"` when the server accepted the connection.
    #[serde(rename = "Response", default)]
    pub response: String,
}
