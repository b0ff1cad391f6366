//! Protocol and client constants.
//!
//! Centralizes the magic values of the persistent-connection protocol and
//! the client defaults so they are discoverable in one place.
//!
//! # Categories
//!
//! - **Wire**: literal values the server and client agree on
//! - **Endpoints**: URL path segments and query values
//! - **Defaults**: configuration fallbacks

use std::time::Duration;

// ============================================================================
// Wire
// ============================================================================

/// Frame body the server sends as a keep-alive. Never a payload.
pub const KEEP_ALIVE_FRAME: &str = "{}";

/// Value of the `S` field in the init message once the transport is ready.
pub const SERVER_INITIALIZED: i64 = 1;

/// Expected `Response` value of the start request.
pub const START_RESPONSE_STARTED: &str = "started";

// ============================================================================
// Endpoints
// ============================================================================

/// Default path the hub endpoints are mounted under.
pub const DEFAULT_ROOT_PATH: &str = "/signalr";

/// Transport name sent on connect and start. No fallback transports exist.
pub const TRANSPORT_WEB_SOCKETS: &str = "webSockets";

/// Default client protocol version.
pub const DEFAULT_PROTOCOL_VERSION: &str = "1.5";

// ============================================================================
// Defaults
// ============================================================================

/// Number of negotiate requests before giving up.
pub const NEGOTIATE_MAX_ATTEMPTS: u32 = 5;

/// Wait between negotiate attempts after a non-success status.
///
/// The negotiate endpoint tends to answer non-200 while the hub is
/// restarting, which takes on the order of a minute.
pub const NEGOTIATE_RETRY_DELAY: Duration = Duration::from_secs(60);

/// HTTP request timeout for negotiate and start.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of the queue between the reader task and the consumer.
///
/// One slot keeps the handoff close to a rendezvous: the reader stalls as
/// soon as the consumer falls one message behind.
pub const MESSAGE_QUEUE_CAPACITY: usize = 1;

/// Maximum bytes of a frame body echoed into diagnostics.
pub const LOG_PREVIEW_LEN: usize = 200;
