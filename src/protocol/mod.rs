//! Wire types of the persistent-connection protocol.
//!
//! # Modules
//!
//! - [`types`] - negotiate and start response bodies
//! - [`messages`] - server-to-client envelopes and results
//! - [`invocation`] - client-to-server invocations and their encoding
//! - [`endpoint`] - negotiate/connect/start URL construction

pub mod endpoint;
pub mod invocation;
pub mod messages;
pub mod types;

pub use invocation::{Argument, ClientInvocationMessage, InvocationFrame};
pub use messages::{is_keep_alive, HubInvocation, PushEnvelope, ServerResultMessage};
pub use types::{NegotiationResult, StartResponse};
