//! Server-to-client frames.
//!
//! Every text frame the server pushes after the handshake decodes into a
//! [`PushEnvelope`]. Its `M` list carries the hub invocations; the first frame
//! of a session carries `S: 1` instead.

use serde::{Deserialize, Serialize};

use crate::constants;

/// Envelope of one server-to-client frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushEnvelope {
    /// Message id, present on every non-keep-alive message.
    #[serde(rename = "C", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Hub invocations carried by this frame, in order.
    #[serde(rename = "M", default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<HubInvocation>,

    /// Init flag; `1` on the first frame once the transport is ready.
    #[serde(rename = "S", default, skip_serializing_if = "Option::is_none")]
    pub initialized: Option<i64>,

    /// Groups token, an opaque string representing group membership.
    #[serde(rename = "G", default, skip_serializing_if = "Option::is_none")]
    pub groups_token: Option<String>,
}

impl PushEnvelope {
    /// Decode a frame body.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if `bytes` is not a valid envelope.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Returns `true` if this is the init message.
    #[must_use]
    pub fn is_init(&self) -> bool {
        self.initialized == Some(constants::SERVER_INITIALIZED)
    }
}

/// Returns `true` if `body` is the keep-alive sentinel.
#[must_use]
pub fn is_keep_alive(body: &[u8]) -> bool {
    body == constants::KEEP_ALIVE_FRAME.as_bytes()
}

/// A hub method invocation pushed by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HubInvocation {
    /// Invocation id; absent on server-initiated pushes.
    #[serde(rename = "I", default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<i64>,

    /// Hub name.
    #[serde(rename = "H", default)]
    pub hub: String,

    /// Method name.
    #[serde(rename = "M", default)]
    pub method: String,

    /// Method arguments.
    #[serde(rename = "A", default)]
    pub args: Vec<serde_json::Value>,

    /// Custom state.
    #[serde(rename = "S", default, skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
}

/// Result of a hub method call, sent by the server.
///
/// Every optional field is omitted on the wire when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerResultMessage {
    /// Invocation id of the call this answers.
    #[serde(rename = "I")]
    pub invocation_id: i64,

    /// Return value, present if the method is not void.
    #[serde(rename = "R", default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    /// Error message.
    #[serde(rename = "E", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// `true` if the error is a hub error.
    #[serde(rename = "H", default, skip_serializing_if = "Option::is_none")]
    pub hub_error: Option<bool>,

    /// Additional error data; only present for hub errors.
    #[serde(rename = "D", default, skip_serializing_if = "Option::is_none")]
    pub error_data: Option<serde_json::Value>,

    /// Stack trace, when detailed errors are enabled on the server.
    #[serde(rename = "T", default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<serde_json::Value>,

    /// Custom state.
    #[serde(rename = "S", default, skip_serializing_if = "Option::is_none")]
    pub state: Option<serde_json::Value>,
}

impl ServerResultMessage {
    /// Returns `true` if the call failed with a hub error.
    #[must_use]
    pub fn is_hub_error(&self) -> bool {
        self.hub_error == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_init_frame() {
        let env = PushEnvelope::from_slice(br#"{"S":1}"#).unwrap();
        assert!(env.is_init());
        assert!(env.messages.is_empty());

        let env = PushEnvelope::from_slice(br#"{"S":2}"#).unwrap();
        assert!(!env.is_init());

        let env = PushEnvelope::from_slice(br#"{"C":"d-1"}"#).unwrap();
        assert!(!env.is_init());
        assert_eq!(env.initialized, None);
    }

    #[test]
    fn test_push_frame_with_messages() {
        let body = br#"{"C":"d-9,0|B,0","M":[{"H":"chat","M":"broadcast","A":["hi",{"n":1}]}],"G":"grp"}"#;
        let env = PushEnvelope::from_slice(body).unwrap();

        assert_eq!(env.message_id.as_deref(), Some("d-9,0|B,0"));
        assert_eq!(env.groups_token.as_deref(), Some("grp"));
        assert_eq!(env.messages.len(), 1);

        let msg = &env.messages[0];
        assert_eq!(msg.invocation_id, None);
        assert_eq!(msg.hub, "chat");
        assert_eq!(msg.method, "broadcast");
        assert_eq!(msg.args, vec![json!("hi"), json!({"n": 1})]);
    }

    #[test]
    fn test_keep_alive_sentinel() {
        assert!(is_keep_alive(b"{}"));
        assert!(!is_keep_alive(b"{ }"));
        assert!(!is_keep_alive(br#"{"S":1}"#));
    }

    #[test]
    fn test_malformed_frame_is_error() {
        assert!(PushEnvelope::from_slice(b"not json").is_err());
        assert!(PushEnvelope::from_slice(br#"{"M":"wrong"}"#).is_err());
    }

    #[test]
    fn test_result_message_omits_unset_fields() {
        let msg = ServerResultMessage {
            invocation_id: 7,
            result: Some(json!(42)),
            ..ServerResultMessage::default()
        };
        assert_eq!(serde_json::to_value(&msg).unwrap(), json!({"I": 7, "R": 42}));
    }

    #[test]
    fn test_result_message_hub_error() {
        let msg: ServerResultMessage = serde_json::from_value(json!({
            "I": 3,
            "E": "boom",
            "H": true,
            "D": {"code": 12}
        }))
        .unwrap();

        assert!(msg.is_hub_error());
        assert_eq!(msg.error.as_deref(), Some("boom"));
        assert_eq!(msg.error_data, Some(json!({"code": 12})));
        assert_eq!(msg.stack_trace, None);
        assert_eq!(msg.state, None);
    }
}
