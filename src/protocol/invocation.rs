//! Client-to-server invocation messages.
//!
//! # Argument encoding
//!
//! Invocation arguments are not sent as a JSON array. The bytes of every
//! argument are concatenated in order and the result is written as a single
//! base64 string in the `A` field:
//!
//! ```text
//! args ["{\"a\":", b"1}"]  ->  {"I":4,"H":"hub","M":"send","A":"eyJhIjoxfQ=="}
//! ```
//!
//! Only byte and text arguments can take part in that concatenation. Any
//! other JSON value (number, bool, null, array, object) makes
//! [`ClientInvocationMessage::encode`] fail with
//! [`Error::UnsupportedArgument`] before anything is produced.
//!
//! [`InvocationFrame`] is the matching decoder, used by tests and by anything
//! standing in for the server.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// One argument of a [`ClientInvocationMessage`].
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// Raw bytes, appended as-is.
    Bytes(Vec<u8>),
    /// UTF-8 text, appended as its bytes.
    Text(String),
    /// Any JSON value. Only strings are encodable.
    Json(serde_json::Value),
}

impl Argument {
    /// Bytes this argument contributes to the `A` field.
    fn as_bytes(&self, index: usize) -> Result<&[u8]> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::Text(text) => Ok(text.as_bytes()),
            Self::Json(serde_json::Value::String(text)) => Ok(text.as_bytes()),
            Self::Json(other) => Err(Error::UnsupportedArgument {
                index,
                kind: json_kind(other),
            }),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl From<&str> for Argument {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for Argument {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<u8>> for Argument {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Argument {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl From<serde_json::Value> for Argument {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// A hub method call sent by the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientInvocationMessage {
    /// Invocation id, echoed back by the server in the result.
    pub invocation_id: i64,
    /// Hub name.
    pub hub: String,
    /// Method name.
    pub method: String,
    /// Arguments, concatenated on the wire.
    pub args: Vec<Argument>,
    /// Custom state.
    pub state: Option<serde_json::Value>,
}

/// Wire shape of an encoded invocation.
#[derive(Serialize)]
struct WireInvocation<'a> {
    #[serde(rename = "I")]
    invocation_id: i64,
    #[serde(rename = "H")]
    hub: &'a str,
    #[serde(rename = "M")]
    method: &'a str,
    #[serde(rename = "A")]
    args: Option<String>,
    #[serde(rename = "S", skip_serializing_if = "Option::is_none")]
    state: Option<&'a serde_json::Value>,
}

impl ClientInvocationMessage {
    /// Invocation of `hub.method` with no arguments.
    pub fn new(invocation_id: i64, hub: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            invocation_id,
            hub: hub.into(),
            method: method.into(),
            args: Vec::new(),
            state: None,
        }
    }

    /// Append an argument.
    pub fn arg(mut self, arg: impl Into<Argument>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set the custom state.
    pub fn state(mut self, state: serde_json::Value) -> Self {
        self.state = Some(state);
        self
    }

    /// Concatenate the argument bytes in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedArgument`] for the first argument that is
    /// neither bytes nor text.
    pub fn concatenated_args(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for (index, arg) in self.args.iter().enumerate() {
            out.extend_from_slice(arg.as_bytes(index)?);
        }
        Ok(out)
    }

    /// Encode the message as the JSON text of one frame.
    ///
    /// An empty concatenation is sent as `"A":null`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedArgument`] if an argument cannot be
    /// concatenated. No partial output is produced in that case.
    pub fn encode(&self) -> Result<String> {
        let args = self.concatenated_args()?;
        let wire = WireInvocation {
            invocation_id: self.invocation_id,
            hub: &self.hub,
            method: &self.method,
            args: (!args.is_empty()).then(|| BASE64.encode(args)),
            state: self.state.as_ref(),
        };
        serde_json::to_string(&wire).map_err(|source| Error::Encode {
            what: "invocation",
            source,
        })
    }
}

/// Decoded form of an encoded [`ClientInvocationMessage`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InvocationFrame {
    /// Invocation id.
    #[serde(rename = "I")]
    pub invocation_id: i64,
    /// Hub name.
    #[serde(rename = "H")]
    pub hub: String,
    /// Method name.
    #[serde(rename = "M")]
    pub method: String,
    /// Concatenated argument bytes.
    #[serde(rename = "A", default, deserialize_with = "decode_args")]
    pub args: Vec<u8>,
    /// Custom state.
    #[serde(rename = "S", default)]
    pub state: Option<serde_json::Value>,
}

impl InvocationFrame {
    /// Decode the JSON text of one client frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the text is not an encoded invocation.
    pub fn decode(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::decode("invocation", e))
    }
}

fn decode_args<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let encoded: Option<String> = Option::deserialize(deserializer)?;
    match encoded {
        Some(text) => BASE64.decode(text).map_err(serde::de::Error::custom),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_concatenates_text_and_bytes() {
        let msg = ClientInvocationMessage::new(4, "hub", "send")
            .arg("{\"a\":")
            .arg(b"1}".as_slice());

        let text = msg.encode().unwrap();
        assert_eq!(text, r#"{"I":4,"H":"hub","M":"send","A":"eyJhIjoxfQ=="}"#);

        let frame = InvocationFrame::decode(&text).unwrap();
        assert_eq!(frame.invocation_id, 4);
        assert_eq!(frame.hub, "hub");
        assert_eq!(frame.method, "send");
        assert_eq!(frame.args, br#"{"a":1}"#);
        assert_eq!(frame.state, None);
    }

    #[test]
    fn test_decode_reproduces_message_fields() {
        let cases = [
            ClientInvocationMessage::new(0, "chat", "ping"),
            ClientInvocationMessage::new(1, "chat", "send").arg("héllo").arg(" world"),
            ClientInvocationMessage::new(i64::MAX, "h", "m").arg(vec![0u8, 255, 10, 13]),
            ClientInvocationMessage::new(-3, "h", "m")
                .arg(json!("as-json-string"))
                .state(json!({"user": "ann"})),
        ];

        for msg in cases {
            let frame = InvocationFrame::decode(&msg.encode().unwrap()).unwrap();
            assert_eq!(frame.invocation_id, msg.invocation_id);
            assert_eq!(frame.hub, msg.hub);
            assert_eq!(frame.method, msg.method);
            assert_eq!(frame.args, msg.concatenated_args().unwrap());
            assert_eq!(frame.state, msg.state);
        }
    }

    #[test]
    fn test_number_argument_is_unsupported() {
        let msg = ClientInvocationMessage::new(1, "h", "m")
            .arg("ok")
            .arg(json!(42));

        match msg.encode() {
            Err(Error::UnsupportedArgument { index, kind }) => {
                assert_eq!(index, 1);
                assert_eq!(kind, "number");
            }
            other => panic!("expected unsupported argument, got {:?}", other),
        }
    }

    #[test]
    fn test_every_non_string_json_kind_is_unsupported() {
        for value in [json!(null), json!(true), json!([1]), json!({"k": "v"})] {
            let msg = ClientInvocationMessage::new(1, "h", "m").arg(value);
            let err = msg.encode().unwrap_err();
            assert!(err.to_string().contains("unsupported argument type"));
        }
    }

    #[test]
    fn test_state_omitted_when_unset() {
        let text = ClientInvocationMessage::new(2, "h", "m").encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(value.get("S").is_none());
    }

    #[test]
    fn test_empty_args_encode_as_null() {
        let text = ClientInvocationMessage::new(2, "h", "m").encode().unwrap();
        assert_eq!(text, r#"{"I":2,"H":"h","M":"m","A":null}"#);

        let empty_text = ClientInvocationMessage::new(2, "h", "m").arg("").encode().unwrap();
        assert_eq!(empty_text, text);

        assert!(InvocationFrame::decode(&text).unwrap().args.is_empty());
    }

    #[test]
    fn test_decoder_accepts_null_args() {
        let frame = InvocationFrame::decode(r#"{"I":1,"H":"h","M":"m","A":null}"#).unwrap();
        assert!(frame.args.is_empty());
    }
}
