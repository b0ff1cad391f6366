//! Start phase: confirm the connection and wait for the init message.
//!
//! The session is usable only once the server has answered the start request
//! with `started` and the very first frame on the channel is the init
//! message (`{"S":1}`). Anything else is a protocol violation.

use crate::config::ClientConfig;
use crate::constants;
use crate::diagnostics::{preview, Component, DiagnosticSink, Level};
use crate::error::{Error, Phase, Result};
use crate::protocol::endpoint;
use crate::protocol::{NegotiationResult, PushEnvelope, StartResponse};
use crate::transport::{DuplexChannel, Frame, HttpTransport};

use super::report;

/// Confirm the session and consume the init message from `channel`.
///
/// Performs exactly one read on the channel.
///
/// # Errors
///
/// - [`Error::Transport`] if the start request or the read fails
/// - [`Error::Decode`] if the start body or the init frame is not valid JSON
/// - [`Error::UnexpectedStartResponse`] if the server did not answer `started`
/// - [`Error::UnexpectedFrameKind`] if the first frame is not text
/// - [`Error::UnexpectedInitValue`] if the first frame's `S` is not `1`
/// - [`Error::ClosedBeforeInit`] if the stream ended first
pub async fn start(
    config: &ClientConfig,
    negotiated: &NegotiationResult,
    http: &dyn HttpTransport,
    channel: &mut DuplexChannel,
    diag: &dyn DiagnosticSink,
) -> Result<()> {
    let fail = |err: Error| report(diag, Component::Start, err);

    let url = endpoint::start_url(config, negotiated).map_err(fail)?;
    let response = http
        .get(&url)
        .await
        .map_err(|e| fail(Error::transport(Phase::Start, e)))?;

    let started: StartResponse = serde_json::from_slice(&response.body).map_err(|e| {
        diag.event(
            Level::Debug,
            Component::Start,
            &format!(
                "Start body (status {}): {}",
                response.status,
                preview(&response.body_text(), constants::LOG_PREVIEW_LEN)
            ),
        );
        fail(Error::decode("start response", e))
    })?;

    // Confirm the server response is what we expect.
    if started.response != constants::START_RESPONSE_STARTED {
        return Err(fail(Error::UnexpectedStartResponse(started.response)));
    }

    diag.event(Level::Debug, Component::Start, "Waiting for init message...");

    let frame = match channel.reader.recv().await {
        Some(Ok(frame)) => frame,
        Some(Err(e)) => return Err(fail(Error::transport(Phase::Start, e))),
        None => return Err(fail(Error::ClosedBeforeInit)),
    };

    let text = match frame {
        Frame::Text(text) => text,
        other => return Err(fail(Error::UnexpectedFrameKind(other.kind()))),
    };

    let envelope = PushEnvelope::from_slice(text.as_bytes())
        .map_err(|e| fail(Error::decode("init message", e)))?;

    if !envelope.is_init() {
        return Err(fail(Error::UnexpectedInitValue(envelope.initialized)));
    }

    diag.event(Level::Info, Component::Start, "Init message received, session ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;
    use crate::session::test_support::{
        channel, ok, status, RecordingWriter, ScriptedHttp, ScriptedReader,
    };

    fn config() -> ClientConfig {
        ClientConfig::new("hub.example.com", "1.5", "[]")
    }

    fn negotiated() -> NegotiationResult {
        NegotiationResult {
            url: "/signalr".to_string(),
            connection_token: "tok".to_string(),
            ..NegotiationResult::default()
        }
    }

    async fn run(start_body: &str, frames: ScriptedReader) -> Result<()> {
        let http = ScriptedHttp::new(vec![ok(start_body)]);
        let mut ch = channel(frames, RecordingWriter::default());
        start(&config(), &negotiated(), &http, &mut ch, &RecordingSink::new()).await
    }

    #[tokio::test]
    async fn test_started_and_init_frame_succeeds() {
        let result = run(r#"{"Response":"started"}"#, ScriptedReader::texts(&[r#"{"S":1}"#])).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_start_request_url() {
        let http = ScriptedHttp::new(vec![ok(r#"{"Response":"started"}"#)]);
        let mut ch = channel(
            ScriptedReader::texts(&[r#"{"S":1}"#]),
            RecordingWriter::default(),
        );
        start(&config(), &negotiated(), &http, &mut ch, &RecordingSink::new())
            .await
            .unwrap();

        assert_eq!(
            http.requests(),
            vec!["https://hub.example.com/signalr/start?transport=webSockets&clientProtocol=1.5\
                  &connectionToken=tok&connectionData=%5B%5D"
                .to_string()]
        );
    }

    #[tokio::test]
    async fn test_wrong_init_value_fails() {
        let err = run(r#"{"Response":"started"}"#, ScriptedReader::texts(&[r#"{"S":2}"#]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedInitValue(Some(2))));
        assert!(err.is_protocol_violation());
    }

    #[tokio::test]
    async fn test_missing_init_value_fails() {
        let err = run(
            r#"{"Response":"started"}"#,
            ScriptedReader::texts(&[r#"{"C":"d-1","M":[]}"#]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::UnexpectedInitValue(None)));
    }

    #[tokio::test]
    async fn test_keep_alive_before_init_fails() {
        let err = run(r#"{"Response":"started"}"#, ScriptedReader::texts(&["{}", r#"{"S":1}"#]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedInitValue(None)));
    }

    #[tokio::test]
    async fn test_not_started_fails_without_reading() {
        let http = ScriptedHttp::new(vec![ok(r#"{"Response":"stopped"}"#)]);
        let reader = ScriptedReader::texts(&[r#"{"S":1}"#]);
        let mut ch = channel(reader, RecordingWriter::default());

        let err = start(&config(), &negotiated(), &http, &mut ch, &RecordingSink::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnexpectedStartResponse(ref r) if r == "stopped"));
        // The init frame is still unread.
        assert!(matches!(ch.reader.recv().await, Some(Ok(Frame::Text(_)))));
    }

    #[tokio::test]
    async fn test_binary_init_frame_fails() {
        let reader = ScriptedReader::new(vec![Ok(Frame::Binary(br#"{"S":1}"#.to_vec()))]);
        let err = run(r#"{"Response":"started"}"#, reader).await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedFrameKind("binary")));
    }

    #[tokio::test]
    async fn test_closed_before_init_fails() {
        let err = run(r#"{"Response":"started"}"#, ScriptedReader::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ClosedBeforeInit));
    }

    #[tokio::test]
    async fn test_read_error_fails() {
        let reader = ScriptedReader::new(vec![Err("reset by peer".to_string())]);
        let err = run(r#"{"Response":"started"}"#, reader).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Transport {
                phase: Phase::Start,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_undecodable_start_body_fails() {
        let http = ScriptedHttp::new(vec![status(500, "Internal Server Error")]);
        let sink = RecordingSink::new();
        let mut ch = channel(ScriptedReader::default(), RecordingWriter::default());

        let err = start(&config(), &negotiated(), &http, &mut ch, &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Decode { what: "start response", .. }));
        assert!(sink.contains(Component::Start, "status 500"));
    }
}
