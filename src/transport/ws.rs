//! WebSocket duplex channel.
//!
//! Thin wrapper around `tokio-tungstenite` providing type-isolated
//! reader/writer halves behind the [`FrameReader`] and [`FrameWriter`]
//! traits.
//!
//! # Architecture
//!
//! [`WsDialer`] handles URL→request building and TLS negotiation. It returns
//! a [`DuplexChannel`] whose halves can be used independently: the writer by
//! the session, the reader by the background task.
//!
//! Ping and pong frames never reach the caller. Tungstenite queues the pong
//! reply itself and flushes it on the next read or write.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite;

use super::{DialError, Dialer, DuplexChannel, Frame, FrameReader, FrameWriter};
use crate::error::BoxError;

/// Concrete WebSocket stream type (avoids repeating the 6-line generic everywhere).
type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Write half of a WebSocket connection.
#[derive(Debug)]
pub struct WsWriter {
    sink: futures_util::stream::SplitSink<WsStream, tungstenite::Message>,
}

#[async_trait]
impl FrameWriter for WsWriter {
    async fn send_text(&mut self, text: &str) -> Result<(), BoxError> {
        self.sink
            .send(tungstenite::Message::Text(text.to_string()))
            .await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BoxError> {
        self.sink.send(tungstenite::Message::Close(None)).await?;
        self.sink.flush().await?;
        Ok(())
    }
}

/// Read half of a WebSocket connection.
#[derive(Debug)]
pub struct WsReader {
    stream: futures_util::stream::SplitStream<WsStream>,
}

#[async_trait]
impl FrameReader for WsReader {
    async fn recv(&mut self) -> Option<Result<Frame, BoxError>> {
        loop {
            match self.stream.next().await {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    return Some(Ok(Frame::Text(text.to_string())));
                }
                Some(Ok(tungstenite::Message::Binary(data))) => {
                    return Some(Ok(Frame::Binary(data.to_vec())));
                }
                Some(Ok(tungstenite::Message::Close(close_frame))) => {
                    let (code, reason) = close_frame
                        .map(|cf| (cf.code.into(), cf.reason.to_string()))
                        .unwrap_or((1005, String::new()));
                    return Some(Ok(Frame::Close { code, reason }));
                }
                Some(Ok(
                    tungstenite::Message::Ping(_)
                    | tungstenite::Message::Pong(_)
                    | tungstenite::Message::Frame(_),
                )) => {
                    // Control and raw frames, skip
                    continue;
                }
                Some(Err(e)) => return Some(Err(e.into())),
                None => return None,
            }
        }
    }
}

/// Opens WebSocket channels with `tokio-tungstenite`.
#[derive(Debug, Default, Clone)]
pub struct WsDialer {
    headers: Vec<(String, String)>,
}

impl WsDialer {
    /// Dialer sending no extra headers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header to every upgrade request (e.g. a cookie or bearer token).
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[async_trait]
impl Dialer for WsDialer {
    async fn dial(&self, url: &str) -> Result<DuplexChannel, DialError> {
        use tungstenite::client::IntoClientRequest;

        let mut request = url
            .into_client_request()
            .map_err(|e| DialError::Other(Box::new(e)))?;

        for (name, value) in &self.headers {
            let header_name = tungstenite::http::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| DialError::Other(Box::new(e)))?;
            let header_value = tungstenite::http::HeaderValue::from_str(value)
                .map_err(|e| DialError::Other(Box::new(e)))?;
            request.headers_mut().insert(header_name, header_value);
        }

        let (ws_stream, _response) = match tokio_tungstenite::connect_async(request).await {
            Ok(pair) => pair,
            Err(tungstenite::Error::Http(response)) => {
                let status = response.status().as_u16();
                let body = response
                    .body()
                    .as_deref()
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .unwrap_or_default();
                return Err(DialError::Rejected { status, body });
            }
            Err(e) => return Err(DialError::Other(Box::new(e))),
        };

        let (sink, stream) = ws_stream.split();

        Ok(DuplexChannel {
            writer: Box::new(WsWriter { sink }),
            reader: Box::new(WsReader { stream }),
        })
    }
}
