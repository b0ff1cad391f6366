//! Scripted transports for driving the lifecycle phases in unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::transport::{
    DialError, Dialer, DuplexChannel, Frame, FrameReader, FrameWriter, HttpResponse, HttpTransport,
};

/// HTTP transport answering from a script, recording every requested URL.
#[derive(Debug, Default)]
pub(crate) struct ScriptedHttp {
    responses: Mutex<VecDeque<Result<HttpResponse, String>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedHttp {
    pub(crate) fn new(responses: Vec<Result<HttpResponse, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedHttp {
    async fn get(&self, url: &str) -> Result<HttpResponse, BoxError> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(message.into()),
            None => Err("no scripted response left".into()),
        }
    }
}

pub(crate) fn ok(body: &str) -> Result<HttpResponse, String> {
    status(200, body)
}

pub(crate) fn status(status: u16, body: &str) -> Result<HttpResponse, String> {
    Ok(HttpResponse {
        status,
        body: body.as_bytes().to_vec(),
    })
}

/// Reader yielding scripted frames, then ending the stream.
#[derive(Debug, Default)]
pub(crate) struct ScriptedReader {
    frames: VecDeque<Result<Frame, String>>,
}

impl ScriptedReader {
    pub(crate) fn new(frames: Vec<Result<Frame, String>>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    pub(crate) fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(Frame::Text((*t).to_string()))).collect())
    }
}

#[async_trait]
impl FrameReader for ScriptedReader {
    async fn recv(&mut self) -> Option<Result<Frame, BoxError>> {
        self.frames
            .pop_front()
            .map(|frame| frame.map_err(BoxError::from))
    }
}

/// Wraps a reader and counts how many frames were pulled from it.
#[derive(Debug)]
pub(crate) struct CountingReader<R> {
    inner: R,
    reads: Arc<AtomicUsize>,
}

impl<R> CountingReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn reads(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }
}

#[async_trait]
impl<R: FrameReader> FrameReader for CountingReader<R> {
    async fn recv(&mut self) -> Option<Result<Frame, BoxError>> {
        let frame = self.inner.recv().await;
        if frame.is_some() {
            self.reads.fetch_add(1, Ordering::SeqCst);
        }
        frame
    }
}

/// Idle hub: yields any preamble frames, then a keep-alive every
/// `interval`, forever. Only keep-alives are counted.
#[derive(Debug)]
pub(crate) struct KeepAliveReader {
    preamble: VecDeque<String>,
    interval: Duration,
    reads: Arc<AtomicUsize>,
}

impl KeepAliveReader {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            preamble: VecDeque::new(),
            interval,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn after(mut self, texts: &[&str]) -> Self {
        self.preamble = texts.iter().map(|t| (*t).to_string()).collect();
        self
    }

    pub(crate) fn reads(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }
}

#[async_trait]
impl FrameReader for KeepAliveReader {
    async fn recv(&mut self) -> Option<Result<Frame, BoxError>> {
        if let Some(text) = self.preamble.pop_front() {
            return Some(Ok(Frame::Text(text)));
        }
        tokio::time::sleep(self.interval).await;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Some(Ok(Frame::Text("{}".to_string())))
    }
}

/// Writer recording every sent frame.
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordingWriter {
    pub(crate) sent: Arc<Mutex<Vec<String>>>,
    pub(crate) closed: Arc<AtomicBool>,
    pub(crate) fail: bool,
}

impl RecordingWriter {
    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl FrameWriter for RecordingWriter {
    async fn send_text(&mut self, text: &str) -> Result<(), BoxError> {
        if self.fail {
            return Err("broken pipe".into());
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BoxError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) fn channel(reader: impl FrameReader + 'static, writer: RecordingWriter) -> DuplexChannel {
    DuplexChannel {
        writer: Box::new(writer),
        reader: Box::new(reader),
    }
}

/// Dialer handing out one prepared channel, or a scripted failure.
#[derive(Debug)]
pub(crate) struct ScriptedDialer {
    outcome: Mutex<Option<Result<DuplexChannel, DialError>>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedDialer {
    pub(crate) fn new(outcome: Result<DuplexChannel, DialError>) -> Self {
        Self {
            outcome: Mutex::new(Some(outcome)),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dialer for ScriptedDialer {
    async fn dial(&self, url: &str) -> Result<DuplexChannel, DialError> {
        self.urls.lock().unwrap().push(url.to_string());
        self.outcome
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(DialError::Other("dialed twice".into())))
    }
}

pub(crate) const NEGOTIATE_BODY: &str = r#"{
    "Url": "/signalr",
    "ConnectionToken": "tok+en/1",
    "ConnectionId": "conn-1",
    "KeepAliveTimeout": 20.0,
    "DisconnectTimeout": 30.0,
    "ConnectionTimeout": 110.0,
    "TryWebSockets": true,
    "ProtocolVersion": "1.5",
    "TransportConnectTimeout": 5.0,
    "LongPollDelay": 0.0
}"#;
