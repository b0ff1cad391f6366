//! Diagnostic sink injected into every lifecycle component.
//!
//! Components never call the `log` macros directly. They report through a
//! [`DiagnosticSink`] handed to them by the [`Client`](crate::Client), so a
//! test can observe (or silence) what a phase reported without installing a
//! global logger.
//!
//! # Implementations
//!
//! - [`LogSink`] - forwards to the `log` facade (default)
//! - [`NoopSink`] - discards everything
//! - [`RecordingSink`] - keeps every event in memory for assertions

use std::fmt;
use std::sync::{Arc, Mutex};

pub use log::Level;

/// Component a diagnostic event was reported by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// The negotiator.
    Negotiate,
    /// The connector.
    Connect,
    /// The starter.
    Start,
    /// The background reader loop.
    Reader,
    /// The session facade.
    Session,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Negotiate => "Negotiate",
            Self::Connect => "Connect",
            Self::Start => "Start",
            Self::Reader => "Reader",
            Self::Session => "Session",
        };
        f.write_str(name)
    }
}

/// Receiver of diagnostic events.
pub trait DiagnosticSink: Send + Sync + fmt::Debug {
    /// Record one event.
    fn event(&self, level: Level, component: Component, message: &str);
}

/// Shared handle to a sink.
pub type Diagnostics = Arc<dyn DiagnosticSink>;

/// Forwards events to the `log` facade under the `signalr_client` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn event(&self, level: Level, component: Component, message: &str) {
        log::log!(target: "signalr_client", level, "[{}] {}", component, message);
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn event(&self, _level: Level, _component: Component, _message: &str) {}
}

/// One event captured by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Severity.
    pub level: Level,
    /// Reporting component.
    pub component: Component,
    /// Rendered message.
    pub message: String,
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingSink {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Returns `true` if any event from `component` contains `needle`.
    pub fn contains(&self, component: Component, needle: &str) -> bool {
        self.events()
            .iter()
            .any(|e| e.component == component && e.message.contains(needle))
    }
}

impl DiagnosticSink for RecordingSink {
    fn event(&self, level: Level, component: Component, message: &str) {
        if let Ok(mut events) = self.events.lock() {
            events.push(RecordedEvent {
                level,
                component,
                message: message.to_string(),
            });
        }
    }
}

/// Truncate `text` to at most `max` bytes on a char boundary, for log output.
pub(crate) fn preview(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
