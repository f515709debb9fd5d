//! Progress sinks for free-text status messages.
//!
//! A transfer reports what it is doing through a [`ProgressSink`]. Sinks are
//! fire-and-forget: emitting never fails and never affects the transfer.

use std::sync::{Mutex, PoisonError};

use tracing::info;

/// Receiver of human-readable progress messages.
pub trait ProgressSink: Send + Sync {
    /// Records one status message.
    fn emit(&self, message: &str);
}

/// Forwards messages to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn emit(&self, message: &str) {
        info!(target: "files_downloader::progress", "{message}");
    }
}

/// Discards every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, _message: &str) {}
}

/// Keeps every message in order for later inspection.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    messages: Mutex<Vec<String>>,
}

impl RecordingProgress {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the messages emitted so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn emit(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
