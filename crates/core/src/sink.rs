//! Diagnostics side channel.
//!
//! Components receive a `&dyn DiagnosticsSink` instead of logging through a
//! global, so every computation can be observed (and asserted on) in
//! isolation.

use std::sync::Mutex;
use tracing::Level;

pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, level: Level, message: &str);

    fn warn(&self, message: &str) {
        self.emit(Level::WARN, message);
    }

    fn info(&self, message: &str) {
        self.emit(Level::INFO, message);
    }

    fn debug(&self, message: &str) {
        self.emit(Level::DEBUG, message);
    }
}

/// Forwards to `tracing`. The default in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "adfunnel", "{}", message),
            Level::WARN => tracing::warn!(target: "adfunnel", "{}", message),
            Level::INFO => tracing::info!(target: "adfunnel", "{}", message),
            Level::DEBUG => tracing::debug!(target: "adfunnel", "{}", message),
            _ => tracing::trace!(target: "adfunnel", "{}", message),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn emit(&self, _level: Level, _message: &str) {}
}

/// Keeps every emitted entry in order. Used by tests and by callers that
/// want to surface diagnostics next to a result.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(Level, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn warnings(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(level, _)| *level == Level::WARN)
            .map(|(_, message)| message)
            .collect()
    }
}

impl DiagnosticsSink for RecordingSink {
    fn emit(&self, level: Level, message: &str) {
        let mut guard = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((level, message.to_string()));
    }
}
