//! Diagnostics sink for archive operations
//!
//! The archive engine never logs through a global logger directly. It reports
//! through a [`Diagnostics`] implementation handed to it at construction:
//! [`TracingDiagnostics`] forwards to `tracing`, [`RecordingDiagnostics`]
//! keeps messages in memory so callers can inspect them.

use std::sync::{Arc, Mutex, MutexGuard};

/// Target used for all `tracing` events emitted by this crate
pub const LOG_TARGET: &str = "ziparchive";

/// Receiver of diagnostic messages
pub trait Diagnostics: Send + Sync {
    fn info(&self, _message: &str) {}
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards diagnostics to the `tracing` ecosystem
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn info(&self, message: &str) {
        tracing::info!(target: LOG_TARGET, "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: LOG_TARGET, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: LOG_TARGET, "{}", message);
    }
}

/// Severity of a recorded diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// A single recorded message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

/// Collects diagnostics in memory
///
/// Clones share the same buffer, so one handle can be given to an archive
/// while another is kept for inspection.
#[derive(Debug, Default, Clone)]
pub struct RecordingDiagnostics {
    records: Arc<Mutex<Vec<Diagnostic>>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages recorded so far
    pub fn records(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    /// Messages of the given level
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.lock()
            .iter()
            .filter(|d| d.level == level)
            .map(|d| d.message.clone())
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages(Level::Warn)
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(Level::Error)
    }

    /// True if any message of `level` contains `needle`
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lock()
            .iter()
            .any(|d| d.level == level && d.message.contains(needle))
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn push(&self, level: Level, message: &str) {
        self.lock().push(Diagnostic {
            level,
            message: message.to_string(),
        });
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn info(&self, message: &str) {
        self.push(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(Level::Error, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_shares_buffer_between_clones() {
        let recorder = RecordingDiagnostics::new();
        let sink: Box<dyn Diagnostics> = Box::new(recorder.clone());

        sink.info("opened");
        sink.warn("skipping entry a.bin");
        sink.error("failed to copy b.bin");

        assert_eq!(recorder.records().len(), 3);
        assert_eq!(recorder.warnings(), vec!["skipping entry a.bin".to_string()]);
        assert!(recorder.contains(Level::Error, "b.bin"));
        assert!(!recorder.contains(Level::Warn, "b.bin"));

        recorder.clear();
        assert!(recorder.records().is_empty());
    }
}
