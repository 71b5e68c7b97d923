//! Fire-and-forget reporting of absorbed failures

use log::warn;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

pub type DiagnosticContext = BTreeMap<String, String>;

/// Event names reported by the engine
pub mod events {
    pub const SEEK_BACK_UNRESOLVED: &str = "seek_back_unresolved";
    pub const SEEK_BACK_SUPERSEDED: &str = "seek_back_superseded";
    pub const PLAY_DROPPED_NOT_READY: &str = "play_dropped_not_ready";
    pub const PLAYER_ERROR: &str = "player_error";
    pub const ADAPTER_UNAVAILABLE: &str = "adapter_unavailable";
}

/// Receives diagnostics from the engine
///
/// `report` is called from engine tasks and must neither block nor panic.
pub trait DiagnosticsSink: Send + Sync {
    fn report(&self, event: &str, context: DiagnosticContext);
}

/// Builds a context map from key/value pairs
pub fn context<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> DiagnosticContext
where
    K: Into<String>,
    V: ToString,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.to_string()))
        .collect()
}

/// Default sink: writes every report through `log::warn!`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl DiagnosticsSink for LogDiagnostics {
    fn report(&self, event: &str, context: DiagnosticContext) {
        let rendered = context
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(" ");
        warn!("{} {}", event, rendered);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub event: String,
    pub context: DiagnosticContext,
}

/// Keeps every report in memory
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    reports: Mutex<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<Diagnostic> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reports with the given event name, oldest first
    pub fn named(&self, event: &str) -> Vec<Diagnostic> {
        self.reports()
            .into_iter()
            .filter(|d| d.event == event)
            .collect()
    }

    pub fn clear(&self) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl DiagnosticsSink for RecordingDiagnostics {
    fn report(&self, event: &str, context: DiagnosticContext) {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Diagnostic {
                event: event.to_string(),
                context,
            });
    }
}
