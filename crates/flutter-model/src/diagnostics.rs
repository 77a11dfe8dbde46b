//! Structured event list threaded through every pipeline stage.
//!
//! Components push events here instead of writing to a global logger, so
//! callers (and tests) can inspect warnings without capturing output streams.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub severity: Severity,
    /// Component that raised the event (e.g. "mesh", "bdf", "f06")
    pub source: String,
    pub message: String,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity.as_str(), self.source, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    events: Vec<Event>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, source: &str, message: impl Into<String>) {
        self.events.push(Event {
            severity,
            source: source.to_string(),
            message: message.into(),
        });
    }

    pub fn info(&mut self, source: &str, message: impl Into<String>) {
        self.push(Severity::Info, source, message);
    }

    pub fn warn(&mut self, source: &str, message: impl Into<String>) {
        self.push(Severity::Warning, source, message);
    }

    pub fn error(&mut self, source: &str, message: impl Into<String>) {
        self.push(Severity::Error, source, message);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.events
            .iter()
            .filter(|e| e.severity == severity)
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages(Severity::Warning)
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.events.iter().any(|e| e.severity == Severity::Error)
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.events.extend(other.events);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
