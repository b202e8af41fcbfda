//! Append-only record of recoverable problems found during a conversion.
//!
//! Every record is also emitted through `tracing` at the matching level.
//! Recording never fails, and a [`Severity::Fatal`] record does not stop
//! anything: callers decide what the counts mean.

use std::fmt;

use serde::Serialize;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warn,
    Error,
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        match severity {
            Severity::Info => tracing::info!("{message}"),
            Severity::Warn => tracing::warn!("{message}"),
            Severity::Error | Severity::Fatal => {
                tracing::error!(severity = %severity, "{message}");
            }
        }
        self.records.push(Diagnostic { severity, message });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.report(Severity::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.report(Severity::Warn, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.report(Severity::Error, message);
    }

    pub fn fatal(&mut self, message: impl Into<String>) {
        self.report(Severity::Fatal, message);
    }

    /// Number of ERROR and FATAL records.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.records
            .iter()
            .filter(|d| d.severity >= Severity::Error)
            .count()
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.records.iter().filter(|d| d.severity == severity).count()
    }

    /// Whether a record of `severity` mentions `needle`.
    #[must_use]
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.records
            .iter()
            .any(|d| d.severity == severity && d.message.contains(needle))
    }

    #[must_use]
    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pretty-printed JSON array of all records.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
