//! Structured error/warning reporting.
//!
//! Load and export operations never fail through the caller's stack; they
//! either return a complete result or an explicit failure indicator, and
//! every problem encountered along the way lands here as a [`Diagnostic`].
//! Entries are mirrored to `tracing` as they arrive.

use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The triggering operation returns an absent/empty result
    Error,
    /// The operation continues; only the specific item is affected
    Warning,
}

/// A single collected diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity of the condition
    pub severity: Severity,
    /// Path or subject the message refers to, when known
    pub whence: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match &self.whence {
            Some(whence) => write!(f, "{tag}: {whence}: {}", self.message),
            None => write!(f, "{tag}: {}", self.message),
        }
    }
}

/// Collects diagnostics for one session
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    entries: Vec<Diagnostic>,
}

impl DiagnosticSink {
    /// Create an empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error
    pub fn error(&mut self, whence: Option<&str>, message: impl Into<String>) {
        self.push(Severity::Error, whence, message.into());
    }

    /// Record a warning
    pub fn warning(&mut self, whence: Option<&str>, message: impl Into<String>) {
        self.push(Severity::Warning, whence, message.into());
    }

    fn push(&mut self, severity: Severity, whence: Option<&str>, message: String) {
        let entry = Diagnostic {
            severity,
            whence: whence.map(String::from),
            message,
        };
        match severity {
            Severity::Error => tracing::error!(target: "cubrir", "{entry}"),
            Severity::Warning => tracing::warn!(target: "cubrir", "{entry}"),
        }
        self.entries.push(entry);
    }

    /// All collected diagnostics, in arrival order
    #[must_use]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Whether any error-severity diagnostic was recorded
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_severity_and_whence() {
        let mut sink = DiagnosticSink::new();
        sink.warning(Some("a.cmap"), "no coverage data found");
        sink.error(None, "failed to load coverage");
        assert_eq!(
            sink.entries()[0].to_string(),
            "warning: a.cmap: no coverage data found"
        );
        assert_eq!(sink.entries()[1].to_string(), "error: failed to load coverage");
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let mut sink = DiagnosticSink::new();
        sink.warning(None, "3 functions have mismatched data");
        assert!(!sink.has_errors());
        sink.error(Some("default.cprof"), "missing");
        assert!(sink.has_errors());
    }
}
