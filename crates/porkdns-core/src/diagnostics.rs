//! Structured, non-fatal failure reports
//!
//! Lifecycle operations never abort the caller. Everything that goes wrong is
//! collected as a [`Diagnostic`] on the operation's [`Response`], and the
//! caller decides whether an error diagnostic fails its overall run.

use std::fmt;

use serde::Serialize;

use crate::error::Error;

/// How bad a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Something the caller should know about; the operation still succeeded
    Warning,
    /// The operation did not do what was asked
    Error,
}

/// Category of a diagnostic, so callers can react without parsing text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Rejected locally before any network call
    Validation,
    /// Every attempt allowed by the retry policy failed
    RetriesExhausted,
    /// The store refused the request in a way retrying will not fix
    Remote,
    /// The caller cancelled the operation
    Cancelled,
    /// The held identifier no longer matches any remote record
    Absent,
}

impl DiagnosticKind {
    /// Classify an error
    pub fn of(err: &Error) -> Self {
        match err {
            Error::InvalidInput(_) => Self::Validation,
            Error::RetriesExhausted { .. } => Self::RetriesExhausted,
            Error::Cancelled => Self::Cancelled,
            _ => Self::Remote,
        }
    }
}

/// One failure report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Category
    pub kind: DiagnosticKind,
    /// Short headline
    pub summary: String,
    /// Full message
    pub detail: String,
}

impl Diagnostic {
    /// Build an error diagnostic from an error
    pub fn error(summary: impl Into<String>, err: &Error) -> Self {
        Self {
            severity: Severity::Error,
            kind: DiagnosticKind::of(err),
            summary: summary.into(),
            detail: format!("Error: {}", err),
        }
    }

    /// Build a warning diagnostic
    pub fn warning(
        kind: DiagnosticKind,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}: {}", level, self.summary, self.detail)
    }
}

/// Ordered collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Append an error diagnostic for `err`
    pub fn add_error(&mut self, summary: impl Into<String>, err: &Error) {
        self.push(Diagnostic::error(summary, err));
    }

    /// Append every diagnostic from `other`
    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    /// Whether any diagnostic has error severity
    pub fn has_error(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    /// Number of diagnostics
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no diagnostics
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Result of one lifecycle operation
///
/// `state` is what the caller should persist. It is `None` when the caller's
/// previous state must be kept as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<T> {
    /// New state, if any
    pub state: Option<T>,
    /// Everything worth reporting about the operation
    pub diagnostics: Diagnostics,
}

impl<T> Response<T> {
    /// A clean response carrying `state`
    pub fn ok(state: T) -> Self {
        Self {
            state: Some(state),
            diagnostics: Diagnostics::new(),
        }
    }

    /// A failed response with a single error diagnostic
    pub fn error(state: Option<T>, summary: impl Into<String>, err: &Error) -> Self {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_error(summary, err);
        Self { state, diagnostics }
    }

    /// Whether any diagnostic has error severity
    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
    }
}
