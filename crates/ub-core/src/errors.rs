//! Structured error types shared across ubench crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`UbError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (benchmark name, line index, field, ...).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the orchestrator and report pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum UbError {
    /// Invalid suite configuration; always fatal for the run.
    #[error("configuration error: {0}")]
    Config(ErrorInfo),
    /// A benchmark invocation failed while running or computing metrics.
    #[error("benchmark error: {0}")]
    Benchmark(ErrorInfo),
    /// Malformed stored data; recoverable at the record level.
    #[error("data error: {0}")]
    Data(ErrorInfo),
    /// Report synthesis failure scoped to a single sheet.
    #[error("report error: {0}")]
    Report(ErrorInfo),
    /// Filesystem failures while persisting or loading artefacts.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl UbError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            UbError::Config(info)
            | UbError::Benchmark(info)
            | UbError::Data(info)
            | UbError::Report(info)
            | UbError::Io(info)
            | UbError::Serde(info) => info,
        }
    }

    /// Returns true for errors that must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, UbError::Config(_) | UbError::Io(_))
    }

    /// Shorthand for a configuration error.
    pub fn config(code: &str, message: impl Into<String>) -> Self {
        UbError::Config(ErrorInfo::new(code, message))
    }

    /// Wraps an I/O style failure, recording the offending path.
    pub fn io(code: &str, path: impl Display, err: impl ToString) -> Self {
        UbError::Io(ErrorInfo::new(code, err.to_string()).with_context("path", path.to_string()))
    }

    /// Adds a context entry to whichever payload the error carries.
    pub fn with_context(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match self {
            UbError::Config(info) => UbError::Config(info.with_context(key, value)),
            UbError::Benchmark(info) => UbError::Benchmark(info.with_context(key, value)),
            UbError::Data(info) => UbError::Data(info.with_context(key, value)),
            UbError::Report(info) => UbError::Report(info.with_context(key, value)),
            UbError::Io(info) => UbError::Io(info.with_context(key, value)),
            UbError::Serde(info) => UbError::Serde(info.with_context(key, value)),
        }
    }
}
