//! Structured error types shared across ACE crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`AceError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (cluster indices, sizes, etc.).
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

/// Canonical error type for the ACE engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum AceError {
    /// Malformed statistics, samples, clusters or index sets.
    #[error("input error: {0}")]
    Input(ErrorInfo),
    /// Invalid or contradictory solver configuration.
    #[error("configuration error: {0}")]
    Configuration(ErrorInfo),
    /// Code paths the analytic sub-solvers do not support.
    #[error("unsupported operation: {0}")]
    Unsupported(ErrorInfo),
    /// Degenerate probabilities or non-finite intermediate results.
    #[error("numerical error: {0}")]
    Numerical(ErrorInfo),
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

impl AceError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            AceError::Input(info)
            | AceError::Configuration(info)
            | AceError::Unsupported(info)
            | AceError::Numerical(info)
            | AceError::Serde(info) => info,
        }
    }

    /// Shorthand for an [`AceError::Input`] without context.
    pub fn input(code: &str, message: impl Into<String>) -> Self {
        AceError::Input(ErrorInfo::new(code, message.into()))
    }

    /// Shorthand for an [`AceError::Configuration`] without context.
    pub fn configuration(code: &str, message: impl Into<String>) -> Self {
        AceError::Configuration(ErrorInfo::new(code, message.into()))
    }

    /// Shorthand for an [`AceError::Numerical`] without context.
    pub fn numerical(code: &str, message: impl Into<String>) -> Self {
        AceError::Numerical(ErrorInfo::new(code, message.into()))
    }

    /// Returns `true` for the non-fatal numerical family callers may recover from.
    pub fn is_numerical(&self) -> bool {
        matches!(self, AceError::Numerical(_))
    }
}
