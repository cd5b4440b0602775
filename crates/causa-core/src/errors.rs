//! Structured error types shared across causa crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`CausalError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (column names, sizes, etc.).
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
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the causa pipeline.
///
/// Only [`CausalError::Input`] is fatal to a pipeline call; every other family
/// is recovered by the component that produced it and folded into the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum CausalError {
    /// Caller supplied table or options violate the pipeline preconditions.
    #[error("input error: {0}")]
    Input(ErrorInfo),
    /// Structure learning failed (numerical or otherwise).
    #[error("structure error: {0}")]
    Structure(ErrorInfo),
    /// A single estimation method failed.
    #[error("estimation error: {0}")]
    Estimation(ErrorInfo),
    /// The robustness check could not be completed.
    #[error("refutation error: {0}")]
    Refutation(ErrorInfo),
    /// Effect-size heuristics could not be derived.
    #[error("effect size error: {0}")]
    EffectSize(ErrorInfo),
    /// Serialization and configuration parsing errors.
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

impl CausalError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            CausalError::Input(info)
            | CausalError::Structure(info)
            | CausalError::Estimation(info)
            | CausalError::Refutation(info)
            | CausalError::EffectSize(info)
            | CausalError::Serde(info) => info,
        }
    }

    /// Returns the stable machine readable code of the error.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Returns whether the error aborts a pipeline call.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CausalError::Input(_))
    }
}
