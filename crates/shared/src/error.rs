use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when the form cannot establish an active category.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitializationError {
    #[error("no lab orderables were found")]
    NoOrderables,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    NotFound,
    Internal,
}

/// A failed order submission as reported by the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code:?}: {message}")]
pub struct SubmissionError {
    pub code: ErrorCode,
    pub message: String,
}

impl SubmissionError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
