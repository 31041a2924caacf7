use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::intent::ResponseKey;

pub type EngineResult<T> = Result<T, EngineError>;

/// One rejected field of a caller-supplied request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub reason: String,
}

impl FieldIssue {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Caller-supplied constraints out of range.
    #[error("invalid input: {}", join_issues(.0))]
    InvalidInput(Vec<FieldIssue>),

    /// A matcher produced a key the response book has no text for.
    #[error("response key not found: {0:?}")]
    ResponseNotFound(ResponseKey),

    #[error("unknown sort key: {0}")]
    UnknownSortKey(String),

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("unknown interest: {0}")]
    UnknownInterest(String),

    #[error("unknown selection kind: {0}")]
    UnknownSelectionKind(String),

    #[error("unknown chat channel: {0}")]
    UnknownChannel(String),
}

impl EngineError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput(vec![FieldIssue::new(field, reason)])
    }

    /// True for the validation class: the caller can fix the request and retry.
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, Self::ResponseNotFound(_))
    }

    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            Self::InvalidInput(issues) => issues,
            _ => &[],
        }
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
