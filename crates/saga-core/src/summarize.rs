use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Change, Session};

/// Per-file summary returned by the collaborator: a file path plus one
/// described line per change, timestamps as `HH:MM:SS` wall clock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileSummary {
    pub file_path: String,
    pub changes: Vec<SummaryLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryLine {
    pub timestamp: String,
    pub description: String,
}

/// The whole summarization result for one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SessionSummary {
    pub files: Vec<FileSummary>,
}

// ── Failure taxonomy ──

/// Classification of a summarizer failure. Retryability is declared by the
/// collaborator at this boundary; the engine never inspects transport
/// exception types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SummarizeErrorKind {
    /// Remote call returned an error (rate-limit/server class is retryable,
    /// auth/not-found class is not).
    ApiError,
    /// Timeout or connectivity loss.
    NetworkError,
    /// The change set exceeded the model's input limit.
    TokenLimit,
    /// Missing/invalid credentials or model; requires a config change.
    ConfigError,
    /// Uncategorized; conservatively retryable.
    UnknownError,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[error("summarization failed ({kind:?}): {message}")]
pub struct SummarizeError {
    pub kind: SummarizeErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl SummarizeError {
    pub fn new(kind: SummarizeErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        SummarizeError {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(SummarizeErrorKind::NetworkError, message, true)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(SummarizeErrorKind::ConfigError, message, false)
    }
}

/// The external summarization collaborator. Opaque, slow (tens of seconds),
/// and possibly failing; any timeout contract lives behind this trait.
pub trait Summarizer {
    fn summarize(&self, session: &Session, changes: &[Change]) -> Result<SessionSummary, SummarizeError>;
}
