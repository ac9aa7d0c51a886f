//! Shared error types for the services crate.

use std::time::Duration;

use backend::{BackendError, FailureKind};
use practice_core::model::QuestionId;
use practice_core::session::SessionError;
use thiserror::Error;

/// Errors emitted by `PracticeEngine`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("no questions available for this subject and tag")]
    EmptyBatch,
    #[error(transparent)]
    Transport(#[from] BackendError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl EngineError {
    /// Whether re-invoking the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Non-fatal: an answer was recorded locally but not stored by the backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("answer to question {question_id} was not saved: {error}")]
pub struct PersistenceWarning {
    pub question_id: QuestionId,
    pub kind: FailureKind,
    #[source]
    pub error: BackendError,
}

impl PersistenceWarning {
    #[must_use]
    pub fn new(question_id: QuestionId, error: BackendError) -> Self {
        Self {
            question_id,
            kind: error.kind(),
            error,
        }
    }

    /// User-facing text for the failure category.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self.kind {
            FailureKind::Unauthorized => "Your session has expired. Please log in again.",
            FailureKind::Server => {
                "The server could not save your answer. Your results are still kept for this session."
            }
            FailureKind::Connectivity => {
                "Check your internet connection. Your answer was kept for this session."
            }
        }
    }
}

/// Why a prediction could not be obtained. Never shown to the learner.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PredictionUnavailable {
    #[error("prediction timed out after {0:?}")]
    TimedOut(Duration),
    #[error("prediction failed: {0}")]
    Failed(#[from] BackendError),
}
