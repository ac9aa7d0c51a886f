use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use practice_core::model::{
    AnswerSubmission, PredictionRequest, PredictionResult, Question, SubjectAttempts, SubjectId,
    TestSessionId,
};
use thiserror::Error;

/// Coarse failure categories, each with its own user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Unauthorized,
    Server,
    Connectivity,
}

/// Errors surfaced by backend adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BackendError {
    #[error("not authorized")]
    Unauthorized,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error("server error (status {status})")]
    Server { status: u16 },

    #[error("connection error: {0}")]
    Connectivity(String),

    #[error("request timed out")]
    Timeout,

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl BackendError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Unauthorized => FailureKind::Unauthorized,
            Self::Connectivity(_) | Self::Timeout => FailureKind::Connectivity,
            Self::BadRequest(_) | Self::NotFound | Self::Server { .. } | Self::Malformed(_) => {
                FailureKind::Server
            }
        }
    }
}

/// Acknowledgement of a stored answer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionAck {
    pub submission_id: Option<u64>,
    pub message: Option<String>,
}

/// Server-side totals returned when a test session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestSessionSummary {
    pub test_session_id: TestSessionId,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
}

//
// ─── CONTRACTS ────────────────────────────────────────────────────────────────
//

#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Fetch the ordered question batch for a subject and optional tag.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failures or an invalid filter.
    async fn get_batch(
        &self,
        subject_id: SubjectId,
        tag: Option<&str>,
    ) -> Result<Vec<Question>, BackendError>;
}

#[async_trait]
pub trait AnswerPersistence: Send + Sync {
    /// Store one answered or skipped question.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` when the answer could not be stored.
    async fn submit_answer(&self, submission: &AnswerSubmission)
    -> Result<SubmissionAck, BackendError>;
}

#[async_trait]
pub trait PredictionService: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` on any failure; callers substitute a fallback.
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, BackendError>;
}

#[async_trait]
pub trait SubjectAttemptCounter: Send + Sync {
    /// Per-subject answered-question counts for the current user.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` on transport failures.
    async fn attempt_counts(&self) -> Result<HashMap<SubjectId, SubjectAttempts>, BackendError>;
}

#[async_trait]
pub trait TestSessionLifecycle: Send + Sync {
    /// # Errors
    ///
    /// Returns `BackendError` if the session could not be opened.
    async fn start_session(
        &self,
        subject_id: SubjectId,
        tag: Option<&str>,
    ) -> Result<TestSessionId, BackendError>;

    /// # Errors
    ///
    /// Returns `BackendError::NotFound` for an unknown session, or transport errors.
    async fn end_session(&self, id: TestSessionId) -> Result<TestSessionSummary, BackendError>;
}

/// Aggregates the collaborators behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Backend {
    pub questions: Arc<dyn QuestionProvider>,
    pub answers: Arc<dyn AnswerPersistence>,
    pub predictions: Arc<dyn PredictionService>,
    pub counts: Arc<dyn SubjectAttemptCounter>,
    pub test_sessions: Arc<dyn TestSessionLifecycle>,
}

impl Backend {
    /// Wire every collaborator to one shared adapter.
    #[must_use]
    pub fn from_shared<T>(adapter: T) -> Self
    where
        T: QuestionProvider
            + AnswerPersistence
            + PredictionService
            + SubjectAttemptCounter
            + TestSessionLifecycle
            + Clone
            + 'static,
    {
        Self {
            questions: Arc::new(adapter.clone()),
            answers: Arc::new(adapter.clone()),
            predictions: Arc::new(adapter.clone()),
            counts: Arc::new(adapter.clone()),
            test_sessions: Arc::new(adapter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kinds_group_transport_errors() {
        assert_eq!(BackendError::Unauthorized.kind(), FailureKind::Unauthorized);
        assert_eq!(BackendError::Timeout.kind(), FailureKind::Connectivity);
        assert_eq!(
            BackendError::Connectivity("refused".into()).kind(),
            FailureKind::Connectivity
        );
        assert_eq!(BackendError::Server { status: 502 }.kind(), FailureKind::Server);
        assert_eq!(BackendError::Malformed("eof".into()).kind(), FailureKind::Server);
    }

    #[test]
    fn backend_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Backend>();
    }
}
