use std::sync::Arc;
use std::time::Duration;

use backend::{AnswerPersistence, BackendError, SubmissionAck};
use practice_core::model::AnswerSubmission;
use tracing::{debug, warn};

use crate::error::PersistenceWarning;

/// Sends answer submissions to the persistence collaborator.
///
/// The local history is appended by the session itself, so a failure here
/// never affects analytics.
#[derive(Clone)]
pub struct AnswerRecorder {
    persistence: Arc<dyn AnswerPersistence>,
    timeout: Duration,
}

impl AnswerRecorder {
    #[must_use]
    pub fn new(persistence: Arc<dyn AnswerPersistence>, timeout: Duration) -> Self {
        Self {
            persistence,
            timeout,
        }
    }

    /// # Errors
    ///
    /// Returns a `PersistenceWarning` when the backend rejects the answer, is
    /// unreachable, or does not reply within the timeout.
    pub async fn record(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<SubmissionAck, PersistenceWarning> {
        let error = match tokio::time::timeout(self.timeout, self.persistence.submit_answer(submission))
            .await
        {
            Ok(Ok(ack)) => {
                debug!(question = %submission.question_id, id = ?ack.submission_id, "answer stored");
                return Ok(ack);
            }
            Ok(Err(e)) => e,
            Err(_) => BackendError::Timeout,
        };
        warn!(question = %submission.question_id, %error, "answer was not persisted");
        Err(PersistenceWarning::new(submission.question_id, error))
    }
}
