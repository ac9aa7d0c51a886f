use std::sync::Arc;

use backend::{BackendError, QuestionProvider};
use practice_core::model::{Question, SubjectId};
use tracing::debug;

use crate::error::EngineError;

/// Obtains the question batch a session is started from.
#[derive(Clone)]
pub struct QuestionBatchLoader {
    provider: Arc<dyn QuestionProvider>,
}

impl QuestionBatchLoader {
    #[must_use]
    pub fn new(provider: Arc<dyn QuestionProvider>) -> Self {
        Self { provider }
    }

    /// Load the batch unmodified. Not retried; retrying is up to the caller.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::EmptyBatch` when nothing matches (including a provider
    /// rejecting the filter), or `EngineError::Transport` for other backend failures.
    pub async fn load(
        &self,
        subject_id: SubjectId,
        tag: Option<&str>,
    ) -> Result<Vec<Question>, EngineError> {
        match self.provider.get_batch(subject_id, tag).await {
            Ok(batch) if batch.is_empty() => Err(EngineError::EmptyBatch),
            Ok(batch) => {
                debug!(subject = %subject_id, count = batch.len(), "question batch loaded");
                Ok(batch)
            }
            Err(BackendError::BadRequest(reason)) => {
                debug!(subject = %subject_id, %reason, "provider rejected filter");
                Err(EngineError::EmptyBatch)
            }
            Err(e) => Err(EngineError::Transport(e)),
        }
    }
}
