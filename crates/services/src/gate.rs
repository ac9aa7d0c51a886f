use std::sync::Arc;
use std::time::Duration;

use backend::SubjectAttemptCounter;
use practice_core::model::{AiAvailability, SubjectId};
use tracing::warn;

/// Decides whether predictions may be shown for a subject.
#[derive(Clone)]
pub struct AiGate {
    counter: Arc<dyn SubjectAttemptCounter>,
    threshold: u32,
    timeout: Duration,
}

impl AiGate {
    #[must_use]
    pub fn new(counter: Arc<dyn SubjectAttemptCounter>, threshold: u32, timeout: Duration) -> Self {
        Self {
            counter,
            threshold,
            timeout,
        }
    }

    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Only the attempt count matters; an unreadable counter means zero attempts.
    pub async fn availability(&self, subject_id: SubjectId) -> AiAvailability {
        let attempts = match tokio::time::timeout(self.timeout, self.counter.attempt_counts()).await {
            Ok(Ok(counts)) => counts.get(&subject_id).map_or(0, |c| c.total_questions),
            Ok(Err(error)) => {
                warn!(subject = %subject_id, %error, "attempt counts unavailable");
                0
            }
            Err(_) => {
                warn!(subject = %subject_id, "attempt counts timed out");
                0
            }
        };
        AiAvailability::for_attempts(attempts, self.threshold)
    }
}
