use std::sync::Arc;
use std::time::Duration;

use backend::PredictionService;
use practice_core::model::{PredictionRequest, PredictionResult};
use tracing::warn;

use crate::error::PredictionUnavailable;

/// Best-effort access to the prediction service.
#[derive(Clone)]
pub struct PredictionAdapter {
    service: Arc<dyn PredictionService>,
    timeout: Duration,
}

impl PredictionAdapter {
    #[must_use]
    pub fn new(service: Arc<dyn PredictionService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }

    /// # Errors
    ///
    /// Returns `PredictionUnavailable` on failure or timeout.
    pub async fn try_predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResult, PredictionUnavailable> {
        match tokio::time::timeout(self.timeout, self.service.predict(request)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(PredictionUnavailable::TimedOut(self.timeout)),
        }
    }

    /// Never fails: any error collapses into [`PredictionResult::fallback`].
    pub async fn predict(&self, request: &PredictionRequest) -> PredictionResult {
        self.try_predict(request).await.unwrap_or_else(|reason| {
            warn!(topic = %request.topic_id, %reason, "prediction unavailable, using fallback");
            PredictionResult::fallback()
        })
    }
}
