use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use backend::{Backend, SubmissionAck, TestSessionLifecycle, TestSessionSummary};
use chrono::{DateTime, Utc};
use practice_core::Clock;
use practice_core::analytics::{SessionReport, TopicCatalog, TopicNames};
use practice_core::model::{
    AiAvailability, ChoiceLabel, PredictionResult, SubjectId, TestSessionId,
};
use practice_core::session::{
    CheckOutcome, CloseOutcome, PersistTicket, PracticeSession, PredictionTicket, SessionContext,
    SessionGeneration, SubmitOutcome,
};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, PersistenceWarning};
use crate::gate::AiGate;
use crate::loader::QuestionBatchLoader;
use crate::prediction::PredictionAdapter;
use crate::recorder::AnswerRecorder;

//
// ─── FEEDBACK ─────────────────────────────────────────────────────────────────
//

/// What to show in the prediction area after a check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionDisplay {
    /// The question was skipped; no prediction was requested.
    Skipped,
    /// Not enough answers in this subject yet.
    Locked { remaining: u32 },
    Shown(PredictionResult),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFeedback {
    pub outcome: CheckOutcome,
    pub display: PredictionDisplay,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFeedback {
    pub outcome: SubmitOutcome,
    pub warning: Option<PersistenceWarning>,
}

//
// ─── ENGINE ───────────────────────────────────────────────────────────────────
//

/// Drives practice sessions against the backend collaborators.
///
/// The engine holds no session state; each `PracticeSession` is owned by the caller.
#[derive(Clone)]
pub struct PracticeEngine {
    clock: Clock,
    config: EngineConfig,
    loader: QuestionBatchLoader,
    recorder: AnswerRecorder,
    predictions: PredictionAdapter,
    gate: AiGate,
    lifecycle: Arc<dyn TestSessionLifecycle>,
    topic_names: Arc<dyn TopicNames + Send + Sync>,
    generations: Arc<AtomicU64>,
}

impl PracticeEngine {
    #[must_use]
    pub fn new(backend: &Backend, config: EngineConfig) -> Self {
        Self {
            clock: Clock::default(),
            config,
            loader: QuestionBatchLoader::new(Arc::clone(&backend.questions)),
            recorder: AnswerRecorder::new(Arc::clone(&backend.answers), config.persist_timeout),
            predictions: PredictionAdapter::new(
                Arc::clone(&backend.predictions),
                config.prediction_timeout,
            ),
            gate: AiGate::new(
                Arc::clone(&backend.counts),
                config.ai_threshold,
                config.prediction_timeout,
            ),
            lifecycle: Arc::clone(&backend.test_sessions),
            topic_names: Arc::new(TopicCatalog::new()),
            generations: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_topic_names(mut self, names: Arc<dyn TopicNames + Send + Sync>) -> Self {
        self.topic_names = names;
        self
    }

    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn next_generation(&self) -> SessionGeneration {
        SessionGeneration::new(self.generations.fetch_add(1, Ordering::Relaxed) + 1)
    }

    // ─── lifecycle ───

    /// Open a backend test session; failures are logged and yield `None`.
    pub async fn open_test_session(
        &self,
        subject_id: SubjectId,
        tag: Option<&str>,
    ) -> Option<TestSessionId> {
        let call = self.lifecycle.start_session(subject_id, tag);
        match tokio::time::timeout(self.config.lifecycle_timeout, call).await {
            Ok(Ok(id)) => {
                info!(subject = %subject_id, test_session = %id, "test session opened");
                Some(id)
            }
            Ok(Err(error)) => {
                warn!(subject = %subject_id, %error, "could not open test session");
                None
            }
            Err(_) => {
                warn!(subject = %subject_id, "opening test session timed out");
                None
            }
        }
    }

    async fn end_test_session(&self, id: TestSessionId) -> Option<TestSessionSummary> {
        match tokio::time::timeout(self.config.lifecycle_timeout, self.lifecycle.end_session(id)).await
        {
            Ok(Ok(summary)) => {
                info!(test_session = %id, total = summary.total_questions, "test session ended");
                Some(summary)
            }
            Ok(Err(error)) => {
                warn!(test_session = %id, %error, "could not end test session");
                None
            }
            Err(_) => {
                warn!(test_session = %id, "ending test session timed out");
                None
            }
        }
    }

    /// Load a batch and start a fresh session at its first question.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::EmptyBatch` when nothing matches, or
    /// `EngineError::Transport` when the batch could not be fetched.
    pub async fn start(&self, context: SessionContext) -> Result<PracticeSession, EngineError> {
        let questions = self
            .loader
            .load(context.subject_id, context.tag.as_deref())
            .await?;
        let generation = self.next_generation();
        debug!(generation = generation.value(), count = questions.len(), "session started");
        Ok(PracticeSession::new(questions, context, generation, self.now())?)
    }

    // ─── transitions ───

    /// # Errors
    ///
    /// Returns `EngineError::Session` if the session rejects the selection.
    pub fn select(
        &self,
        session: &mut PracticeSession,
        label: ChoiceLabel,
    ) -> Result<Option<ChoiceLabel>, EngineError> {
        Ok(session.select_choice(label)?.cloned())
    }

    /// # Errors
    ///
    /// Returns `EngineError::Session` outside the `Unanswered` phase.
    pub fn check(&self, session: &mut PracticeSession) -> Result<CheckOutcome, EngineError> {
        Ok(session.check()?)
    }

    /// Detached prediction call for a ticket; hand the output to
    /// [`PracticeSession::accept_prediction`] when it completes.
    pub fn prediction_task(
        &self,
        ticket: PredictionTicket,
    ) -> impl Future<Output = (PredictionTicket, PredictionResult)> + Send + 'static {
        let adapter = self.predictions.clone();
        async move {
            let result = adapter.predict(&ticket.request).await;
            (ticket, result)
        }
    }

    /// Check, fetch the prediction, and show it only if the subject has unlocked it.
    ///
    /// Every answered check calls the prediction service; the gate only decides
    /// whether the result is shown.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Session` outside the `Unanswered` phase. Prediction
    /// failures never surface here.
    pub async fn check_and_predict(
        &self,
        session: &mut PracticeSession,
    ) -> Result<CheckFeedback, EngineError> {
        let outcome = session.check()?;
        let Some(ticket) = outcome.prediction.clone() else {
            return Ok(CheckFeedback {
                outcome,
                display: PredictionDisplay::Skipped,
            });
        };

        let (ticket, result) = self.prediction_task(ticket).await;
        let accepted = session.accept_prediction(&ticket, result.clone());
        debug_assert!(accepted, "session is borrowed for the whole check");

        let display = match self.gate.availability(ticket.request.subject_id).await {
            AiAvailability::Locked { remaining } => PredictionDisplay::Locked { remaining },
            AiAvailability::Available => PredictionDisplay::Shown(result),
        };
        Ok(CheckFeedback { outcome, display })
    }

    /// # Errors
    ///
    /// Returns `EngineError::Session` outside the `Checked` phase.
    pub fn submit(&self, session: &mut PracticeSession) -> Result<SubmitOutcome, EngineError> {
        Ok(session.submit(self.now())?)
    }

    /// Detached persistence call for a submitted answer.
    pub fn persistence_task(
        &self,
        ticket: PersistTicket,
    ) -> impl Future<Output = (PersistTicket, Result<SubmissionAck, PersistenceWarning>)> + Send + 'static
    {
        let recorder = self.recorder.clone();
        async move {
            let result = recorder.record(&ticket.submission).await;
            (ticket, result)
        }
    }

    /// Submit and persist in one step. Persistence failures come back as a warning.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Session` outside the `Checked` phase.
    pub async fn submit_and_record(
        &self,
        session: &mut PracticeSession,
    ) -> Result<SubmitFeedback, EngineError> {
        let outcome = session.submit(self.now())?;
        let (ticket, result) = self.persistence_task(outcome.persist.clone()).await;
        let warning = match result {
            Ok(_) => None,
            Err(_) if !session.accepts_persistence(&ticket) => {
                debug!(question = %ticket.question_id(), "dropping warning for a closed session");
                None
            }
            Err(warning) => Some(warning),
        };
        Ok(SubmitFeedback { outcome, warning })
    }

    /// Close the report and end the backend test session, best-effort.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Session` outside the `ReportReady` phase.
    pub async fn close(&self, session: &mut PracticeSession) -> Result<CloseOutcome, EngineError> {
        let outcome = session.close_report()?;
        if let Some(id) = outcome.test_session_id {
            self.end_test_session(id).await;
        }
        Ok(outcome)
    }

    #[must_use]
    pub fn report(&self, session: &PracticeSession) -> Option<SessionReport> {
        session.report(self.topic_names.as_ref())
    }

    pub async fn ai_availability(&self, subject_id: SubjectId) -> AiAvailability {
        self.gate.availability(subject_id).await
    }
}
