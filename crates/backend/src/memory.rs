use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use practice_core::model::{
    AI_UNLOCK_THRESHOLD, AnswerSubmission, ConfidenceLevel, MotivationalMessage,
    PredictionRequest, PredictionResult, Question, SubjectAttempts, SubjectId, TestSessionId,
};
use tracing::debug;

use crate::contracts::{
    AnswerPersistence, Backend, BackendError, PredictionService, QuestionProvider,
    SubjectAttemptCounter, SubmissionAck, TestSessionLifecycle, TestSessionSummary,
};

/// Prediction used before any answer exists for a topic.
const NEUTRAL_PERCENTAGE: u8 = 50;

#[derive(Debug, Clone)]
struct BankEntry {
    question: Question,
    tags: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    bank: Vec<BankEntry>,
    submissions: Vec<AnswerSubmission>,
    baseline_attempts: HashMap<SubjectId, u32>,
    open_sessions: HashMap<TestSessionId, SubjectId>,
    next_submission_id: u64,
    next_test_session_id: u64,
}

/// In-memory backend for tests, demos and offline use.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, BackendError> {
        self.state
            .lock()
            .map_err(|e| BackendError::Connectivity(e.to_string()))
    }

    /// Add a question to the bank under the given tags.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the state lock is poisoned.
    pub fn add_question(&self, question: Question, tags: &[&str]) -> Result<(), BackendError> {
        let tags = tags.iter().map(|t| t.trim().to_lowercase()).collect();
        self.lock()?.bank.push(BankEntry { question, tags });
        Ok(())
    }

    /// Pretend the user already answered `count` questions in `subject_id`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the state lock is poisoned.
    pub fn seed_attempts(&self, subject_id: SubjectId, count: u32) -> Result<(), BackendError> {
        self.lock()?.baseline_attempts.insert(subject_id, count);
        Ok(())
    }

    /// Everything stored so far, in submission order.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the state lock is poisoned.
    pub fn submissions(&self) -> Result<Vec<AnswerSubmission>, BackendError> {
        Ok(self.lock()?.submissions.clone())
    }

    /// # Errors
    ///
    /// Returns `BackendError` if the state lock is poisoned.
    pub fn open_session_count(&self) -> Result<usize, BackendError> {
        Ok(self.lock()?.open_sessions.len())
    }
}

fn tag_matches(entry: &BankEntry, tag: Option<&str>) -> bool {
    match tag.map(str::trim).filter(|t| !t.is_empty()) {
        None => true,
        Some(tag) => {
            let needle = tag.to_lowercase();
            entry.tags.iter().any(|t| t.contains(&needle))
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn topic_percentage(submissions: &[AnswerSubmission], request: &PredictionRequest) -> u8 {
    let prior: Vec<&AnswerSubmission> = submissions
        .iter()
        .filter(|s| s.subject_id == request.subject_id && s.topic_id == request.topic_id)
        .collect();
    if prior.is_empty() {
        return NEUTRAL_PERCENTAGE;
    }
    let correct = prior.iter().filter(|s| s.is_correct).count();
    let share = correct as f64 / prior.len() as f64;
    (share * 100.0).round().clamp(0.0, 100.0) as u8
}

fn motivation_for(percentage: u8, is_correct: bool) -> MotivationalMessage {
    let (kind, icon, title) = match percentage {
        80.. => ("excellent", "🚀", "Excellent trajectory"),
        65..=79 => ("strong", "💪", "Strong progress"),
        50..=64 => ("good", "👍", "Good footing"),
        35..=49 => ("medium", "📈", "Room to grow"),
        _ => ("challenging", "🎯", "Challenging topic"),
    };
    let message = if is_correct {
        format!("Nice answer. You are likely to solve similar questions about {percentage}% of the time.")
    } else {
        format!(
            "Not this time, but similar questions go your way about {percentage}% of the time. Review the explanation and try again."
        )
    };
    MotivationalMessage {
        title: title.to_string(),
        message,
        kind: kind.to_string(),
        icon: icon.to_string(),
    }
}

#[async_trait]
impl QuestionProvider for InMemoryBackend {
    async fn get_batch(
        &self,
        subject_id: SubjectId,
        tag: Option<&str>,
    ) -> Result<Vec<Question>, BackendError> {
        let guard = self.lock()?;
        let batch: Vec<Question> = guard
            .bank
            .iter()
            .filter(|entry| entry.question.subject_id() == subject_id && tag_matches(entry, tag))
            .map(|entry| entry.question.clone())
            .collect();
        debug!(subject = %subject_id, ?tag, count = batch.len(), "served question batch");
        Ok(batch)
    }
}

#[async_trait]
impl AnswerPersistence for InMemoryBackend {
    async fn submit_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<SubmissionAck, BackendError> {
        let mut guard = self.lock()?;
        if let Some(id) = submission.test_session_id
            && !guard.open_sessions.contains_key(&id)
        {
            return Err(BackendError::BadRequest(format!("unknown test session {id}")));
        }
        guard.next_submission_id += 1;
        let submission_id = guard.next_submission_id;
        guard.submissions.push(submission.clone());
        Ok(SubmissionAck {
            submission_id: Some(submission_id),
            message: Some("answer stored".to_string()),
        })
    }
}

#[async_trait]
impl PredictionService for InMemoryBackend {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, BackendError> {
        let percentage = topic_percentage(&self.lock()?.submissions, request);
        Ok(PredictionResult::new(
            percentage,
            ConfidenceLevel::from_percentage(percentage),
            motivation_for(percentage, request.is_correct),
        ))
    }
}

#[async_trait]
impl SubjectAttemptCounter for InMemoryBackend {
    async fn attempt_counts(&self) -> Result<HashMap<SubjectId, SubjectAttempts>, BackendError> {
        let guard = self.lock()?;
        let mut totals: HashMap<SubjectId, u32> = guard.baseline_attempts.clone();
        for submission in &guard.submissions {
            *totals.entry(submission.subject_id).or_default() += 1;
        }
        Ok(totals
            .into_iter()
            .map(|(subject, total_questions)| {
                let attempts = SubjectAttempts {
                    total_questions,
                    ai_enabled: total_questions >= AI_UNLOCK_THRESHOLD,
                };
                (subject, attempts)
            })
            .collect())
    }
}

#[async_trait]
impl TestSessionLifecycle for InMemoryBackend {
    async fn start_session(
        &self,
        subject_id: SubjectId,
        _tag: Option<&str>,
    ) -> Result<TestSessionId, BackendError> {
        let mut guard = self.lock()?;
        guard.next_test_session_id += 1;
        let id = TestSessionId::new(guard.next_test_session_id);
        guard.open_sessions.insert(id, subject_id);
        Ok(id)
    }

    async fn end_session(&self, id: TestSessionId) -> Result<TestSessionSummary, BackendError> {
        let mut guard = self.lock()?;
        if guard.open_sessions.remove(&id).is_none() {
            return Err(BackendError::NotFound);
        }
        let mut total = 0_u32;
        let mut correct = 0_u32;
        let mut incorrect = 0_u32;
        for submission in guard
            .submissions
            .iter()
            .filter(|s| s.test_session_id == Some(id))
        {
            total += 1;
            correct += u32::from(submission.is_correct);
            // Skips are neither correct nor incorrect.
            incorrect += u32::from(!submission.is_correct && !submission.is_skipped());
        }
        Ok(TestSessionSummary {
            test_session_id: id,
            total_questions: total,
            correct_answers: correct,
            incorrect_answers: incorrect,
        })
    }
}

impl Backend {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_shared(InMemoryBackend::new())
    }

    /// Like [`Backend::in_memory`] but sharing an existing store.
    #[must_use]
    pub fn with_memory(store: &InMemoryBackend) -> Self {
        Self::from_shared(store.clone())
    }
}
