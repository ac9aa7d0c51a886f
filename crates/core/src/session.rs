//! Sans-I/O practice session state machine.
//!
//! A `PracticeSession` owns one fixed batch of questions and moves through
//! `Unanswered -> Checked -> (Recorded) -> Unanswered | ReportReady -> Closed`.
//! Async work (predictions, persistence) happens outside; the session hands out
//! tickets and later decides whether a completed result still applies.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::analytics::{SessionReport, TopicNames};
use crate::model::{
    AnswerRecord, AnswerSubmission, ChoiceLabel, PredictionRequest, PredictionResult, Question,
    QuestionId, SubjectId, TestSessionId,
};
use crate::time::elapsed_whole_seconds;

//
// ─── PHASES & ERRORS ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    Unanswered,
    Checked,
    /// Transient: the answer has been appended and the session is advancing.
    Recorded,
    ReportReady,
    Closed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unanswered => "unanswered",
            Self::Checked => "checked",
            Self::Recorded => "recorded",
            Self::ReportReady => "report-ready",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionAction {
    Select,
    Check,
    Submit,
    Close,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Select => "select a choice",
            Self::Check => "check",
            Self::Submit => "submit",
            Self::Close => "close the report",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for this selection")]
    EmptyBatch,

    #[error("session is no longer active")]
    Inactive,

    #[error("cannot {action} while the session is {phase}")]
    InvalidPhase {
        action: SessionAction,
        phase: SessionPhase,
    },

    #[error("choice {0} is not offered by the current question")]
    UnknownChoice(ChoiceLabel),
}

//
// ─── CONTEXT & TICKETS ────────────────────────────────────────────────────────
//

/// Identifies one session instance; results tagged with an older generation are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionGeneration(u64);

impl SessionGeneration {
    #[must_use]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// What the session was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub subject_id: SubjectId,
    pub tag: Option<String>,
    /// Forwarded on every answer submission when present.
    pub test_session_id: Option<TestSessionId>,
}

impl SessionContext {
    #[must_use]
    pub fn new(subject_id: SubjectId) -> Self {
        Self {
            subject_id,
            tag: None,
            test_session_id: None,
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.tag = (!tag.trim().is_empty()).then_some(tag);
        self
    }

    #[must_use]
    pub fn with_test_session(mut self, id: Option<TestSessionId>) -> Self {
        self.test_session_id = id;
        self
    }
}

/// Issued by `check` for a prediction call about one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionTicket {
    generation: SessionGeneration,
    index: usize,
    question_id: QuestionId,
    pub request: PredictionRequest,
}

impl PredictionTicket {
    #[must_use]
    pub fn generation(&self) -> SessionGeneration {
        self.generation
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }
}

/// Issued by `submit` for the persistence call of the appended record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistTicket {
    generation: SessionGeneration,
    pub submission: AnswerSubmission,
}

impl PersistTicket {
    #[must_use]
    pub fn generation(&self) -> SessionGeneration {
        self.generation
    }

    #[must_use]
    pub fn question_id(&self) -> QuestionId {
        self.submission.question_id
    }
}

//
// ─── OUTCOMES ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub question_id: QuestionId,
    pub selected: Option<ChoiceLabel>,
    pub is_correct: bool,
    /// `None` for a skip: no prediction is requested without a selection.
    pub prediction: Option<PredictionTicket>,
}

impl CheckOutcome {
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.selected.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub record: AnswerRecord,
    pub persist: PersistTicket,
    pub progress: SessionProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseOutcome {
    /// Backend test session to end, if one was opened.
    pub test_session_id: Option<TestSessionId>,
    pub answered: usize,
}

/// Discrete user actions accepted by [`PracticeSession::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Select(ChoiceLabel),
    Check,
    Submit,
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Selected(Option<ChoiceLabel>),
    Checked(CheckOutcome),
    Submitted(SubmitOutcome),
    Closed(CloseOutcome),
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

pub struct PracticeSession {
    generation: SessionGeneration,
    context: SessionContext,
    questions: Vec<Question>,
    index: usize,
    selected: Option<ChoiceLabel>,
    phase: SessionPhase,
    explanation_shown: bool,
    last_check: Option<bool>,
    prediction: Option<PredictionResult>,
    history: Vec<AnswerRecord>,
    started_at: DateTime<Utc>,
    question_started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for PracticeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticeSession")
            .field("generation", &self.generation)
            .field("subject_id", &self.context.subject_id)
            .field("phase", &self.phase)
            .field("index", &self.index)
            .field("total", &self.questions.len())
            .field("answered", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl PracticeSession {
    /// Start a session at the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyBatch` if `questions` is empty.
    pub fn new(
        questions: Vec<Question>,
        context: SessionContext,
        generation: SessionGeneration,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::EmptyBatch);
        }
        Ok(Self {
            generation,
            context,
            history: Vec::with_capacity(questions.len()),
            questions,
            index: 0,
            selected: None,
            phase: SessionPhase::Unanswered,
            explanation_shown: false,
            last_check: None,
            prediction: None,
            started_at: now,
            question_started_at: now,
            completed_at: None,
        })
    }

    fn require(&self, action: SessionAction, expected: SessionPhase) -> Result<(), SessionError> {
        if self.phase == SessionPhase::Closed {
            return Err(SessionError::Inactive);
        }
        if self.phase != expected {
            return Err(SessionError::InvalidPhase {
                action,
                phase: self.phase,
            });
        }
        Ok(())
    }

    /// Toggle `label` as the current selection and return the new selection.
    ///
    /// # Errors
    ///
    /// Fails outside `Unanswered`, or when the label is not a choice of the
    /// current question.
    pub fn select_choice(&mut self, label: ChoiceLabel) -> Result<Option<&ChoiceLabel>, SessionError> {
        self.require(SessionAction::Select, SessionPhase::Unanswered)?;
        let offered = self
            .questions
            .get(self.index)
            .is_some_and(|question| question.has_choice(&label));
        if !offered {
            return Err(SessionError::UnknownChoice(label));
        }

        if self.selected.as_ref() == Some(&label) {
            self.selected = None;
        } else {
            self.selected = Some(label);
        }
        Ok(self.selected.as_ref())
    }

    /// Reveal correctness for the current question.
    ///
    /// Checking with no selection is allowed and counts as a skip at submit time.
    ///
    /// # Errors
    ///
    /// Fails outside `Unanswered`.
    pub fn check(&mut self) -> Result<CheckOutcome, SessionError> {
        self.require(SessionAction::Check, SessionPhase::Unanswered)?;
        let question = self.questions.get(self.index).ok_or(SessionError::Inactive)?;

        let is_correct = question.is_correct(self.selected.as_ref());
        let prediction = self.selected.as_ref().map(|_| PredictionTicket {
            generation: self.generation,
            index: self.index,
            question_id: question.id(),
            request: PredictionRequest::for_question(question, is_correct),
        });
        let outcome = CheckOutcome {
            question_id: question.id(),
            selected: self.selected.clone(),
            is_correct,
            prediction,
        };

        self.phase = SessionPhase::Checked;
        self.explanation_shown = true;
        self.last_check = Some(is_correct);
        Ok(outcome)
    }

    /// Whether a prediction ticket still refers to the question on screen.
    #[must_use]
    pub fn is_current(&self, ticket: &PredictionTicket) -> bool {
        self.phase == SessionPhase::Checked
            && ticket.generation == self.generation
            && ticket.index == self.index
            && self
                .questions
                .get(self.index)
                .is_some_and(|question| question.id() == ticket.question_id)
    }

    /// Attach a completed prediction; stale tickets are ignored.
    pub fn accept_prediction(&mut self, ticket: &PredictionTicket, result: PredictionResult) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.prediction = Some(result);
        true
    }

    /// Record the current question and advance.
    ///
    /// # Errors
    ///
    /// Fails outside `Checked`.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<SubmitOutcome, SessionError> {
        self.require(SessionAction::Submit, SessionPhase::Checked)?;
        let question = self.questions.get(self.index).ok_or(SessionError::Inactive)?;

        let record = match self.selected.take() {
            Some(label) => {
                let elapsed = elapsed_whole_seconds(self.question_started_at, now);
                AnswerRecord::answered(question, label, elapsed)
            }
            None => AnswerRecord::skipped(question),
        };
        let persist = PersistTicket {
            generation: self.generation,
            submission: AnswerSubmission::from_record(&record, self.context.test_session_id),
        };

        self.history.push(record.clone());
        self.phase = SessionPhase::Recorded;
        self.advance(now);

        Ok(SubmitOutcome {
            record,
            persist,
            progress: self.progress(),
        })
    }

    fn advance(&mut self, now: DateTime<Utc>) {
        if self.index + 1 < self.questions.len() {
            self.index += 1;
            self.selected = None;
            self.explanation_shown = false;
            self.last_check = None;
            self.prediction = None;
            self.question_started_at = now;
            self.phase = SessionPhase::Unanswered;
        } else {
            self.completed_at = Some(now);
            self.phase = SessionPhase::ReportReady;
        }
    }

    /// Persistence results only need the session to still be alive.
    #[must_use]
    pub fn accepts_persistence(&self, ticket: &PersistTicket) -> bool {
        self.phase != SessionPhase::Closed && ticket.generation == self.generation
    }

    /// Discard all session state.
    ///
    /// # Errors
    ///
    /// Fails outside `ReportReady`.
    pub fn close_report(&mut self) -> Result<CloseOutcome, SessionError> {
        self.require(SessionAction::Close, SessionPhase::ReportReady)?;
        let outcome = CloseOutcome {
            test_session_id: self.context.test_session_id,
            answered: self.history.len(),
        };

        self.questions.clear();
        self.history.clear();
        self.index = 0;
        self.selected = None;
        self.explanation_shown = false;
        self.last_check = None;
        self.prediction = None;
        self.phase = SessionPhase::Closed;
        Ok(outcome)
    }

    /// Dispatch a user action.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying transition; state is unchanged on error.
    pub fn apply(&mut self, event: SessionEvent, now: DateTime<Utc>) -> Result<SessionUpdate, SessionError> {
        match event {
            SessionEvent::Select(label) => self
                .select_choice(label)
                .map(|selected| SessionUpdate::Selected(selected.cloned())),
            SessionEvent::Check => self.check().map(SessionUpdate::Checked),
            SessionEvent::Submit => self.submit(now).map(SessionUpdate::Submitted),
            SessionEvent::Close => self.close_report().map(SessionUpdate::Closed),
        }
    }

    /// Aggregated report, available once the last question is recorded.
    #[must_use]
    pub fn report(&self, names: &dyn TopicNames) -> Option<SessionReport> {
        (self.phase == SessionPhase::ReportReady)
            .then(|| SessionReport::from_records(&self.history, names))
    }

    // ─── getters ───

    #[must_use]
    pub fn generation(&self) -> SessionGeneration {
        self.generation
    }

    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.context.subject_id
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase != SessionPhase::Closed
    }

    /// The question on screen; `None` once the report is reached.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            SessionPhase::Unanswered | SessionPhase::Checked | SessionPhase::Recorded => {
                self.questions.get(self.index)
            }
            SessionPhase::ReportReady | SessionPhase::Closed => None,
        }
    }

    #[must_use]
    pub fn selected(&self) -> Option<&ChoiceLabel> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn explanation_shown(&self) -> bool {
        self.explanation_shown
    }

    /// Correctness of the current question once checked.
    #[must_use]
    pub fn last_check(&self) -> Option<bool> {
        self.last_check
    }

    #[must_use]
    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.prediction.as_ref()
    }

    #[must_use]
    pub fn history(&self) -> &[AnswerRecord] {
        &self.history
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = self.history.len();
        SessionProgress {
            total,
            answered,
            remaining: total.saturating_sub(answered),
            is_complete: self.phase == SessionPhase::ReportReady,
        }
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn question_started_at(&self) -> DateTime<Utc> {
        self.question_started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::analytics::TopicCatalog;
    use crate::model::{ConfidenceLevel, TopicId, question_draft};
    use crate::time::fixed_now;

    fn label(raw: &str) -> ChoiceLabel {
        ChoiceLabel::new(raw).unwrap()
    }

    fn session_with(count: u64, test_session: Option<TestSessionId>) -> PracticeSession {
        let questions = (1..=count)
            .map(|id| question_draft(id, id, 2).validate().unwrap())
            .collect();
        let context = SessionContext::new(SubjectId::new(1)).with_test_session(test_session);
        PracticeSession::new(questions, context, SessionGeneration::new(1), fixed_now()).unwrap()
    }

    fn session(count: u64) -> PracticeSession {
        session_with(count, None)
    }

    fn answer(session: &mut PracticeSession, choice: Option<&str>, secs: i64) -> SubmitOutcome {
        if let Some(choice) = choice {
            session.select_choice(label(choice)).unwrap();
        }
        session.check().unwrap();
        let now = session.question_started_at() + Duration::seconds(secs);
        session.submit(now).unwrap()
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = PracticeSession::new(
            Vec::new(),
            SessionContext::new(SubjectId::new(1)),
            SessionGeneration::new(1),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, SessionError::EmptyBatch);
    }

    #[test]
    fn starts_unanswered_at_first_question() {
        let s = session(2);
        assert_eq!(s.phase(), SessionPhase::Unanswered);
        assert_eq!(s.index(), 0);
        assert!(s.selected().is_none());
        assert!(s.history().is_empty());
        assert_eq!(s.question_started_at(), fixed_now());
    }

    #[test]
    fn selecting_same_label_twice_clears_selection() {
        let mut s = session(1);
        assert_eq!(s.select_choice(label("A")).unwrap(), Some(&label("A")));
        assert_eq!(s.select_choice(label("A")).unwrap(), None);
        assert!(s.selected().is_none());

        s.select_choice(label("A")).unwrap();
        s.select_choice(label("C")).unwrap();
        assert_eq!(s.selected(), Some(&label("C")));
    }

    #[test]
    fn unknown_choice_is_rejected_without_changing_selection() {
        let mut s = session(1);
        s.select_choice(label("A")).unwrap();
        assert_eq!(
            s.select_choice(label("E")).unwrap_err(),
            SessionError::UnknownChoice(label("E"))
        );
        assert_eq!(s.selected(), Some(&label("A")));
    }

    #[test]
    fn check_reveals_correctness_and_issues_prediction_ticket() {
        let mut s = session(1);
        s.select_choice(label("B")).unwrap();
        let outcome = s.check().unwrap();

        assert!(outcome.is_correct);
        assert_eq!(s.phase(), SessionPhase::Checked);
        assert!(s.explanation_shown());
        assert_eq!(s.last_check(), Some(true));

        let ticket = outcome.prediction.unwrap();
        assert!(ticket.request.is_correct);
        assert_eq!(ticket.request.topic_id, TopicId::new(1));
        assert_eq!(ticket.question_id(), QuestionId::new(1));
    }

    #[test]
    fn selection_is_locked_after_check() {
        let mut s = session(1);
        s.select_choice(label("A")).unwrap();
        s.check().unwrap();
        assert_eq!(
            s.select_choice(label("B")).unwrap_err(),
            SessionError::InvalidPhase {
                action: SessionAction::Select,
                phase: SessionPhase::Checked
            }
        );
        assert_eq!(s.selected(), Some(&label("A")));
    }

    #[test]
    fn empty_check_is_a_skip_without_prediction() {
        let mut s = session(2);
        let outcome = s.check().unwrap();
        assert!(outcome.is_skipped());
        assert!(!outcome.is_correct);
        assert!(outcome.prediction.is_none());

        let submitted = s.submit(fixed_now() + Duration::seconds(40)).unwrap();
        assert!(submitted.record.is_skipped());
        assert!(!submitted.record.is_correct);
        assert_eq!(submitted.record.elapsed_seconds, 0);
        assert!(submitted.persist.submission.is_skipped());
    }

    #[test]
    fn submit_requires_check() {
        let mut s = session(1);
        s.select_choice(label("B")).unwrap();
        assert!(matches!(
            s.submit(fixed_now()),
            Err(SessionError::InvalidPhase { action: SessionAction::Submit, .. })
        ));
        assert!(s.history().is_empty());
        assert_eq!(s.phase(), SessionPhase::Unanswered);
    }

    #[test]
    fn submit_measures_time_and_advances() {
        let mut s = session(2);
        let first = answer(&mut s, Some("B"), 12);
        assert_eq!(first.record.elapsed_seconds, 12);
        assert!(first.record.is_correct);
        assert_eq!(first.progress.answered, 1);
        assert_eq!(first.progress.remaining, 1);
        assert!(!first.progress.is_complete);

        assert_eq!(s.index(), 1);
        assert_eq!(s.phase(), SessionPhase::Unanswered);
        assert!(s.selected().is_none());
        assert!(!s.explanation_shown());
        assert!(s.prediction().is_none());
        assert_eq!(s.question_started_at(), fixed_now() + Duration::seconds(12));
    }

    #[test]
    fn last_submit_reaches_report_ready() {
        let mut s = session(2);
        answer(&mut s, Some("B"), 5);
        let last = answer(&mut s, Some("A"), 7);
        assert!(last.progress.is_complete);
        assert_eq!(s.phase(), SessionPhase::ReportReady);
        assert!(s.current_question().is_none());
        assert!(s.completed_at().is_some());
        assert_eq!(s.history().len(), 2);
        assert_eq!(s.history()[0].question_id, QuestionId::new(1));
        assert_eq!(s.history()[1].question_id, QuestionId::new(2));

        let report = s.report(&TopicCatalog::new()).unwrap();
        let totals = report.totals;
        assert_eq!(totals.total_questions, 2);
        assert_eq!(totals.correct + totals.incorrect + totals.skipped, 2);
    }

    #[test]
    fn report_is_unavailable_before_the_end() {
        let s = session(1);
        assert!(s.report(&TopicCatalog::new()).is_none());
    }

    #[test]
    fn close_is_rejected_outside_report_ready() {
        let mut s = session(1);
        assert_eq!(
            s.close_report().unwrap_err(),
            SessionError::InvalidPhase {
                action: SessionAction::Close,
                phase: SessionPhase::Unanswered
            }
        );
        assert!(s.is_active());
    }

    #[test]
    fn close_clears_state_and_returns_test_session() {
        let mut s = session_with(1, Some(TestSessionId::new(77)));
        let submitted = answer(&mut s, Some("B"), 3);
        assert_eq!(
            submitted.persist.submission.test_session_id,
            Some(TestSessionId::new(77))
        );

        let closed = s.close_report().unwrap();
        assert_eq!(closed.test_session_id, Some(TestSessionId::new(77)));
        assert_eq!(closed.answered, 1);
        assert_eq!(s.phase(), SessionPhase::Closed);
        assert!(s.history().is_empty());
        assert!(s.questions().is_empty());
        assert_eq!(s.check().unwrap_err(), SessionError::Inactive);
        assert_eq!(s.select_choice(label("A")).unwrap_err(), SessionError::Inactive);
    }

    #[test]
    fn stale_prediction_is_discarded_after_advancing() {
        let mut s = session(2);
        s.select_choice(label("B")).unwrap();
        let ticket = s.check().unwrap().prediction.unwrap();
        s.submit(fixed_now()).unwrap();

        assert!(!s.accept_prediction(&ticket, PredictionResult::fallback()));
        assert!(s.prediction().is_none());
    }

    #[test]
    fn current_prediction_is_attached() {
        let mut s = session(2);
        s.select_choice(label("A")).unwrap();
        let ticket = s.check().unwrap().prediction.unwrap();
        let result = PredictionResult::new(
            72,
            ConfidenceLevel::Medium,
            PredictionResult::fallback().motivation,
        );
        assert!(s.accept_prediction(&ticket, result.clone()));
        assert_eq!(s.prediction(), Some(&result));
    }

    #[test]
    fn other_generation_tickets_are_stale() {
        let mut old = session(1);
        old.select_choice(label("B")).unwrap();
        let ticket = old.check().unwrap().prediction.unwrap();
        let persist = old.submit(fixed_now()).unwrap().persist;

        let questions = vec![question_draft(1, 1, 2).validate().unwrap()];
        let mut fresh = PracticeSession::new(
            questions,
            SessionContext::new(SubjectId::new(1)),
            SessionGeneration::new(2),
            fixed_now(),
        )
        .unwrap();
        fresh.select_choice(label("B")).unwrap();
        fresh.check().unwrap();

        assert!(!fresh.accept_prediction(&ticket, PredictionResult::fallback()));
        assert!(!fresh.accepts_persistence(&persist));
        assert!(old.accepts_persistence(&persist));

        old.close_report().unwrap();
        assert!(!old.accepts_persistence(&persist));
    }

    #[test]
    fn apply_dispatches_events() {
        let mut s = session(1);
        let now = fixed_now();
        assert_eq!(
            s.apply(SessionEvent::Select(label("B")), now).unwrap(),
            SessionUpdate::Selected(Some(label("B")))
        );
        assert!(matches!(
            s.apply(SessionEvent::Check, now).unwrap(),
            SessionUpdate::Checked(CheckOutcome { is_correct: true, .. })
        ));
        assert!(matches!(
            s.apply(SessionEvent::Submit, now).unwrap(),
            SessionUpdate::Submitted(_)
        ));
        assert!(matches!(
            s.apply(SessionEvent::Close, now).unwrap(),
            SessionUpdate::Closed(CloseOutcome { answered: 1, .. })
        ));
        assert!(s.apply(SessionEvent::Check, now).is_err());
    }

    #[test]
    fn tag_is_dropped_when_blank() {
        let ctx = SessionContext::new(SubjectId::new(3)).with_tag("  ");
        assert!(ctx.tag.is_none());
        let ctx = ctx.with_tag("geometry");
        assert_eq!(ctx.tag.as_deref(), Some("geometry"));
    }
}
