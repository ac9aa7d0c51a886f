use crate::model::ids::{QuestionId, SubTopicId, SubjectId, TestSessionId, TopicId};
use crate::model::question::{ChoiceLabel, Difficulty, Question};

//
// ─── ANSWER RECORD ────────────────────────────────────────────────────────────
//

/// One entry per question passed in a session, answered or skipped.
///
/// Taxonomy fields are copied from the question at record time so the history
/// stays stable even if topic assignments change later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    pub question_id: QuestionId,
    pub subject_id: SubjectId,
    pub topic_id: TopicId,
    pub sub_topic_id: SubTopicId,
    pub difficulty: Difficulty,
    pub correct_choice: ChoiceLabel,
    /// `None` means the question was skipped.
    pub selected: Option<ChoiceLabel>,
    pub is_correct: bool,
    pub elapsed_seconds: u32,
}

/// Classification of an answer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    Skipped,
}

impl AnswerRecord {
    /// Record an answered question; correctness is derived from the question.
    #[must_use]
    pub fn answered(question: &Question, selected: ChoiceLabel, elapsed_seconds: u32) -> Self {
        let is_correct = question.is_correct(Some(&selected));
        Self::from_question(question, Some(selected), is_correct, elapsed_seconds)
    }

    /// Record a skipped question: never correct, always zero seconds.
    #[must_use]
    pub fn skipped(question: &Question) -> Self {
        Self::from_question(question, None, false, 0)
    }

    fn from_question(
        question: &Question,
        selected: Option<ChoiceLabel>,
        is_correct: bool,
        elapsed_seconds: u32,
    ) -> Self {
        Self {
            question_id: question.id(),
            subject_id: question.subject_id(),
            topic_id: question.topic_id(),
            sub_topic_id: question.sub_topic_id(),
            difficulty: question.difficulty(),
            correct_choice: question.correct_choice().clone(),
            selected,
            is_correct,
            elapsed_seconds,
        }
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.selected.is_none()
    }

    #[must_use]
    pub fn outcome(&self) -> AnswerOutcome {
        match (&self.selected, self.is_correct) {
            (None, _) => AnswerOutcome::Skipped,
            (Some(_), true) => AnswerOutcome::Correct,
            (Some(_), false) => AnswerOutcome::Incorrect,
        }
    }
}

//
// ─── ANSWER SUBMISSION ────────────────────────────────────────────────────────
//

/// Normalized payload handed to the answer-persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSubmission {
    pub question_id: QuestionId,
    pub subject_id: SubjectId,
    pub topic_id: TopicId,
    pub sub_topic_id: SubTopicId,
    pub difficulty: Difficulty,
    pub selected: Option<ChoiceLabel>,
    pub is_correct: bool,
    pub elapsed_seconds: u32,
    pub test_session_id: Option<TestSessionId>,
}

impl AnswerSubmission {
    #[must_use]
    pub fn from_record(record: &AnswerRecord, test_session_id: Option<TestSessionId>) -> Self {
        Self {
            question_id: record.question_id,
            subject_id: record.subject_id,
            topic_id: record.topic_id,
            sub_topic_id: record.sub_topic_id,
            difficulty: record.difficulty,
            selected: record.selected.clone(),
            is_correct: record.is_correct,
            elapsed_seconds: record.elapsed_seconds,
            test_session_id,
        }
    }

    /// Correctness encoded as 0/1 for the wire.
    #[must_use]
    pub fn correctness_flag(&self) -> u8 {
        u8::from(self.is_correct)
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.selected.is_none()
    }
}
