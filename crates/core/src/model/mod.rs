mod answer;
mod ids;
mod prediction;
mod question;

pub use ids::{ParseIdError, QuestionId, SubTopicId, SubjectId, TestSessionId, TopicId};

pub use answer::{AnswerOutcome, AnswerRecord, AnswerSubmission};
pub use prediction::{
    AI_UNLOCK_THRESHOLD, AiAvailability, ConfidenceLevel, MotivationalMessage, ParseConfidenceError,
    PredictionRequest, PredictionResult, SubjectAttempts,
};
pub use question::{ChoiceLabel, Difficulty, DifficultyBand, Question, QuestionDraft, QuestionError};

#[cfg(test)]
pub(crate) use question::tests::draft as question_draft;
