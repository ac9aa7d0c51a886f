use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{QuestionId, SubTopicId, SubjectId, TopicId};

//
// ─── CHOICE LABEL ──────────────────────────────────────────────────────────────
//

/// Label of a multiple-choice option ("A".."E").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChoiceLabel(String);

impl ChoiceLabel {
    /// Creates a label from raw input, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyChoiceLabel` if the label is blank.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, QuestionError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(QuestionError::EmptyChoiceLabel);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChoiceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── DIFFICULTY ────────────────────────────────────────────────────────────────
//

/// Ordinal difficulty level, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Difficulty(u8);

/// Coarse grouping of difficulty levels used when composing and reviewing batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DifficultyBand {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidDifficulty` for level 0.
    pub fn new(level: u8) -> Result<Self, QuestionError> {
        if level == 0 {
            return Err(QuestionError::InvalidDifficulty(level));
        }
        Ok(Self(level))
    }

    #[must_use]
    pub fn level(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn band(self) -> DifficultyBand {
        match self.0 {
            0..=2 => DifficultyBand::Easy,
            3..=4 => DifficultyBand::Medium,
            _ => DifficultyBand::Hard,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question has no choices")]
    NoChoices,

    #[error("choice label cannot be empty")]
    EmptyChoiceLabel,

    #[error("duplicate choice label: {0}")]
    DuplicateChoice(String),

    #[error("correct choice {0} is not one of the choices")]
    UnknownCorrectChoice(String),

    #[error("invalid difficulty level: {0}")]
    InvalidDifficulty(u8),
}

//
// ─── QUESTION DRAFT ────────────────────────────────────────────────────────────
//

/// Unvalidated question as received from a question provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub subject_id: SubjectId,
    pub topic_id: TopicId,
    pub sub_topic_id: SubTopicId,
    pub difficulty: u8,
    pub prompt: String,
    pub choices: Vec<(String, String)>,
    pub correct_choice: String,
    pub explanation: Option<String>,
    pub image: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft into an immutable `Question`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank, the choice set is empty or
    /// has duplicate labels, the correct label is missing, or the difficulty is 0.
    pub fn validate(self) -> Result<Question, QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if self.choices.is_empty() {
            return Err(QuestionError::NoChoices);
        }

        let mut choices = BTreeMap::new();
        for (label, text) in self.choices {
            let label = ChoiceLabel::new(label)?;
            if choices.contains_key(&label) {
                return Err(QuestionError::DuplicateChoice(label.0));
            }
            choices.insert(label, text);
        }

        let correct = ChoiceLabel::new(&self.correct_choice)?;
        if !choices.contains_key(&correct) {
            return Err(QuestionError::UnknownCorrectChoice(correct.0));
        }

        Ok(Question {
            id: self.id,
            subject_id: self.subject_id,
            topic_id: self.topic_id,
            sub_topic_id: self.sub_topic_id,
            difficulty: Difficulty::new(self.difficulty)?,
            prompt: self.prompt,
            choices,
            correct,
            explanation: self.explanation.filter(|text| !text.trim().is_empty()),
            image: self.image.filter(|uri| !uri.trim().is_empty()),
        })
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A validated multiple-choice question. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    subject_id: SubjectId,
    topic_id: TopicId,
    sub_topic_id: SubTopicId,
    difficulty: Difficulty,
    prompt: String,
    choices: BTreeMap<ChoiceLabel, String>,
    correct: ChoiceLabel,
    explanation: Option<String>,
    image: Option<String>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn subject_id(&self) -> SubjectId {
        self.subject_id
    }

    #[must_use]
    pub fn topic_id(&self) -> TopicId {
        self.topic_id
    }

    #[must_use]
    pub fn sub_topic_id(&self) -> SubTopicId {
        self.sub_topic_id
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Choices in label order.
    pub fn choices(&self) -> impl Iterator<Item = (&ChoiceLabel, &str)> {
        self.choices.iter().map(|(label, text)| (label, text.as_str()))
    }

    #[must_use]
    pub fn has_choice(&self, label: &ChoiceLabel) -> bool {
        self.choices.contains_key(label)
    }

    #[must_use]
    pub fn correct_choice(&self) -> &ChoiceLabel {
        &self.correct
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// A missing selection is never correct.
    #[must_use]
    pub fn is_correct(&self, selected: Option<&ChoiceLabel>) -> bool {
        selected.is_some_and(|label| *label == self.correct)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn draft(id: u64, topic: u64, difficulty: u8) -> QuestionDraft {
        QuestionDraft {
            id: QuestionId::new(id),
            subject_id: SubjectId::new(1),
            topic_id: TopicId::new(topic),
            sub_topic_id: SubTopicId::new(topic * 10),
            difficulty,
            prompt: format!("Question {id}?"),
            choices: vec![
                ("A".into(), "one".into()),
                ("B".into(), "two".into()),
                ("C".into(), "three".into()),
            ],
            correct_choice: "B".into(),
            explanation: Some("Because two.".into()),
            image: None,
        }
    }

    #[test]
    fn validates_a_well_formed_draft() {
        let question = draft(1, 2, 3).validate().unwrap();
        assert_eq!(question.id(), QuestionId::new(1));
        assert_eq!(question.correct_choice().as_str(), "B");
        assert_eq!(question.choices().count(), 3);
        assert_eq!(question.difficulty().band(), DifficultyBand::Medium);
        assert_eq!(question.explanation(), Some("Because two."));
    }

    #[test]
    fn rejects_unknown_correct_choice() {
        let mut bad = draft(1, 1, 1);
        bad.correct_choice = "E".into();
        assert_eq!(
            bad.validate().unwrap_err(),
            QuestionError::UnknownCorrectChoice("E".into())
        );
    }

    #[test]
    fn rejects_duplicate_labels_and_zero_difficulty() {
        let mut dup = draft(1, 1, 1);
        dup.choices.push((" A ".into(), "again".into()));
        assert_eq!(
            dup.validate().unwrap_err(),
            QuestionError::DuplicateChoice("A".into())
        );

        assert_eq!(
            draft(1, 1, 0).validate().unwrap_err(),
            QuestionError::InvalidDifficulty(0)
        );
    }

    #[test]
    fn blank_explanation_is_dropped() {
        let mut d = draft(1, 1, 1);
        d.explanation = Some("   ".into());
        assert_eq!(d.validate().unwrap().explanation(), None);
    }

    #[test]
    fn correctness_requires_a_selection() {
        let question = draft(1, 1, 5).validate().unwrap();
        let b = ChoiceLabel::new("B").unwrap();
        let a = ChoiceLabel::new("A").unwrap();
        assert!(question.is_correct(Some(&b)));
        assert!(!question.is_correct(Some(&a)));
        assert!(!question.is_correct(None));
        assert_eq!(question.difficulty().band(), DifficultyBand::Hard);
    }
}
