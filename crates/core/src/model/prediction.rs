use std::str::FromStr;

use thiserror::Error;

use crate::model::ids::{SubTopicId, SubjectId, TopicId};
use crate::model::question::{Difficulty, Question};

/// Attempts a subject needs before predictions are shown to the learner.
pub const AI_UNLOCK_THRESHOLD: u32 = 30;

//
// ─── REQUEST ──────────────────────────────────────────────────────────────────
//

/// Input to the prediction service for one checked question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionRequest {
    pub subject_id: SubjectId,
    pub topic_id: TopicId,
    pub sub_topic_id: SubTopicId,
    pub difficulty: Difficulty,
    pub is_correct: bool,
}

impl PredictionRequest {
    #[must_use]
    pub fn for_question(question: &Question, is_correct: bool) -> Self {
        Self {
            subject_id: question.subject_id(),
            topic_id: question.topic_id(),
            sub_topic_id: question.sub_topic_id(),
            difficulty: question.difficulty(),
            is_correct,
        }
    }
}

//
// ─── CONFIDENCE ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// Tier implied by how far a percentage sits from the 50% midpoint.
    #[must_use]
    pub fn from_percentage(percentage: u8) -> Self {
        if percentage >= 80 || percentage <= 20 {
            Self::High
        } else if percentage >= 65 || percentage <= 35 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown confidence level: {0}")]
pub struct ParseConfidenceError(String);

impl FromStr for ConfidenceLevel {
    type Err = ParseConfidenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseConfidenceError(s.trim().to_string())),
        }
    }
}

//
// ─── RESULT ───────────────────────────────────────────────────────────────────
//

/// Presentation payload accompanying a prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotivationalMessage {
    pub title: String,
    pub message: String,
    /// Presentation-only tag (e.g. "excellent", "challenging").
    pub kind: String,
    pub icon: String,
}

/// Likelihood score for answering similar questions correctly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionResult {
    percentage: u8,
    pub confidence: ConfidenceLevel,
    pub motivation: MotivationalMessage,
}

impl PredictionResult {
    /// Percentages above 100 are clamped.
    #[must_use]
    pub fn new(percentage: u8, confidence: ConfidenceLevel, motivation: MotivationalMessage) -> Self {
        Self {
            percentage: percentage.min(100),
            confidence,
            motivation,
        }
    }

    /// The result shown whenever the prediction service cannot answer.
    #[must_use]
    pub fn fallback() -> Self {
        Self::new(
            50,
            ConfidenceLevel::Low,
            MotivationalMessage {
                title: "AI Analysis".to_string(),
                message: "The AI could not make a prediction this time, but you can do it!"
                    .to_string(),
                kind: "default".to_string(),
                icon: "🤖".to_string(),
            },
        )
    }

    #[must_use]
    pub fn percentage(&self) -> u8 {
        self.percentage
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }
}

//
// ─── AVAILABILITY GATE ────────────────────────────────────────────────────────
//

/// Per-subject attempt count as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubjectAttempts {
    pub total_questions: u32,
    pub ai_enabled: bool,
}

/// Whether predictions may be displayed for a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiAvailability {
    Available,
    Locked { remaining: u32 },
}

impl AiAvailability {
    #[must_use]
    pub fn for_attempts(attempts: u32, threshold: u32) -> Self {
        if attempts >= threshold {
            Self::Available
        } else {
            Self::Locked {
                remaining: threshold.saturating_sub(attempts),
            }
        }
    }

    #[must_use]
    pub fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }

    /// Questions left to answer before predictions unlock.
    #[must_use]
    pub fn remaining(self) -> u32 {
        match self {
            Self::Available => 0,
            Self::Locked { remaining } => remaining,
        }
    }
}
