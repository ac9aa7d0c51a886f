//! JSON shapes of the platform API and their mapping to domain types.
//!
//! Field names follow the server (`ders_id` = subject, `konu_id` = topic,
//! `altbaslik_id` = sub-topic, `zorluk` = difficulty).

use std::collections::{BTreeMap, HashMap};

use practice_core::model::{
    AnswerSubmission, ConfidenceLevel, MotivationalMessage, PredictionRequest, PredictionResult,
    Question, QuestionDraft, QuestionId, SubTopicId, SubjectAttempts, SubjectId, TestSessionId,
    TopicId,
};
use serde::{Deserialize, Serialize};

use crate::contracts::{BackendError, SubmissionAck, TestSessionSummary};

fn malformed<E: std::fmt::Display>(e: E) -> BackendError {
    BackendError::Malformed(e.to_string())
}

//
// ─── QUESTIONS ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct WireQuestion {
    soru_id: u64,
    ders_id: u64,
    konu_id: u64,
    #[serde(default)]
    altbaslik_id: u64,
    zorluk: u8,
    soru_metin: String,
    #[serde(alias = "choices")]
    secenekler: BTreeMap<String, String>,
    #[serde(alias = "correct_choice")]
    dogru_cevap: String,
    #[serde(default)]
    dogru_cevap_aciklamasi: Option<String>,
    #[serde(default, alias = "gorsel_url")]
    image_url: Option<String>,
}

impl WireQuestion {
    pub(crate) fn into_question(self) -> Result<Question, BackendError> {
        QuestionDraft {
            id: QuestionId::new(self.soru_id),
            subject_id: SubjectId::new(self.ders_id),
            topic_id: TopicId::new(self.konu_id),
            sub_topic_id: SubTopicId::new(self.altbaslik_id),
            difficulty: self.zorluk,
            prompt: self.soru_metin,
            choices: self.secenekler.into_iter().collect(),
            correct_choice: self.dogru_cevap,
            explanation: self.dogru_cevap_aciklamasi,
            image: self.image_url,
        }
        .validate()
        .map_err(|e| BackendError::Malformed(format!("question {}: {e}", self.soru_id)))
    }
}

//
// ─── ANSWERS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub(crate) struct WireSubmission<'a> {
    soru_id: u64,
    selected: Option<&'a str>,
    ders_id: u64,
    konu_id: u64,
    altbaslik_id: u64,
    zorluk: u8,
    is_correct: u8,
    is_skipped: bool,
    elapsed_seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    test_session_id: Option<u64>,
}

impl<'a> From<&'a AnswerSubmission> for WireSubmission<'a> {
    fn from(s: &'a AnswerSubmission) -> Self {
        Self {
            soru_id: s.question_id.value(),
            selected: s.selected.as_ref().map(|label| label.as_str()),
            ders_id: s.subject_id.value(),
            konu_id: s.topic_id.value(),
            altbaslik_id: s.sub_topic_id.value(),
            zorluk: s.difficulty.level(),
            is_correct: s.correctness_flag(),
            is_skipped: s.is_skipped(),
            elapsed_seconds: s.elapsed_seconds,
            test_session_id: s.test_session_id.map(|id| id.value()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireSubmissionAck {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    submission_id: Option<u64>,
}

impl From<WireSubmissionAck> for SubmissionAck {
    fn from(ack: WireSubmissionAck) -> Self {
        Self {
            submission_id: ack.submission_id,
            message: ack.message,
        }
    }
}

//
// ─── PREDICTIONS ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
pub(crate) struct WirePredictionRequest {
    user_id: u64,
    ders_id: u64,
    konu_id: u64,
    altbaslik_id: u64,
    zorluk: u8,
    is_correct: bool,
}

impl WirePredictionRequest {
    pub(crate) fn new(user_id: u64, request: &PredictionRequest) -> Self {
        Self {
            user_id,
            ders_id: request.subject_id.value(),
            konu_id: request.topic_id.value(),
            altbaslik_id: request.sub_topic_id.value(),
            zorluk: request.difficulty.level(),
            is_correct: request.is_correct,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WirePrediction {
    prediction_percentage: f64,
    #[serde(default)]
    confidence_level: Option<String>,
    motivational_message: WireMotivation,
}

#[derive(Debug, Deserialize)]
struct WireMotivation {
    #[serde(default)]
    title: String,
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    emoji: String,
}

impl WirePrediction {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(crate) fn into_result(self) -> Result<PredictionResult, BackendError> {
        let raw = self.prediction_percentage;
        if !raw.is_finite() || !(0.0..=100.0).contains(&raw) {
            return Err(malformed(format!("prediction percentage out of range: {raw}")));
        }
        let percentage = raw.round() as u8;
        let confidence = self
            .confidence_level
            .as_deref()
            .and_then(|level| level.parse().ok())
            .unwrap_or_else(|| ConfidenceLevel::from_percentage(percentage));
        let m = self.motivational_message;
        Ok(PredictionResult::new(
            percentage,
            confidence,
            MotivationalMessage {
                title: m.title,
                message: m.message,
                kind: m.kind,
                icon: m.emoji,
            },
        ))
    }
}

//
// ─── COUNTS & TEST SESSIONS ───────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
pub(crate) struct WireSubjectCount {
    #[serde(default)]
    total_questions: u32,
    #[serde(default)]
    ai_enabled: bool,
}

/// Subject ids arrive as JSON object keys.
pub(crate) fn into_attempts(
    raw: HashMap<String, WireSubjectCount>,
) -> Result<HashMap<SubjectId, SubjectAttempts>, BackendError> {
    raw.into_iter()
        .map(|(key, count)| {
            let subject = key.parse::<SubjectId>().map_err(malformed)?;
            Ok((
                subject,
                SubjectAttempts {
                    total_questions: count.total_questions,
                    ai_enabled: count.ai_enabled,
                },
            ))
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireStartedSession {
    pub(crate) test_session_id: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEndedSession {
    #[serde(default)]
    total_questions: u32,
    #[serde(default)]
    correct_answers: u32,
    #[serde(default)]
    incorrect_answers: u32,
}

impl WireEndedSession {
    pub(crate) fn into_summary(self, id: TestSessionId) -> TestSessionSummary {
        TestSessionSummary {
            test_session_id: id,
            total_questions: self.total_questions,
            correct_answers: self.correct_answers,
            incorrect_answers: self.incorrect_answers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_accepts_english_aliases() {
        let raw = serde_json::json!({
            "soru_id": 7, "ders_id": 1, "konu_id": 3, "zorluk": 2,
            "soru_metin": "2 + 2?",
            "choices": {"A": "3", "B": "4"},
            "correct_choice": "B",
            "gorsel_url": "https://img.example/7.png"
        });
        let wire: WireQuestion = serde_json::from_value(raw).unwrap();
        let question = wire.into_question().unwrap();
        assert_eq!(question.sub_topic_id(), SubTopicId::new(0));
        assert_eq!(question.image(), Some("https://img.example/7.png"));
        assert!(question.explanation().is_none());
    }

    #[test]
    fn invalid_question_is_malformed() {
        let raw = serde_json::json!({
            "soru_id": 8, "ders_id": 1, "konu_id": 3, "zorluk": 2,
            "soru_metin": "?", "secenekler": {"A": "x"}, "dogru_cevap": "C"
        });
        let wire: WireQuestion = serde_json::from_value(raw).unwrap();
        assert!(matches!(wire.into_question(), Err(BackendError::Malformed(_))));
    }

    #[test]
    fn missing_confidence_is_derived_from_percentage() {
        let raw = serde_json::json!({
            "prediction_percentage": 83.6,
            "motivational_message": {"title": "t", "message": "m", "type": "excellent", "emoji": "🚀"}
        });
        let wire: WirePrediction = serde_json::from_value(raw).unwrap();
        let result = wire.into_result().unwrap();
        assert_eq!(result.percentage(), 84);
        assert_eq!(result.confidence, ConfidenceLevel::High);
        assert_eq!(result.motivation.kind, "excellent");
    }

    #[test]
    fn non_numeric_subject_key_is_malformed() {
        let mut raw = HashMap::new();
        raw.insert(
            "math".to_string(),
            WireSubjectCount {
                total_questions: 1,
                ai_enabled: false,
            },
        );
        assert!(matches!(into_attempts(raw), Err(BackendError::Malformed(_))));
    }
}
