//! Seed data for `app demo`.

use backend::InMemoryBackend;
use practice_core::analytics::TopicCatalog;
use practice_core::model::{QuestionDraft, QuestionId, SubTopicId, SubjectId, TopicId};

pub(crate) const SUBJECT: u64 = 1;
pub(crate) const QUESTION_COUNT: usize = 6;
/// Enough prior answers that predictions are unlocked in the demo.
const SEEDED_ATTEMPTS: u32 = 32;

struct Seed {
    id: u64,
    topic: u64,
    difficulty: u8,
    prompt: &'static str,
    choices: [&'static str; 4],
    correct: &'static str,
    explanation: &'static str,
}

const SEEDS: [Seed; QUESTION_COUNT] = [
    Seed {
        id: 1,
        topic: 1,
        difficulty: 1,
        prompt: "What is 7 x 8?",
        choices: ["54", "56", "58", "64"],
        correct: "B",
        explanation: "7 x 8 = 56.",
    },
    Seed {
        id: 2,
        topic: 1,
        difficulty: 2,
        prompt: "Which number is prime?",
        choices: ["21", "27", "29", "33"],
        correct: "C",
        explanation: "29 has no divisors other than 1 and itself.",
    },
    Seed {
        id: 3,
        topic: 2,
        difficulty: 3,
        prompt: "Solve for x: 2x + 6 = 14",
        choices: ["4", "5", "8", "10"],
        correct: "A",
        explanation: "2x = 8, so x = 4.",
    },
    Seed {
        id: 4,
        topic: 2,
        difficulty: 4,
        prompt: "If f(x) = x^2 - 1, what is f(3)?",
        choices: ["6", "9", "8", "10"],
        correct: "C",
        explanation: "3^2 - 1 = 8.",
    },
    Seed {
        id: 5,
        topic: 3,
        difficulty: 5,
        prompt: "Sum of the interior angles of a hexagon?",
        choices: ["540", "720", "900", "1080"],
        correct: "B",
        explanation: "(6 - 2) x 180 = 720 degrees.",
    },
    Seed {
        id: 6,
        topic: 3,
        difficulty: 2,
        prompt: "How many degrees are in a right angle?",
        choices: ["45", "90", "180", "360"],
        correct: "B",
        explanation: "A right angle measures 90 degrees.",
    },
];

/// An in-memory store holding the demo questions.
pub(crate) fn store() -> Result<InMemoryBackend, Box<dyn std::error::Error>> {
    let store = InMemoryBackend::new();
    for seed in &SEEDS {
        let question = QuestionDraft {
            id: QuestionId::new(seed.id),
            subject_id: SubjectId::new(SUBJECT),
            topic_id: TopicId::new(seed.topic),
            sub_topic_id: SubTopicId::new(seed.topic * 10),
            difficulty: seed.difficulty,
            prompt: seed.prompt.to_string(),
            choices: ["A", "B", "C", "D"]
                .iter()
                .zip(seed.choices)
                .map(|(label, text)| ((*label).to_string(), text.to_string()))
                .collect(),
            correct_choice: seed.correct.to_string(),
            explanation: Some(seed.explanation.to_string()),
            image: None,
        }
        .validate()?;
        store.add_question(question, &["tyt", "warm-up"])?;
    }
    store.seed_attempts(SubjectId::new(SUBJECT), SEEDED_ATTEMPTS)?;
    Ok(store)
}

pub(crate) fn topics() -> TopicCatalog {
    let subject = SubjectId::new(SUBJECT);
    TopicCatalog::new()
        .with_topic(subject, TopicId::new(1), "Numbers")
        .with_topic(subject, TopicId::new(2), "Equations")
        .with_topic(subject, TopicId::new(3), "Geometry")
}
