//! End-of-session analytics.
//!
//! Everything here is derived from the ordered answer history; nothing is stored.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::model::{AnswerOutcome, AnswerRecord, Difficulty, DifficultyBand, SubjectId, TopicId};

/// Weakest topic is only called out below this accuracy.
const WEAK_TOPIC_ACCURACY: f64 = 0.5;
/// Strongest topic is only praised above this accuracy.
const STRONG_TOPIC_ACCURACY: f64 = 0.8;
/// Slowest topic must exceed the session average by this factor.
const SLOW_TOPIC_FACTOR: f64 = 1.3;
const LOW_OVERALL_ACCURACY: f64 = 0.6;
const HIGH_OVERALL_ACCURACY: f64 = 0.8;

//
// ─── TOPIC NAMES ──────────────────────────────────────────────────────────────
//

/// Resolves display names for topics referenced by recommendations.
pub trait TopicNames {
    fn topic_name(&self, subject_id: SubjectId, topic_id: TopicId) -> String;
}

/// Static name table; unknown topics render as "Topic {id}".
#[derive(Debug, Clone, Default)]
pub struct TopicCatalog {
    names: HashMap<(SubjectId, TopicId), String>,
}

impl TopicCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_topic(mut self, subject_id: SubjectId, topic_id: TopicId, name: impl Into<String>) -> Self {
        self.insert(subject_id, topic_id, name);
        self
    }

    pub fn insert(&mut self, subject_id: SubjectId, topic_id: TopicId, name: impl Into<String>) {
        self.names.insert((subject_id, topic_id), name.into());
    }
}

impl TopicNames for TopicCatalog {
    fn topic_name(&self, subject_id: SubjectId, topic_id: TopicId) -> String {
        self.names
            .get(&(subject_id, topic_id))
            .cloned()
            .unwrap_or_else(|| format!("Topic {topic_id}"))
    }
}

//
// ─── TALLIES ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    total: u32,
    correct: u32,
    incorrect: u32,
    skipped: u32,
    elapsed_seconds: u64,
}

impl Tally {
    fn add(&mut self, record: &AnswerRecord) {
        self.total += 1;
        match record.outcome() {
            AnswerOutcome::Correct => self.correct += 1,
            AnswerOutcome::Incorrect => self.incorrect += 1,
            AnswerOutcome::Skipped => self.skipped += 1,
        }
        self.elapsed_seconds += u64::from(record.elapsed_seconds);
    }

    #[allow(clippy::cast_precision_loss)]
    fn average_elapsed(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.elapsed_seconds as f64 / f64::from(self.total)
    }
}

fn ratio(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(correct) / f64::from(total)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(fraction: f64) -> u32 {
    (fraction * 100.0).round().max(0.0) as u32
}

//
// ─── ROLLUPS ──────────────────────────────────────────────────────────────────
//

/// Per-topic aggregate over the session history.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicRollup {
    pub topic_id: TopicId,
    pub subject_id: SubjectId,
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub skipped: u32,
    /// Mean seconds per question in the topic; skips count as zero.
    pub average_elapsed: f64,
}

impl TopicRollup {
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }

    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        percent(self.accuracy())
    }
}

/// Per-difficulty aggregate over the session history.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyRollup {
    pub difficulty: Difficulty,
    pub band: DifficultyBand,
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub skipped: u32,
    pub average_elapsed: f64,
}

impl DifficultyRollup {
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }

    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        percent(self.accuracy())
    }
}

/// Session-wide counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionTotals {
    pub total_questions: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub skipped: u32,
}

impl SessionTotals {
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total_questions)
    }

    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        percent(self.accuracy())
    }
}

//
// ─── RECOMMENDATIONS ──────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRef {
    pub subject_id: SubjectId,
    pub topic_id: TopicId,
    pub name: String,
}

/// Qualitative advice derived from the rollups, rendered via `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
    ReviewWeakTopic { topic: TopicRef, accuracy_percent: u32 },
    PracticePacing { topic: TopicRef, average_seconds: u32, over_percent: u32 },
    ImproveAccuracy { accuracy_percent: u32 },
    ChallengeYourself { accuracy_percent: u32 },
    KeepStrength { topic: TopicRef, accuracy_percent: u32 },
    KeepPracticing,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReviewWeakTopic { topic, accuracy_percent } => write!(
                f,
                "You struggled with {} ({accuracy_percent}% correct). Review the core concepts of this topic.",
                topic.name
            ),
            Self::PracticePacing { topic, average_seconds, over_percent } => write!(
                f,
                "Your solving time in {} is {over_percent}% above your average ({average_seconds}s). Practice to manage your time.",
                topic.name
            ),
            Self::ImproveAccuracy { accuracy_percent } => write!(
                f,
                "Your overall accuracy is {accuracy_percent}%. Solve extra tests on the topics you missed to raise it."
            ),
            Self::ChallengeYourself { accuracy_percent } => write!(
                f,
                "Excellent! {accuracy_percent}% accuracy is a strong result. Try harder questions to challenge yourself."
            ),
            Self::KeepStrength { topic, accuracy_percent } => write!(
                f,
                "You are very strong in {} ({accuracy_percent}% correct)! Keep this strength up.",
                topic.name
            ),
            Self::KeepPracticing => f.write_str(
                "Overall a good performance. Keep practicing regularly to improve even more.",
            ),
        }
    }
}

//
// ─── PERFORMANCE BAND ─────────────────────────────────────────────────────────
//

/// Accuracy band selecting the closing motivational message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceBand {
    Outstanding,
    Great,
    Good,
    Fair,
    NeedsWork,
}

impl PerformanceBand {
    #[must_use]
    pub fn from_accuracy(accuracy: f64) -> Self {
        if accuracy >= 0.9 {
            Self::Outstanding
        } else if accuracy >= 0.8 {
            Self::Great
        } else if accuracy >= 0.7 {
            Self::Good
        } else if accuracy >= 0.6 {
            Self::Fair
        } else {
            Self::NeedsWork
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Outstanding => {
                "Outstanding performance! You are truly successful. Keep up this level!"
            }
            Self::Great => "Great effort! You performed really well. Keep improving!",
            Self::Good => "Good performance! A little more practice will make you even better.",
            Self::Fair => "A moderate performance. You can improve with more study. Don't give up!",
            Self::NeedsWork => {
                "You didn't get the result you wanted this time, but don't worry! Every setback is a step toward success. Keep practicing and you will improve!"
            }
        }
    }
}

//
// ─── REPORT ───────────────────────────────────────────────────────────────────
//

/// Aggregated report produced once a session reaches its last question.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub totals: SessionTotals,
    /// Mean seconds over records with a measured (non-zero) time.
    pub average_elapsed: f64,
    pub topic_rollups: Vec<TopicRollup>,
    pub difficulty_rollups: Vec<DifficultyRollup>,
    pub weakest_topic: Option<TopicRollup>,
    pub slowest_topic: Option<TopicRollup>,
    pub strongest_topic: Option<TopicRollup>,
    pub recommendations: Vec<Recommendation>,
    pub band: PerformanceBand,
}

impl SessionReport {
    /// Fold an answer history into the session report.
    #[must_use]
    pub fn from_records(records: &[AnswerRecord], names: &dyn TopicNames) -> Self {
        let mut overall = Tally::default();
        let mut by_topic: BTreeMap<TopicId, (SubjectId, Tally)> = BTreeMap::new();
        let mut by_difficulty: BTreeMap<Difficulty, Tally> = BTreeMap::new();
        let mut timed_total = 0_u64;
        let mut timed_count = 0_u32;

        for record in records {
            overall.add(record);
            by_topic
                .entry(record.topic_id)
                .or_insert_with(|| (record.subject_id, Tally::default()))
                .1
                .add(record);
            by_difficulty.entry(record.difficulty).or_default().add(record);
            if record.elapsed_seconds > 0 {
                timed_total += u64::from(record.elapsed_seconds);
                timed_count += 1;
            }
        }

        let totals = SessionTotals {
            total_questions: overall.total,
            correct: overall.correct,
            incorrect: overall.incorrect,
            skipped: overall.skipped,
        };

        #[allow(clippy::cast_precision_loss)]
        let average_elapsed = if timed_count == 0 {
            0.0
        } else {
            timed_total as f64 / f64::from(timed_count)
        };

        let topic_rollups: Vec<TopicRollup> = by_topic
            .into_iter()
            .map(|(topic_id, (subject_id, tally))| TopicRollup {
                topic_id,
                subject_id,
                total: tally.total,
                correct: tally.correct,
                incorrect: tally.incorrect,
                skipped: tally.skipped,
                average_elapsed: tally.average_elapsed(),
            })
            .collect();

        let difficulty_rollups = by_difficulty
            .into_iter()
            .map(|(difficulty, tally)| DifficultyRollup {
                difficulty,
                band: difficulty.band(),
                total: tally.total,
                correct: tally.correct,
                incorrect: tally.incorrect,
                skipped: tally.skipped,
                average_elapsed: tally.average_elapsed(),
            })
            .collect();

        let attempted: Vec<&TopicRollup> = topic_rollups.iter().filter(|r| r.total > 0).collect();
        let weakest_topic = first_by(&attempted, |a, b| a.accuracy() < b.accuracy()).cloned();
        let strongest_topic = first_by(&attempted, |a, b| a.accuracy() > b.accuracy()).cloned();
        let timed: Vec<&TopicRollup> = attempted
            .iter()
            .copied()
            .filter(|r| r.average_elapsed > 0.0)
            .collect();
        let slowest_topic = first_by(&timed, |a, b| a.average_elapsed > b.average_elapsed).cloned();

        let recommendations = recommend(
            &totals,
            average_elapsed,
            weakest_topic.as_ref(),
            slowest_topic.as_ref(),
            strongest_topic.as_ref(),
            names,
        );

        Self {
            totals,
            average_elapsed,
            topic_rollups,
            difficulty_rollups,
            weakest_topic,
            slowest_topic,
            strongest_topic,
            recommendations,
            band: PerformanceBand::from_accuracy(totals.accuracy()),
        }
    }

    #[must_use]
    pub fn motivational_message(&self) -> &'static str {
        self.band.message()
    }

    #[must_use]
    pub fn topic(&self, topic_id: TopicId) -> Option<&TopicRollup> {
        self.topic_rollups.iter().find(|r| r.topic_id == topic_id)
    }
}

/// First element for which no later element is strictly `better`.
fn first_by<'a, T>(items: &[&'a T], better: impl Fn(&T, &T) -> bool) -> Option<&'a T> {
    let mut best: Option<&'a T> = None;
    for &item in items {
        match best {
            Some(current) if !better(item, current) => {}
            _ => best = Some(item),
        }
    }
    best
}

fn topic_ref(rollup: &TopicRollup, names: &dyn TopicNames) -> TopicRef {
    TopicRef {
        subject_id: rollup.subject_id,
        topic_id: rollup.topic_id,
        name: names.topic_name(rollup.subject_id, rollup.topic_id),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn recommend(
    totals: &SessionTotals,
    average_elapsed: f64,
    weakest: Option<&TopicRollup>,
    slowest: Option<&TopicRollup>,
    strongest: Option<&TopicRollup>,
    names: &dyn TopicNames,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if let Some(weak) = weakest
        && weak.accuracy() < WEAK_TOPIC_ACCURACY
    {
        out.push(Recommendation::ReviewWeakTopic {
            topic: topic_ref(weak, names),
            accuracy_percent: weak.accuracy_percent(),
        });
    }

    if let Some(slow) = slowest
        && average_elapsed > 0.0
        && slow.average_elapsed > average_elapsed * SLOW_TOPIC_FACTOR
    {
        let over = (slow.average_elapsed - average_elapsed) / average_elapsed;
        out.push(Recommendation::PracticePacing {
            topic: topic_ref(slow, names),
            average_seconds: slow.average_elapsed.round() as u32,
            over_percent: percent(over),
        });
    }

    let accuracy = totals.accuracy();
    if accuracy < LOW_OVERALL_ACCURACY {
        out.push(Recommendation::ImproveAccuracy {
            accuracy_percent: totals.accuracy_percent(),
        });
    } else if accuracy > HIGH_OVERALL_ACCURACY {
        out.push(Recommendation::ChallengeYourself {
            accuracy_percent: totals.accuracy_percent(),
        });
    }

    if let Some(strong) = strongest
        && strong.accuracy() > STRONG_TOPIC_ACCURACY
    {
        out.push(Recommendation::KeepStrength {
            topic: topic_ref(strong, names),
            accuracy_percent: strong.accuracy_percent(),
        });
    }

    if out.is_empty() {
        out.push(Recommendation::KeepPracticing);
    }
    out
}
