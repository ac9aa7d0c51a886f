use std::error::Error;
use std::io::Write;

use practice_core::analytics::SessionReport;
use practice_core::model::{ChoiceLabel, Question};
use practice_core::session::{PracticeSession, SessionContext, SessionError};
use services::{EngineError, PracticeEngine, PredictionDisplay};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// One line of learner input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Answer {
    Choice(ChoiceLabel),
    Skip,
    Quit,
}

pub(crate) fn parse_answer(line: &str) -> Answer {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Answer::Skip;
    }
    if trimmed.eq_ignore_ascii_case("q") || trimmed.eq_ignore_ascii_case("quit") {
        return Answer::Quit;
    }
    match ChoiceLabel::new(trimmed.to_ascii_uppercase()) {
        Ok(label) => Answer::Choice(label),
        Err(_) => Answer::Skip,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Finish {
    Completed,
    Quit,
}

/// Run one session from question batch to closed report.
pub(crate) async fn practice<R, W>(
    engine: &PracticeEngine,
    context: SessionContext,
    input: &mut R,
    out: &mut W,
) -> Result<Finish, Box<dyn Error>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut session = match engine.start(context).await {
        Ok(session) => session,
        Err(EngineError::EmptyBatch) => {
            writeln!(
                out,
                "No questions found for this subject and tag. Try a different selection."
            )?;
            return Ok(Finish::Quit);
        }
        Err(e) => return Err(e.into()),
    };

    while let Some(question) = session.current_question().cloned() {
        render_question(out, &session, &question)?;
        if !answer_question(engine, &mut session, &question, input, out).await? {
            writeln!(out, "Leaving the session.")?;
            return Ok(Finish::Quit);
        }
    }

    if let Some(report) = engine.report(&session) {
        render_report(out, &report)?;
    }
    engine.close(&mut session).await?;
    Ok(Finish::Completed)
}

/// Returns `false` when the learner quits.
async fn answer_question<R, W>(
    engine: &PracticeEngine,
    session: &mut PracticeSession,
    question: &Question,
    input: &mut R,
    out: &mut W,
) -> Result<bool, Box<dyn Error>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        write!(out, "Your answer (empty to skip, q to quit): ")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line).await? == 0 {
            return Ok(false);
        }
        match parse_answer(&line) {
            Answer::Quit => return Ok(false),
            Answer::Skip => break,
            Answer::Choice(label) => match engine.select(session, label) {
                Ok(_) => break,
                Err(EngineError::Session(SessionError::UnknownChoice(label))) => {
                    writeln!(out, "{label} is not one of the choices.")?;
                }
                Err(e) => return Err(e.into()),
            },
        }
    }

    let feedback = engine.check_and_predict(session).await?;
    let correct = question.correct_choice();
    if feedback.outcome.is_skipped() {
        writeln!(out, "Skipped. The correct answer is {correct}.")?;
    } else if feedback.outcome.is_correct {
        writeln!(out, "Correct!")?;
    } else {
        writeln!(out, "Wrong. The correct answer is {correct}.")?;
    }
    if let Some(explanation) = question.explanation() {
        writeln!(out, "Explanation: {explanation}")?;
    }
    match &feedback.display {
        PredictionDisplay::Shown(prediction) => {
            let m = &prediction.motivation;
            writeln!(
                out,
                "{} AI: {}% on similar questions ({} confidence). {}: {}",
                m.icon,
                prediction.percentage(),
                prediction.confidence.as_str(),
                m.title,
                m.message
            )?;
        }
        PredictionDisplay::Locked { remaining } => writeln!(
            out,
            "AI predictions for this subject unlock after {remaining} more questions."
        )?,
        PredictionDisplay::Skipped => {}
    }

    let submitted = engine.submit_and_record(session).await?;
    if let Some(warning) = submitted.warning {
        writeln!(out, "Warning: {}", warning.message())?;
    }
    writeln!(out)?;
    Ok(true)
}

fn render_question<W: Write>(
    out: &mut W,
    session: &PracticeSession,
    question: &Question,
) -> std::io::Result<()> {
    let progress = session.progress();
    writeln!(
        out,
        "[{}/{}] (difficulty {}) {}",
        session.index() + 1,
        progress.total,
        question.difficulty(),
        question.prompt()
    )?;
    if let Some(image) = question.image() {
        writeln!(out, "  image: {image}")?;
    }
    for (label, text) in question.choices() {
        writeln!(out, "  {label}) {text}")?;
    }
    Ok(())
}

fn render_report<W: Write>(out: &mut W, report: &SessionReport) -> std::io::Result<()> {
    let t = &report.totals;
    writeln!(out, "=== Session report ===")?;
    writeln!(
        out,
        "Overall: {} correct / {} wrong / {} skipped ({}%)",
        t.correct,
        t.incorrect,
        t.skipped,
        t.accuracy_percent()
    )?;
    writeln!(out, "Average time: {:.1}s", report.average_elapsed)?;

    writeln!(out, "By topic:")?;
    for r in &report.topic_rollups {
        writeln!(
            out,
            "  topic {:>4}: {}/{} correct, {} skipped, {:.1}s avg ({}%)",
            r.topic_id,
            r.correct,
            r.total,
            r.skipped,
            r.average_elapsed,
            r.accuracy_percent()
        )?;
    }
    writeln!(out, "By difficulty:")?;
    for r in &report.difficulty_rollups {
        writeln!(
            out,
            "  level {:>2} ({:?}): {}/{} correct ({}%)",
            r.difficulty.level(),
            r.band,
            r.correct,
            r.total,
            r.accuracy_percent()
        )?;
    }

    writeln!(out, "Recommendations:")?;
    for recommendation in &report.recommendations {
        writeln!(out, "  - {recommendation}")?;
    }
    writeln!(out, "{}", report.motivational_message())
}

#[cfg(test)]
mod tests {
    use backend::Backend;
    use practice_core::model::SubjectId;
    use practice_core::time::fixed_clock;
    use services::EngineConfig;

    use super::*;
    use crate::demo;

    #[test]
    fn parses_answers() {
        assert_eq!(parse_answer(" b \n"), Answer::Choice(ChoiceLabel::new("B").unwrap()));
        assert_eq!(parse_answer("\n"), Answer::Skip);
        assert_eq!(parse_answer("Q"), Answer::Quit);
        assert_eq!(parse_answer("quit"), Answer::Quit);
    }

    #[tokio::test]
    async fn scripted_demo_reaches_the_report() {
        let store = demo::store().unwrap();
        let engine = PracticeEngine::new(&Backend::with_memory(&store), EngineConfig::default())
            .with_clock(fixed_clock())
            .with_topic_names(std::sync::Arc::new(demo::topics()));
        let context = SessionContext::new(SubjectId::new(demo::SUBJECT));

        let script = "x\nB\n\nA\nc\nB\nB\n";
        let mut input = script.as_bytes();
        let mut out = Vec::new();
        let finish = practice(&engine, context, &mut input, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(finish, Finish::Completed);
        assert!(text.contains("X is not one of the choices."));
        assert!(text.contains("=== Session report ==="));
        assert!(text.contains("Skipped. The correct answer is"));
        assert_eq!(store.submissions().unwrap().len(), demo::QUESTION_COUNT);
    }

    #[tokio::test]
    async fn quitting_leaves_without_report() {
        let store = demo::store().unwrap();
        let engine = PracticeEngine::new(&Backend::with_memory(&store), EngineConfig::default())
            .with_clock(fixed_clock());
        let context = SessionContext::new(SubjectId::new(demo::SUBJECT));

        let mut input = "B\nq\n".as_bytes();
        let mut out = Vec::new();
        let finish = practice(&engine, context, &mut input, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(finish, Finish::Quit);
        assert!(!text.contains("Session report"));
        assert_eq!(store.submissions().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_tag_reports_empty_batch() {
        let store = demo::store().unwrap();
        let engine = PracticeEngine::new(&Backend::with_memory(&store), EngineConfig::default());
        let context = SessionContext::new(SubjectId::new(demo::SUBJECT)).with_tag("astronomy");

        let mut input = "".as_bytes();
        let mut out = Vec::new();
        let finish = practice(&engine, context, &mut input, &mut out).await.unwrap();
        assert_eq!(finish, Finish::Quit);
        assert!(String::from_utf8(out).unwrap().contains("No questions found"));
    }
}
