//! Plain-text rendering of a quiz session.

use std::fmt::Write as _;

use client_core::{FailedStage, QuizSession, SessionPhase};
use shared::protocol::SubmissionOutcome;

const TITLE: &str = "Java Quiz";

pub fn render(session: &QuizSession) -> String {
    match session.phase() {
        SessionPhase::Loading => "Loading questions...".to_string(),
        SessionPhase::InProgress => render_question(session),
        SessionPhase::Submitting => "Submitting answers...".to_string(),
        SessionPhase::Results => session
            .outcome()
            .map(render_results)
            .unwrap_or_default(),
        SessionPhase::Failed => session
            .failure()
            .map(|(stage, cause)| render_failure(stage, cause))
            .unwrap_or_default(),
    }
}

pub fn render_question(session: &QuizSession) -> String {
    let mut out = String::new();
    let Some(question) = session.current_question() else {
        return out;
    };
    let selected = session.answer_for(question.id);

    let _ = writeln!(out, "{TITLE}  [{}]", session.format_remaining());
    let _ = writeln!(out, "Q{}: {}", question.id, question.question);
    for (index, option) in question.options.iter().enumerate() {
        let marker = if selected == Some(option.as_str()) { "x" } else { " " };
        let _ = writeln!(out, "  [{marker}] {}. {option}", index + 1);
    }

    let position = session.position().unwrap_or_default();
    let navigator: Vec<String> = session
        .questions()
        .iter()
        .enumerate()
        .map(|(index, q)| {
            let answered = if session.is_answered(q.id) { "*" } else { "" };
            if index == position {
                format!("<{}{answered}>", q.id)
            } else {
                format!("{}{answered}", q.id)
            }
        })
        .collect();
    let _ = writeln!(out, "Questions: {}", navigator.join(" "));
    let _ = write!(
        out,
        "Answered {}/{}",
        session.answered_count(),
        session.questions().len()
    );
    out
}

pub fn render_results(outcome: &SubmissionOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Quiz Results");
    let _ = writeln!(out, "Score: {} / {}", outcome.score, outcome.total_questions);
    let _ = writeln!(out, "Percentage: {:.1}%", outcome.percentage());
    for result in &outcome.results {
        let mark = if result.correct { "+" } else { "-" };
        let _ = writeln!(
            out,
            "{mark} Question {}: Your Answer: {}",
            result.question_id,
            result.user_answer.as_deref().unwrap_or("Not answered")
        );
        if !result.correct {
            let _ = writeln!(out, "    Correct Answer: {}", result.correct_answer);
        }
    }
    let _ = write!(out, "Type 'restart' to play again or 'quit' to leave.");
    out
}

pub fn render_failure(stage: FailedStage, cause: &str) -> String {
    let heading = match stage {
        FailedStage::Load => "Error Loading Quiz",
        FailedStage::Submit => "Error Submitting Answers",
    };
    format!("{heading}\n{cause}\nType 'retry' to try again.")
}
