use shared::protocol::{AnswerMap, GradeResult, SubmissionOutcome};

use crate::store::QuestionStore;

/// Grades `answers` against every question in store order.
///
/// A question counts as correct only when an answer is present and equals the
/// stored correct answer exactly (case-sensitive). Ids that are not in the
/// store are ignored. Grading never fails.
pub fn grade(store: &QuestionStore, answers: &AnswerMap) -> SubmissionOutcome {
    let results: Vec<GradeResult> = store
        .list_all()
        .iter()
        .map(|question| {
            let user_answer = answers.get(&question.id).cloned();
            GradeResult {
                question_id: question.id,
                correct: user_answer.as_deref() == Some(question.correct_answer.as_str()),
                user_answer,
                correct_answer: question.correct_answer.clone(),
            }
        })
        .collect();

    SubmissionOutcome {
        score: results.iter().filter(|result| result.correct).count(),
        total_questions: results.len(),
        results,
    }
}

#[cfg(test)]
#[path = "tests/grading_tests.rs"]
mod tests;
