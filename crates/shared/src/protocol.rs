use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::QuestionId;

/// Selected option text keyed by question id. Unanswered questions are absent.
pub type AnswerMap = BTreeMap<QuestionId, String>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub answers: AnswerMap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeResult {
    pub question_id: QuestionId,
    pub correct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
    pub correct_answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub score: usize,
    pub total_questions: usize,
    pub results: Vec<GradeResult>,
}

impl SubmissionOutcome {
    pub fn percentage(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        self.score as f64 / self.total_questions as f64 * 100.0
    }
}
