use std::sync::Arc;

use shared::{
    domain::{PublicQuestion, QuestionId},
    error::ApiError,
    protocol::{AnswerMap, SubmissionOutcome},
};
use tracing::{debug, info};

mod bank;
pub mod grading;
pub mod store;

pub use bank::builtin_questions;
pub use grading::grade;
pub use store::{BankError, QuestionStore, StoreError};

/// Shared, read-only dependencies handed to every request handler.
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<QuestionStore>,
}

impl ApiContext {
    pub fn new(store: QuestionStore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

pub fn list_questions(ctx: &ApiContext) -> Vec<PublicQuestion> {
    ctx.store
        .list_all()
        .iter()
        .map(PublicQuestion::from)
        .collect()
}

pub fn get_question(ctx: &ApiContext, id: QuestionId) -> Result<PublicQuestion, ApiError> {
    ctx.store
        .get_by_id(id)
        .map(PublicQuestion::from)
        .map_err(|err| {
            debug!(%err, "question lookup failed");
            ApiError::not_found("Question not found")
        })
}

pub fn submit_answers(ctx: &ApiContext, answers: &AnswerMap) -> SubmissionOutcome {
    let outcome = grade(&ctx.store, answers);
    info!(
        score = outcome.score,
        total = outcome.total_questions,
        answered = answers.len(),
        "graded submission"
    );
    outcome
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
