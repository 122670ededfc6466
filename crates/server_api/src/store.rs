use std::{collections::HashSet, fs, path::Path};

use shared::domain::{Question, QuestionId};
use thiserror::Error;

use crate::bank::builtin_questions;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("question {0} not found")]
    NotFound(QuestionId),
}

#[derive(Debug, Error)]
pub enum BankError {
    #[error("question bank is empty")]
    Empty,
    #[error("question id {0} must be positive")]
    NonPositiveId(QuestionId),
    #[error("question id {0} appears more than once")]
    DuplicateId(QuestionId),
    #[error("question {0} has empty text")]
    EmptyText(QuestionId),
    #[error("question {0} repeats option '{1}'")]
    DuplicateOption(QuestionId, String),
    #[error("question {id} correct answer '{answer}' is not one of its options")]
    AnswerNotInOptions { id: QuestionId, answer: String },
    #[error("failed to read question bank '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse question bank '{path}': {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Read-only, ordered catalog of quiz questions. Validated once on construction.
#[derive(Debug, Clone)]
pub struct QuestionStore {
    questions: Vec<Question>,
}

impl QuestionStore {
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        validate(&questions)?;
        Ok(Self { questions })
    }

    pub fn builtin() -> Self {
        Self {
            questions: builtin_questions(),
        }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| BankError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let questions: Vec<Question> =
            serde_json::from_str(&raw).map_err(|source| BankError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Self::new(questions)
    }

    pub fn list_all(&self) -> &[Question] {
        &self.questions
    }

    pub fn get_by_id(&self, id: QuestionId) -> Result<&Question, StoreError> {
        self.questions
            .iter()
            .find(|question| question.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

fn validate(questions: &[Question]) -> Result<(), BankError> {
    if questions.is_empty() {
        return Err(BankError::Empty);
    }

    let mut seen_ids = HashSet::new();
    for question in questions {
        if question.id.0 <= 0 {
            return Err(BankError::NonPositiveId(question.id));
        }
        if !seen_ids.insert(question.id) {
            return Err(BankError::DuplicateId(question.id));
        }
        if question.question.trim().is_empty() {
            return Err(BankError::EmptyText(question.id));
        }

        let mut seen_options = HashSet::new();
        for option in &question.options {
            if !seen_options.insert(option.as_str()) {
                return Err(BankError::DuplicateOption(question.id, option.clone()));
            }
        }
        if !question.has_option(&question.correct_answer) {
            return Err(BankError::AnswerNotInOptions {
                id: question.id,
                answer: question.correct_answer.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
