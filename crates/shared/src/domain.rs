use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(QuestionId);

/// A quiz item as held by the question store, answer key included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub question: String,
    pub options: [String; 4],
    pub correct_answer: String,
}

impl Question {
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|candidate| candidate == option)
    }

    pub fn to_public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id,
            question: self.question.clone(),
            options: self.options.clone(),
        }
    }
}

/// The client-facing view of a [`Question`]. Never carries the correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: QuestionId,
    pub question: String,
    pub options: [String; 4],
}

impl PublicQuestion {
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|candidate| candidate == option)
    }
}

impl From<&Question> for PublicQuestion {
    fn from(value: &Question) -> Self {
        value.to_public()
    }
}
