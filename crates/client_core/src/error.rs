use shared::domain::QuestionId;
use thiserror::Error;

/// Failures talking to the quiz server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("invalid server url '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },
    #[error("network failure: {0}")]
    Network(String),
    #[error("unexpected response (HTTP {status}): {message}")]
    MalformedResponse { status: u16, message: String },
    #[error("question {0} not found")]
    NotFound(QuestionId),
    #[error("the server returned no questions")]
    EmptyQuestionBank,
}

impl ClientError {
    pub(crate) fn network(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }

    /// Network failures are worth retrying as-is; other errors need a fix first.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
