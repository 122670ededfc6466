use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{PublicQuestion, QuestionId},
    error::ApiError,
    protocol::{AnswerMap, SubmissionOutcome, SubmitRequest},
};
use tracing::debug;
use url::Url;

use crate::error::ClientError;

/// The quiz server as seen by a session.
#[async_trait]
pub trait QuizBackend: Send + Sync {
    async fn fetch_questions(&self) -> Result<Vec<PublicQuestion>, ClientError>;
    async fn fetch_question(&self, id: QuestionId) -> Result<PublicQuestion, ClientError>;
    async fn submit_answers(&self, answers: &AnswerMap) -> Result<SubmissionOutcome, ClientError>;
}

pub struct HttpQuizBackend {
    http: Client,
    base_url: Url,
}

impl HttpQuizBackend {
    pub fn new(server_url: &str) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidServerUrl {
            url: server_url.to_string(),
            reason,
        };
        let mut base_url = Url::parse(server_url).map_err(|err| invalid(err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("url cannot be used as a base".to_string()));
        }
        // Keep any path prefix when joining relative endpoints.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::InvalidServerUrl {
                url: format!("{}{path}", self.base_url),
                reason: err.to_string(),
            })
    }
}

#[async_trait]
impl QuizBackend for HttpQuizBackend {
    async fn fetch_questions(&self) -> Result<Vec<PublicQuestion>, ClientError> {
        let url = self.endpoint("api/questions")?;
        debug!(%url, "fetching questions");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ClientError::network)?;
        read_json(response).await
    }

    async fn fetch_question(&self, id: QuestionId) -> Result<PublicQuestion, ClientError> {
        let url = self.endpoint(&format!("api/questions/{id}"))?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ClientError::network)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(id));
        }
        read_json(response).await
    }

    async fn submit_answers(&self, answers: &AnswerMap) -> Result<SubmissionOutcome, ClientError> {
        let url = self.endpoint("api/submit")?;
        debug!(%url, answered = answers.len(), "submitting answers");
        let response = self
            .http
            .post(url)
            .json(&SubmitRequest {
                answers: answers.clone(),
            })
            .send()
            .await
            .map_err(ClientError::network)?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .map(|err| err.message)
            .unwrap_or(body);
        return Err(ClientError::MalformedResponse {
            status: status.as_u16(),
            message,
        });
    }

    let bytes = response.bytes().await.map_err(ClientError::network)?;
    serde_json::from_slice(&bytes).map_err(|err| ClientError::MalformedResponse {
        status: status.as_u16(),
        message: err.to_string(),
    })
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
