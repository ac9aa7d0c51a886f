use std::collections::HashMap;

use async_trait::async_trait;
use practice_core::model::{
    AnswerSubmission, PredictionRequest, PredictionResult, Question, SubjectAttempts, SubjectId,
    TestSessionId,
};
use reqwest::header::{CACHE_CONTROL, EXPIRES, HeaderMap, HeaderValue, PRAGMA};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::BackendConfig;
use crate::contracts::{
    AnswerPersistence, Backend, BackendError, PredictionService, QuestionProvider,
    SubjectAttemptCounter, SubmissionAck, TestSessionLifecycle, TestSessionSummary,
};

mod wire;

use wire::{
    WireEndedSession, WirePrediction, WirePredictionRequest, WireQuestion, WireStartedSession,
    WireSubjectCount, WireSubmission, WireSubmissionAck,
};

/// Backend speaking the platform's REST API.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
    user_id: u64,
}

impl HttpBackend {
    /// Build a client with the configured timeout and no-cache headers.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Connectivity` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(EXPIRES, HeaderValue::from_static("0"));

        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Connectivity(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            user_id: config.user_id,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{path}", self.base_url));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, BackendError> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, body));
        }
        let bytes = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| BackendError::Malformed(e.to_string()))
    }
}

fn transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else if e.is_decode() {
        BackendError::Malformed(e.to_string())
    } else {
        BackendError::Connectivity(e.to_string())
    }
}

fn status_error(status: StatusCode, body: String) -> BackendError {
    match status.as_u16() {
        401 | 403 => BackendError::Unauthorized,
        400 => BackendError::BadRequest(body),
        404 => BackendError::NotFound,
        code => BackendError::Server { status: code },
    }
}

#[async_trait]
impl QuestionProvider for HttpBackend {
    #[instrument(skip(self), fields(subject = %subject_id))]
    async fn get_batch(
        &self,
        subject_id: SubjectId,
        tag: Option<&str>,
    ) -> Result<Vec<Question>, BackendError> {
        let mut query = vec![("ders_id", subject_id.to_string())];
        if let Some(tag) = tag {
            query.push(("etiket", tag.to_string()));
        }
        let raw: Vec<WireQuestion> = self
            .send(self.request(Method::GET, "/questions/batch").query(&query))
            .await?;
        debug!(count = raw.len(), "received question batch");
        raw.into_iter().map(WireQuestion::into_question).collect()
    }
}

#[async_trait]
impl AnswerPersistence for HttpBackend {
    #[instrument(skip(self, submission), fields(question = %submission.question_id))]
    async fn submit_answer(
        &self,
        submission: &AnswerSubmission,
    ) -> Result<SubmissionAck, BackendError> {
        let body = WireSubmission::from(submission);
        let ack: WireSubmissionAck = self
            .send(self.request(Method::POST, "/answers/submit").json(&body))
            .await?;
        Ok(ack.into())
    }
}

#[async_trait]
impl PredictionService for HttpBackend {
    #[instrument(skip(self, request), fields(topic = %request.topic_id))]
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResult, BackendError> {
        let body = WirePredictionRequest::new(self.user_id, request);
        let raw: WirePrediction = self
            .send(self.request(Method::POST, "/answers/predict").json(&body))
            .await?;
        raw.into_result()
    }
}

#[async_trait]
impl SubjectAttemptCounter for HttpBackend {
    #[instrument(skip(self))]
    async fn attempt_counts(&self) -> Result<HashMap<SubjectId, SubjectAttempts>, BackendError> {
        let raw: HashMap<String, WireSubjectCount> = self
            .send(self.request(Method::GET, "/answers/total-questions-by-subject"))
            .await?;
        wire::into_attempts(raw)
    }
}

#[async_trait]
impl TestSessionLifecycle for HttpBackend {
    #[instrument(skip(self), fields(subject = %subject_id))]
    async fn start_session(
        &self,
        subject_id: SubjectId,
        tag: Option<&str>,
    ) -> Result<TestSessionId, BackendError> {
        let mut query = vec![("ders_id", subject_id.to_string())];
        if let Some(tag) = tag {
            query.push(("etiket", tag.to_string()));
        }
        let started: WireStartedSession = self
            .send(self.request(Method::POST, "/questions/start-test").query(&query))
            .await?;
        Ok(TestSessionId::new(started.test_session_id))
    }

    #[instrument(skip(self), fields(test_session = %id))]
    async fn end_session(&self, id: TestSessionId) -> Result<TestSessionSummary, BackendError> {
        let ended: WireEndedSession = self
            .send(
                self.request(Method::POST, "/questions/end-test")
                    .query(&[("test_session_id", id.value())]),
            )
            .await?;
        Ok(ended.into_summary(id))
    }
}

impl Backend {
    /// Build a `Backend` that talks to the platform API.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the HTTP client cannot be built.
    pub fn http(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self::from_shared(HttpBackend::new(config)?))
    }
}
