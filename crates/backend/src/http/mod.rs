use std::time::Duration;

use async_trait::async_trait;
use kanji_core::model::{ReviewCard, ReviewOutcome};
use reqwest::Client;

use crate::api::{BackendError, ReviewBackend};

mod mapping;

use mapping::{DueReviewsResponse, SubmitReviewsRequest};

const DUE_REVIEWS_PATH: &str = "reviews/due";
const SUBMIT_REVIEWS_PATH: &str = "reviews/submit";

/// Connection settings for the review API.
#[derive(Clone, Debug)]
pub struct HttpReviewBackendConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl HttpReviewBackendConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }
}

/// `ReviewBackend` that talks JSON over HTTP.
#[derive(Clone)]
pub struct HttpReviewBackend {
    client: Client,
    config: HttpReviewBackendConfig,
}

impl HttpReviewBackend {
    /// Build a client for the given API.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Http` if the HTTP client cannot be constructed.
    pub fn new(config: HttpReviewBackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &HttpReviewBackendConfig {
        &self.config
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl ReviewBackend for HttpReviewBackend {
    async fn fetch_due_reviews(&self) -> Result<Vec<ReviewCard>, BackendError> {
        let url = self.config.endpoint(DUE_REVIEWS_PATH);
        let response = self.authorize(self.client.get(url)).send().await?;

        if !response.status().is_success() {
            return Err(BackendError::HttpStatus(response.status()));
        }

        let body: DueReviewsResponse = response.json().await?;
        tracing::debug!(count = body.data.len(), "fetched due reviews");
        Ok(body.data)
    }

    async fn submit_review_outcomes(&self, outcomes: &[ReviewOutcome]) -> Result<(), BackendError> {
        let url = self.config.endpoint(SUBMIT_REVIEWS_PATH);
        let payload = SubmitReviewsRequest { reviews: outcomes };
        let response = self
            .authorize(self.client.post(url))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::HttpStatus(response.status()));
        }

        tracing::debug!(count = outcomes.len(), "submitted review outcomes");
        Ok(())
    }
}
