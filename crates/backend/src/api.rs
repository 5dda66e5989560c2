use async_trait::async_trait;
use kanji_core::model::{ReviewCard, ReviewOutcome};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by backend adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// The two backend operations the review engine consumes.
///
/// The backend owns the interval algorithm and review bookkeeping; the client
/// only asks what is due and reports what the learner answered.
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    /// Fetch every vocabulary item currently due for review.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the due list cannot be loaded.
    async fn fetch_due_reviews(&self) -> Result<Vec<ReviewCard>, BackendError>;

    /// Record a batch of outcomes. Retrying is the caller's decision.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the batch was not accepted.
    async fn submit_review_outcomes(&self, outcomes: &[ReviewOutcome]) -> Result<(), BackendError>;
}

#[derive(Debug, Default)]
struct InMemoryState {
    due: Vec<ReviewCard>,
    submissions: Vec<Vec<ReviewOutcome>>,
    fetch_calls: usize,
    fail_fetch: bool,
    fail_submit: bool,
}

/// Simple in-memory backend for testing and offline prototyping.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_due(due: Vec<ReviewCard>) -> Self {
        let backend = Self::new();
        backend.set_due(due);
        backend
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, InMemoryState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Replace the due list returned by subsequent fetches.
    pub fn set_due(&self, due: Vec<ReviewCard>) {
        self.lock().due = due;
    }

    /// Make subsequent fetches fail until reset.
    pub fn fail_fetches(&self, fail: bool) {
        self.lock().fail_fetch = fail;
    }

    /// Make subsequent submissions fail until reset.
    pub fn fail_submissions(&self, fail: bool) {
        self.lock().fail_submit = fail;
    }

    /// Every accepted submission, in arrival order.
    #[must_use]
    pub fn submissions(&self) -> Vec<Vec<ReviewOutcome>> {
        self.lock().submissions.clone()
    }

    #[must_use]
    pub fn fetch_calls(&self) -> usize {
        self.lock().fetch_calls
    }
}

#[async_trait]
impl ReviewBackend for InMemoryBackend {
    async fn fetch_due_reviews(&self) -> Result<Vec<ReviewCard>, BackendError> {
        let mut guard = self.lock();
        guard.fetch_calls += 1;
        if guard.fail_fetch {
            return Err(BackendError::Unavailable("due reviews fetch failed".into()));
        }
        Ok(guard.due.clone())
    }

    async fn submit_review_outcomes(&self, outcomes: &[ReviewOutcome]) -> Result<(), BackendError> {
        let mut guard = self.lock();
        if guard.fail_submit {
            return Err(BackendError::Unavailable("review submission failed".into()));
        }
        guard.submissions.push(outcomes.to_vec());
        Ok(())
    }
}
