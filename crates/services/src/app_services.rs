use std::sync::Arc;

use backend::{HttpReviewBackend, ReviewBackend};

use crate::Clock;
use crate::batch_queue::BatchSubmissionQueue;
use crate::config::ReviewConfig;
use crate::error::AppServicesError;
use crate::sessions::ReviewSessionController;
use crate::timer::{Timer, TokioTimer};

/// Assembles the review services around one backend.
///
/// Holds the single `BatchSubmissionQueue` for the running client; every
/// caller shares it through `batch_queue()`.
#[derive(Clone)]
pub struct AppServices {
    backend: Arc<dyn ReviewBackend>,
    controller: ReviewSessionController,
    batch_queue: Arc<BatchSubmissionQueue>,
}

impl AppServices {
    /// Build services backed by the HTTP review API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Backend` if the HTTP client cannot be built.
    pub fn new_http(config: &ReviewConfig, clock: Clock) -> Result<Self, AppServicesError> {
        let backend: Arc<dyn ReviewBackend> = Arc::new(HttpReviewBackend::new(config.api.clone())?);
        Ok(Self::with_backend(backend, config, clock, Arc::new(TokioTimer)))
    }

    /// Build services over any backend, e.g. `InMemoryBackend` in tests.
    #[must_use]
    pub fn with_backend(
        backend: Arc<dyn ReviewBackend>,
        config: &ReviewConfig,
        clock: Clock,
        timer: Arc<dyn Timer>,
    ) -> Self {
        let controller = ReviewSessionController::new(Arc::clone(&backend))
            .with_clock(clock)
            .with_timer(Arc::clone(&timer))
            .with_settings(config.controller);
        let batch_queue = Arc::new(
            BatchSubmissionQueue::new(Arc::clone(&backend))
                .with_timer(timer)
                .with_settings(config.batch),
        );

        Self {
            backend,
            controller,
            batch_queue,
        }
    }

    #[must_use]
    pub fn backend(&self) -> Arc<dyn ReviewBackend> {
        Arc::clone(&self.backend)
    }

    #[must_use]
    pub fn controller(&self) -> ReviewSessionController {
        self.controller.clone()
    }

    #[must_use]
    pub fn batch_queue(&self) -> Arc<BatchSubmissionQueue> {
        Arc::clone(&self.batch_queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::InMemoryBackend;
    use kanji_core::model::{ReviewCard, VocabId};
    use kanji_core::time::fixed_clock;

    #[tokio::test]
    async fn shared_handles_point_at_one_queue_and_session() {
        let backend = InMemoryBackend::with_due(vec![ReviewCard::new(
            VocabId::new(1),
            "空",
            "そら",
            "bầu trời",
            "sky",
        )]);
        let services = AppServices::with_backend(
            Arc::new(backend),
            &ReviewConfig::default(),
            fixed_clock(),
            Arc::new(TokioTimer),
        );

        assert!(Arc::ptr_eq(&services.batch_queue(), &services.batch_queue()));

        services.controller().initialize().await.unwrap();
        assert_eq!(services.controller().total_due_words(), 1);
    }

    #[test]
    fn http_services_build_from_default_config() {
        let services = AppServices::new_http(&ReviewConfig::default(), fixed_clock());
        assert!(services.is_ok());
    }
}
