use backend::{BackendError, ReviewBackend};
use kanji_core::model::ReviewOutcome;

/// What happened when a set of outcomes was handed to the backend.
#[derive(Debug)]
#[non_exhaustive]
pub enum SubmissionReport {
    Submitted { count: usize },
    NothingToSubmit,
    Failed { count: usize, error: BackendError },
}

impl SubmissionReport {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, SubmissionReport::Failed { .. })
    }

    /// Number of outcomes that reached the backend.
    #[must_use]
    pub fn submitted(&self) -> usize {
        match self {
            SubmissionReport::Submitted { count } => *count,
            _ => 0,
        }
    }
}

/// Submit outcomes once. Empty input never hits the backend.
pub(crate) async fn submit_outcomes(
    backend: &dyn ReviewBackend,
    outcomes: &[ReviewOutcome],
) -> SubmissionReport {
    if outcomes.is_empty() {
        return SubmissionReport::NothingToSubmit;
    }

    match backend.submit_review_outcomes(outcomes).await {
        Ok(()) => SubmissionReport::Submitted {
            count: outcomes.len(),
        },
        Err(error) => SubmissionReport::Failed {
            count: outcomes.len(),
            error,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::InMemoryBackend;
    use kanji_core::model::{ReviewResult, VocabId};

    #[tokio::test]
    async fn empty_input_skips_backend() {
        let backend = InMemoryBackend::new();
        let report = submit_outcomes(&backend, &[]).await;
        assert!(matches!(report, SubmissionReport::NothingToSubmit));
        assert!(backend.submissions().is_empty());
    }

    #[tokio::test]
    async fn failure_keeps_count_and_error() {
        let backend = InMemoryBackend::new();
        backend.fail_submissions(true);
        let outcomes = [ReviewOutcome::new(VocabId::new(1), ReviewResult::Good)];

        let report = submit_outcomes(&backend, &outcomes).await;
        assert!(report.is_failure());
        assert_eq!(report.submitted(), 0);
        assert!(matches!(report, SubmissionReport::Failed { count: 1, .. }));
    }
}
