use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use backend::ReviewBackend;
use kanji_core::model::{ReviewOutcome, ReviewResult, VocabId};

use crate::submission::{SubmissionReport, submit_outcomes};
use crate::timer::{Timer, TokioTimer};

/// How long outcomes accumulate before one bulk submission.
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_millis(5000);

/// What to do with repeated answers for the same vocab inside one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Send every recorded outcome, in enqueue order.
    #[default]
    KeepAll,
    /// Send one outcome per vocab carrying its latest result, in first-seen order.
    LatestPerVocab,
}

impl DuplicatePolicy {
    fn apply(self, entries: Vec<ReviewOutcome>) -> Vec<ReviewOutcome> {
        match self {
            DuplicatePolicy::KeepAll => entries,
            DuplicatePolicy::LatestPerVocab => {
                let mut seen: HashMap<VocabId, usize> = HashMap::with_capacity(entries.len());
                let mut collapsed: Vec<ReviewOutcome> = Vec::with_capacity(entries.len());
                for entry in entries {
                    match seen.get(&entry.vocab_id) {
                        Some(&at) => collapsed[at] = entry,
                        None => {
                            seen.insert(entry.vocab_id, collapsed.len());
                            collapsed.push(entry);
                        }
                    }
                }
                collapsed
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchQueueSettings {
    pub flush_delay: Duration,
    pub duplicates: DuplicatePolicy,
}

impl Default for BatchQueueSettings {
    fn default() -> Self {
        Self {
            flush_delay: DEFAULT_FLUSH_DELAY,
            duplicates: DuplicatePolicy::default(),
        }
    }
}

struct ScheduledFlush {
    id: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct PendingBatch {
    entries: Vec<ReviewOutcome>,
    scheduled: Option<ScheduledFlush>,
    next_flush_id: u64,
}

/// Coalesces incidental review outcomes (flashcard flips outside a session)
/// into one backend call per time window.
///
/// Create one per running client and share it. Delivery is at most once per
/// window: a failed flush is logged and its batch dropped.
#[derive(Clone)]
pub struct BatchSubmissionQueue {
    backend: Arc<dyn ReviewBackend>,
    timer: Arc<dyn Timer>,
    settings: BatchQueueSettings,
    pending: Arc<Mutex<PendingBatch>>,
}

impl BatchSubmissionQueue {
    #[must_use]
    pub fn new(backend: Arc<dyn ReviewBackend>) -> Self {
        Self {
            backend,
            timer: Arc::new(TokioTimer),
            settings: BatchQueueSettings::default(),
            pending: Arc::new(Mutex::new(PendingBatch::default())),
        }
    }

    #[must_use]
    pub fn with_timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = timer;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: BatchQueueSettings) -> Self {
        self.settings = settings;
        self
    }

    fn lock(&self) -> MutexGuard<'_, PendingBatch> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue one outcome, arming the flush timer if it is not already armed.
    ///
    /// Outside a Tokio runtime the outcome is kept but no timer is armed; it
    /// goes out with the next timed flush or `flush_now`.
    pub fn enqueue(&self, vocab_id: VocabId, result: ReviewResult) {
        let mut pending = self.lock();
        pending.entries.push(ReviewOutcome::new(vocab_id, result));
        if pending.scheduled.is_some() {
            return;
        }

        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(
                pending = pending.entries.len(),
                "no tokio runtime; review batch flush not scheduled"
            );
            return;
        };

        let id = pending.next_flush_id;
        pending.next_flush_id = id.wrapping_add(1);

        let queue = self.clone();
        let handle = runtime.spawn(async move {
            queue.timer.sleep(queue.settings.flush_delay).await;
            queue.flush_scheduled(id).await;
        });
        pending.scheduled = Some(ScheduledFlush { id, handle });
        tracing::debug!(
            delay_ms = self.settings.flush_delay.as_millis(),
            "scheduled review batch flush"
        );
    }

    async fn flush_scheduled(&self, id: u64) {
        let batch = {
            let mut pending = self.lock();
            if pending.scheduled.as_ref().map(|flush| flush.id) != Some(id) {
                return;
            }
            // Cleared before submitting so new outcomes arm a fresh timer.
            pending.scheduled = None;
            std::mem::take(&mut pending.entries)
        };
        self.dispatch(batch).await;
    }

    /// Submit whatever is pending right away and disarm the timer.
    pub async fn flush_now(&self) -> SubmissionReport {
        let batch = {
            let mut pending = self.lock();
            if let Some(flush) = pending.scheduled.take() {
                flush.handle.abort();
            }
            std::mem::take(&mut pending.entries)
        };
        self.dispatch(batch).await
    }

    async fn dispatch(&self, batch: Vec<ReviewOutcome>) -> SubmissionReport {
        let batch = self.settings.duplicates.apply(batch);
        let report = submit_outcomes(self.backend.as_ref(), &batch).await;
        match &report {
            SubmissionReport::Failed { count, error } => {
                tracing::warn!(count, %error, "dropping review batch after failed submission");
            }
            SubmissionReport::Submitted { count } => {
                tracing::debug!(count, "flushed review batch");
            }
            SubmissionReport::NothingToSubmit => {}
        }
        report
    }

    /// Outcomes waiting for the next flush.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn has_scheduled_flush(&self) -> bool {
        self.lock().scheduled.is_some()
    }
}

impl fmt::Debug for BatchSubmissionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = self.lock();
        f.debug_struct("BatchSubmissionQueue")
            .field("pending", &pending.entries.len())
            .field("scheduled", &pending.scheduled.is_some())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend::InMemoryBackend;

    fn queue(backend: &InMemoryBackend) -> BatchSubmissionQueue {
        BatchSubmissionQueue::new(Arc::new(backend.clone()))
    }

    fn outcome(id: u64, result: ReviewResult) -> ReviewOutcome {
        ReviewOutcome::new(VocabId::new(id), result)
    }

    #[test]
    fn enqueue_outside_runtime_keeps_outcome_unscheduled() {
        let backend = InMemoryBackend::new();
        let queue = queue(&backend);

        queue.enqueue(VocabId::new(4), ReviewResult::Good);
        assert_eq!(queue.pending_len(), 1);
        assert!(!queue.has_scheduled_flush());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let report = runtime.block_on(queue.flush_now());
        assert_eq!(report.submitted(), 1);
        assert_eq!(
            backend.submissions(),
            vec![vec![outcome(4, ReviewResult::Good)]]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn one_flush_per_window() {
        let backend = InMemoryBackend::new();
        let queue = queue(&backend);

        queue.enqueue(VocabId::new(1), ReviewResult::Easy);
        queue.enqueue(VocabId::new(2), ReviewResult::Good);
        queue.enqueue(VocabId::new(3), ReviewResult::Again);
        assert!(queue.has_scheduled_flush());
        assert_eq!(queue.pending_len(), 3);

        tokio::time::sleep(Duration::from_millis(4999)).await;
        assert!(backend.submissions().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(
            backend.submissions(),
            vec![vec![
                outcome(1, ReviewResult::Easy),
                outcome(2, ReviewResult::Good),
                outcome(3, ReviewResult::Again),
            ]]
        );
        assert!(!queue.has_scheduled_flush());
        assert_eq!(queue.pending_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn enqueue_after_flush_arms_fresh_timer() {
        let backend = InMemoryBackend::new();
        let queue = queue(&backend);

        queue.enqueue(VocabId::new(1), ReviewResult::Good);
        tokio::time::sleep(DEFAULT_FLUSH_DELAY + Duration::from_millis(1)).await;
        assert_eq!(backend.submissions().len(), 1);

        queue.enqueue(VocabId::new(4), ReviewResult::Easy);
        assert!(queue.has_scheduled_flush());
        tokio::time::sleep(DEFAULT_FLUSH_DELAY + Duration::from_millis(1)).await;

        let submissions = backend.submissions();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[1], vec![outcome(4, ReviewResult::Easy)]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_flush_drops_batch() {
        let backend = InMemoryBackend::new();
        backend.fail_submissions(true);
        let queue = queue(&backend);

        queue.enqueue(VocabId::new(1), ReviewResult::Again);
        tokio::time::sleep(DEFAULT_FLUSH_DELAY * 3).await;
        assert_eq!(queue.pending_len(), 0);
        assert!(!queue.has_scheduled_flush());

        backend.fail_submissions(false);
        queue.enqueue(VocabId::new(2), ReviewResult::Good);
        tokio::time::sleep(DEFAULT_FLUSH_DELAY + Duration::from_millis(1)).await;
        assert_eq!(backend.submissions(), vec![vec![outcome(2, ReviewResult::Good)]]);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicates_are_kept_by_default() {
        let backend = InMemoryBackend::new();
        let queue = queue(&backend);

        queue.enqueue(VocabId::new(1), ReviewResult::Again);
        queue.enqueue(VocabId::new(1), ReviewResult::Easy);
        tokio::time::sleep(DEFAULT_FLUSH_DELAY + Duration::from_millis(1)).await;

        assert_eq!(backend.submissions()[0].len(), 2);
    }

    #[tokio::test]
    async fn latest_per_vocab_collapses_in_first_seen_order() {
        let backend = InMemoryBackend::new();
        let queue = queue(&backend).with_settings(BatchQueueSettings {
            duplicates: DuplicatePolicy::LatestPerVocab,
            ..BatchQueueSettings::default()
        });

        queue.enqueue(VocabId::new(1), ReviewResult::Again);
        queue.enqueue(VocabId::new(2), ReviewResult::Good);
        queue.enqueue(VocabId::new(1), ReviewResult::Easy);
        let report = queue.flush_now().await;

        assert_eq!(report.submitted(), 2);
        assert_eq!(
            backend.submissions(),
            vec![vec![outcome(1, ReviewResult::Easy), outcome(2, ReviewResult::Good)]]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn flush_now_disarms_timer() {
        let backend = InMemoryBackend::new();
        let queue = queue(&backend);

        queue.enqueue(VocabId::new(9), ReviewResult::Good);
        let report = queue.flush_now().await;
        assert_eq!(report.submitted(), 1);
        assert!(!queue.has_scheduled_flush());

        tokio::time::sleep(DEFAULT_FLUSH_DELAY * 2).await;
        assert_eq!(backend.submissions().len(), 1);
    }

    #[tokio::test]
    async fn flush_now_with_nothing_pending_skips_backend() {
        let backend = InMemoryBackend::new();
        let queue = queue(&backend);

        assert!(matches!(
            queue.flush_now().await,
            SubmissionReport::NothingToSubmit
        ));
        assert!(backend.submissions().is_empty());
    }
}
