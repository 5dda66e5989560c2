use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use backend::ReviewBackend;
use kanji_core::Clock;
use kanji_core::model::{ReviewCard, ReviewOutcome, ReviewResult, SessionStats, SessionView};

use super::plan::{SessionBuilder, clamp_selection, max_selectable};
use super::progress::SessionProgress;
use super::view::SessionSnapshot;
use crate::error::SessionError;
use crate::submission::{SubmissionReport, submit_outcomes};
use crate::timer::{Timer, TokioTimer};

/// Time a card change takes to settle before the next answer is accepted.
pub const DEFAULT_TRANSITION_DELAY: Duration = Duration::from_millis(300);

/// Session size offered when the learner opens the selection view.
pub const DEFAULT_SELECTION: usize = 10;

//
// ─── SETTINGS & RESULTS ────────────────────────────────────────────────────────
//

/// Tunables for `ReviewSessionController`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Zero advances to the next card immediately.
    pub transition_delay: Duration,
    pub default_selection: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            transition_delay: DEFAULT_TRANSITION_DELAY,
            default_selection: DEFAULT_SELECTION,
        }
    }
}

/// Why an answer was dropped without touching the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NotReviewing,
    NoActiveCard,
    TransitionInFlight,
}

/// Result of `ReviewSessionController::record_outcome`.
#[derive(Debug)]
pub enum AnswerOutcome {
    /// The answer was counted and the session is moving to `next_index`.
    Advanced { next_index: usize },
    /// The answer was the last one; the session is in `Summary`.
    Completed(SubmissionReport),
    Ignored(IgnoreReason),
}

impl AnswerOutcome {
    #[must_use]
    pub fn was_counted(&self) -> bool {
        !matches!(self, AnswerOutcome::Ignored(_))
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

struct ActiveSession {
    cards: Vec<ReviewCard>,
    current_index: usize,
    outcomes: Vec<ReviewOutcome>,
    stats: SessionStats,
    revealed: bool,
    transition: Option<JoinHandle<()>>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl ActiveSession {
    fn new(cards: Vec<ReviewCard>, started_at: DateTime<Utc>) -> Self {
        let total = u32::try_from(cards.len()).unwrap_or(u32::MAX);
        Self {
            cards,
            current_index: 0,
            outcomes: Vec::new(),
            stats: SessionStats::with_total(total),
            revealed: false,
            transition: None,
            started_at,
            completed_at: None,
        }
    }

    fn current_card(&self) -> Option<&ReviewCard> {
        self.cards.get(self.current_index)
    }

    fn is_last(&self) -> bool {
        self.current_index + 1 >= self.cards.len()
    }

    fn cancel_transition(&mut self) {
        if let Some(handle) = self.transition.take() {
            handle.abort();
        }
    }
}

#[derive(Default)]
struct ControllerState {
    view: SessionView,
    // Bumped on every view change; async work started under an older epoch is discarded.
    epoch: u64,
    total_due_words: usize,
    selected_word_count: usize,
    session: Option<ActiveSession>,
}

impl ControllerState {
    fn enter(&mut self, view: SessionView) {
        tracing::debug!(from = %self.view, to = %view, "review session view change");
        if let Some(session) = self.session.as_mut() {
            session.cancel_transition();
        }
        if matches!(view, SessionView::Stats | SessionView::Selection) {
            self.session = None;
        }
        self.view = view;
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn reject(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            view: self.view,
            action,
        }
    }

    /// Shrinks the selection when fewer items are due. Never grows it.
    fn reclamp_selection(&mut self) {
        if self.view == SessionView::Selection {
            self.selected_word_count = self
                .selected_word_count
                .min(max_selectable(self.total_due_words));
        }
    }
}

fn lock_state(state: &Mutex<ControllerState>) -> MutexGuard<'_, ControllerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Drives one review session at a time: due count, selection, card iteration, summary.
///
/// Cloning yields another handle to the same session, so the presentation layer
/// can issue an action while an earlier one is still awaiting the backend. The
/// later view change wins; results from superseded requests are dropped.
#[derive(Clone)]
pub struct ReviewSessionController {
    backend: Arc<dyn ReviewBackend>,
    timer: Arc<dyn Timer>,
    clock: Clock,
    settings: ControllerSettings,
    state: Arc<Mutex<ControllerState>>,
}

impl ReviewSessionController {
    #[must_use]
    pub fn new(backend: Arc<dyn ReviewBackend>) -> Self {
        Self {
            backend,
            timer: Arc::new(TokioTimer),
            clock: Clock::default(),
            settings: ControllerSettings::default(),
            state: Arc::new(Mutex::new(ControllerState::default())),
        }
    }

    #[must_use]
    pub fn with_timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = timer;
        self
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ControllerSettings) -> Self {
        self.settings = settings;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        lock_state(&self.state)
    }

    //
    // ─── STATS ─────────────────────────────────────────────────────────────────
    //

    /// Load the due count. Intended for the presentation layer's mount hook.
    ///
    /// # Errors
    ///
    /// See [`Self::refresh`].
    pub async fn initialize(&self) -> Result<usize, SessionError> {
        self.refresh().await
    }

    /// Re-fetch the due count.
    ///
    /// On failure the due count drops to zero and the view is left alone.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Backend` when the fetch fails and
    /// `SessionError::Superseded` when the view changed while it was running.
    pub async fn refresh(&self) -> Result<usize, SessionError> {
        let epoch = self.lock().epoch;
        let fetched = self.backend.fetch_due_reviews().await;

        let mut state = self.lock();
        if state.epoch != epoch {
            return Err(SessionError::Superseded);
        }

        match fetched {
            Ok(cards) => {
                state.total_due_words = cards.len();
                state.reclamp_selection();
                Ok(cards.len())
            }
            Err(error) => {
                tracing::warn!(%error, "failed to load due review count");
                state.total_due_words = 0;
                state.reclamp_selection();
                Err(error.into())
            }
        }
    }

    /// Move from `Stats` to `Selection`. Returns the initial session size.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when nothing is due, or
    /// `SessionError::InvalidTransition` outside the `Stats` view.
    pub fn begin_selection(&self) -> Result<usize, SessionError> {
        let mut state = self.lock();
        if state.view != SessionView::Stats {
            return Err(state.reject("begin selection"));
        }
        if state.total_due_words == 0 {
            return Err(SessionError::Empty);
        }

        state.enter(SessionView::Selection);
        state.selected_word_count =
            clamp_selection(self.settings.default_selection, state.total_due_words);
        Ok(state.selected_word_count)
    }

    //
    // ─── SELECTION ─────────────────────────────────────────────────────────────
    //

    /// Set the session size, clamped to `[1, min(50, due)]`. Returns the stored value.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside the `Selection` view.
    pub fn set_selected_word_count(&self, requested: usize) -> Result<usize, SessionError> {
        let mut state = self.lock();
        if state.view != SessionView::Selection {
            return Err(state.reject("change the session size"));
        }
        state.selected_word_count = clamp_selection(requested, state.total_due_words);
        Ok(state.selected_word_count)
    }

    /// Leave `Selection` for `Stats`, dropping any session start still in flight,
    /// and reload the due count for the stats view.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` outside the `Selection` view, or
    /// the refresh error once back in `Stats`.
    pub async fn cancel(&self) -> Result<usize, SessionError> {
        {
            let mut state = self.lock();
            if state.view != SessionView::Selection {
                return Err(state.reject("cancel selection"));
            }
            state.enter(SessionView::Stats);
        }
        self.refresh().await
    }

    /// Fetch the due list fresh, sample the session and enter `Review`.
    ///
    /// Returns the number of cards in the new session.
    ///
    /// # Errors
    ///
    /// - `SessionError::InvalidTransition` outside the `Selection` view.
    /// - `SessionError::Backend` if the fetch fails; the view returns to `Stats`.
    /// - `SessionError::Empty` if nothing is due; the view returns to `Stats`.
    /// - `SessionError::Superseded` if another action changed the view meanwhile.
    pub async fn start_review_session(&self) -> Result<usize, SessionError> {
        let epoch = {
            let state = self.lock();
            if state.view != SessionView::Selection {
                return Err(state.reject("start a review session"));
            }
            state.epoch
        };

        let fetched = self.backend.fetch_due_reviews().await;

        let mut state = self.lock();
        if state.epoch != epoch {
            tracing::debug!("discarding due reviews for a superseded session start");
            return Err(SessionError::Superseded);
        }

        let due = match fetched {
            Ok(due) => due,
            Err(error) => {
                tracing::warn!(%error, "failed to load due reviews for session");
                state.total_due_words = 0;
                state.enter(SessionView::Stats);
                return Err(error.into());
            }
        };

        state.total_due_words = due.len();
        let plan = SessionBuilder::new(state.selected_word_count).build(due);
        if plan.is_empty() {
            state.enter(SessionView::Stats);
            return Err(SessionError::Empty);
        }

        let card_count = plan.total();
        tracing::debug!(card_count, due = plan.due_available, "starting review session");
        state.enter(SessionView::Review);
        state.session = Some(ActiveSession::new(plan.cards, self.clock.now()));
        Ok(card_count)
    }

    //
    // ─── REVIEW ────────────────────────────────────────────────────────────────
    //

    /// Turn the current card face-up. Returns whether a card is now revealed.
    pub fn reveal(&self) -> bool {
        self.update_face(|_| true)
    }

    /// Toggle the current card's face. Returns whether a card is now revealed.
    pub fn flip(&self) -> bool {
        self.update_face(|revealed| !revealed)
    }

    fn update_face(&self, next: impl FnOnce(bool) -> bool) -> bool {
        let mut state = self.lock();
        if state.view != SessionView::Review {
            return false;
        }
        match state.session.as_mut() {
            Some(session) if session.transition.is_none() && session.current_card().is_some() => {
                session.revealed = next(session.revealed);
                session.revealed
            }
            _ => false,
        }
    }

    /// Record the learner's verdict for the current card.
    ///
    /// Counts the answer exactly once, then either schedules the move to the
    /// next card or, on the last card, enters `Summary` and submits every
    /// outcome of the session. A failed submission is reported in the result;
    /// the session still ends.
    pub async fn record_outcome(&self, result: ReviewResult) -> AnswerOutcome {
        let outcomes = {
            let mut guard = self.lock();
            let state = &mut *guard;
            if state.view != SessionView::Review {
                return AnswerOutcome::Ignored(IgnoreReason::NotReviewing);
            }
            let epoch = state.epoch;
            let Some(session) = state.session.as_mut() else {
                return AnswerOutcome::Ignored(IgnoreReason::NoActiveCard);
            };
            if session.transition.is_some() {
                return AnswerOutcome::Ignored(IgnoreReason::TransitionInFlight);
            }
            let Some(vocab_id) = session.current_card().map(|card| card.vocab_id) else {
                return AnswerOutcome::Ignored(IgnoreReason::NoActiveCard);
            };

            session.outcomes.push(ReviewOutcome::new(vocab_id, result));
            session.stats.record(result);

            if !session.is_last() {
                let from_index = session.current_index;
                let next_index = from_index + 1;
                session.revealed = false;
                if self.settings.transition_delay.is_zero() {
                    session.current_index = next_index;
                } else {
                    session.transition = Some(self.spawn_transition(epoch, from_index));
                }
                return AnswerOutcome::Advanced { next_index };
            }

            session.completed_at = Some(self.clock.now());
            let outcomes = session.outcomes.clone();
            state.enter(SessionView::Summary);
            outcomes
        };

        AnswerOutcome::Completed(self.submit(&outcomes).await)
    }

    fn spawn_transition(&self, epoch: u64, from_index: usize) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let timer = Arc::clone(&self.timer);
        let delay = self.settings.transition_delay;

        tokio::spawn(async move {
            timer.sleep(delay).await;

            let mut guard = lock_state(&state);
            if guard.epoch != epoch || guard.view != SessionView::Review {
                return;
            }
            if let Some(session) = guard.session.as_mut() {
                if session.current_index == from_index {
                    session.current_index = from_index + 1;
                    session.revealed = false;
                }
                session.transition = None;
            }
        })
    }

    /// End the session early and submit whatever has been answered.
    ///
    /// Also valid from `Selection`, where it abandons a session start still in
    /// flight and shows an empty summary.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` from `Stats` or `Summary`.
    pub async fn end_session(&self) -> Result<SubmissionReport, SessionError> {
        let outcomes = {
            let mut guard = self.lock();
            let state = &mut *guard;
            match state.view {
                SessionView::Review => {
                    let now = self.clock.now();
                    let outcomes = match state.session.as_mut() {
                        Some(session) => {
                            session.cancel_transition();
                            session.stats.close_at_answered();
                            session.completed_at = Some(now);
                            session.outcomes.clone()
                        }
                        None => Vec::new(),
                    };
                    state.enter(SessionView::Summary);
                    outcomes
                }
                SessionView::Selection => {
                    state.enter(SessionView::Summary);
                    Vec::new()
                }
                SessionView::Stats | SessionView::Summary => {
                    return Err(state.reject("end the session"));
                }
            }
        };

        Ok(self.submit(&outcomes).await)
    }

    async fn submit(&self, outcomes: &[ReviewOutcome]) -> SubmissionReport {
        let report = submit_outcomes(self.backend.as_ref(), outcomes).await;
        if let SubmissionReport::Failed { count, error } = &report {
            tracing::warn!(count, %error, "failed to submit review session outcomes");
        }
        report
    }

    //
    // ─── SUMMARY ───────────────────────────────────────────────────────────────
    //

    /// Discard the finished session, return to `Stats` and reload the due count.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` from `Selection` or `Review`,
    /// otherwise whatever [`Self::refresh`] returns. The view is `Stats` either way.
    pub async fn start_new_session(&self) -> Result<usize, SessionError> {
        {
            let mut state = self.lock();
            match state.view {
                SessionView::Summary | SessionView::Stats => state.enter(SessionView::Stats),
                SessionView::Selection | SessionView::Review => {
                    return Err(state.reject("start a new session"));
                }
            }
        }
        self.refresh().await
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn current_view(&self) -> SessionView {
        self.lock().view
    }

    /// The card being reviewed, only while in `Review`.
    #[must_use]
    pub fn current_card(&self) -> Option<ReviewCard> {
        let state = self.lock();
        if state.view != SessionView::Review {
            return None;
        }
        state
            .session
            .as_ref()
            .and_then(ActiveSession::current_card)
            .cloned()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.lock()
            .session
            .as_ref()
            .map_or(0, |session| session.current_index)
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.lock()
            .session
            .as_ref()
            .map(|session| session.stats)
            .unwrap_or_default()
    }

    /// Outcomes recorded in the current or just-finished session, in answer order.
    #[must_use]
    pub fn outcomes(&self) -> Vec<ReviewOutcome> {
        self.lock()
            .session
            .as_ref()
            .map(|session| session.outcomes.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        self.lock()
            .session
            .as_ref()
            .map(|session| SessionProgress::new(session.cards.len(), session.outcomes.len()))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn total_due_words(&self) -> usize {
        self.lock().total_due_words
    }

    #[must_use]
    pub fn selected_word_count(&self) -> usize {
        self.lock().selected_word_count
    }

    /// Whether the current card is face-up. Always false outside `Review`.
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        let state = self.lock();
        state.view == SessionView::Review
            && state.session.as_ref().is_some_and(|session| session.revealed)
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        self.lock()
            .session
            .as_ref()
            .is_some_and(|session| session.transition.is_some())
    }

    /// Everything the presentation layer needs to render the current view.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        let session = state.session.as_ref();
        let reviewing = state.view == SessionView::Review;

        SessionSnapshot {
            view: state.view,
            total_due_words: state.total_due_words,
            selected_word_count: state.selected_word_count,
            max_selectable: max_selectable(state.total_due_words),
            current_card: session
                .filter(|_| reviewing)
                .and_then(ActiveSession::current_card)
                .cloned(),
            current_index: session.map_or(0, |s| s.current_index),
            card_count: session.map_or(0, |s| s.cards.len()),
            revealed: session.is_some_and(|s| reviewing && s.revealed),
            transitioning: session.is_some_and(|s| s.transition.is_some()),
            stats: session.map(|s| s.stats).unwrap_or_default(),
            started_at: session.map(|s| s.started_at),
            completed_at: session.and_then(|s| s.completed_at),
        }
    }
}

impl fmt::Debug for ReviewSessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ReviewSessionController")
            .field("view", &state.view)
            .field("epoch", &state.epoch)
            .field("total_due_words", &state.total_due_words)
            .field("selected_word_count", &state.selected_word_count)
            .field("session_cards", &state.session.as_ref().map(|s| s.cards.len()))
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
