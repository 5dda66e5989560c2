use chrono::{DateTime, Utc};

use kanji_core::model::{ReviewCard, SessionStats, SessionView};

/// Presentation-agnostic picture of a review session at one instant.
///
/// This is intentionally **not** a UI view-model:
/// - no pre-formatted strings
/// - no localization assumptions
///
/// The UI decides how to render the meanings, furigana and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub view: SessionView,
    pub total_due_words: usize,
    pub selected_word_count: usize,
    pub max_selectable: usize,

    /// Only present in `Review`.
    pub current_card: Option<ReviewCard>,
    pub current_index: usize,
    pub card_count: usize,
    pub revealed: bool,
    pub transitioning: bool,

    pub stats: SessionStats,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    /// 1-based position for "card 3 of 10" style labels.
    #[must_use]
    pub fn position(&self) -> Option<(usize, usize)> {
        self.current_card
            .as_ref()
            .map(|_| (self.current_index + 1, self.card_count))
    }

    /// Wall time between session start and completion, once complete.
    #[must_use]
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        Some(self.completed_at? - self.started_at?)
    }
}
