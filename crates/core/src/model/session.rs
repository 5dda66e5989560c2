use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ReviewResult;

//
// ─── SESSION VIEW ─────────────────────────────────────────────────────────────
//

/// Position of a review session in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionView {
    /// Idle, showing how many items are due.
    #[default]
    Stats,
    /// Choosing how many due items to review.
    Selection,
    /// Iterating cards.
    Review,
    /// Terminal view with the final counters.
    Summary,
}

impl fmt::Display for SessionView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionView::Stats => "stats",
            SessionView::Selection => "selection",
            SessionView::Review => "review",
            SessionView::Summary => "summary",
        };
        f.write_str(name)
    }
}

//
// ─── SESSION STATS ────────────────────────────────────────────────────────────
//

/// Aggregate counters for the active session.
///
/// `remembered + somewhat_remembered + forgotten` never exceeds `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total: u32,
    pub remembered: u32,
    pub somewhat_remembered: u32,
    pub forgotten: u32,
}

impl SessionStats {
    #[must_use]
    pub fn with_total(total: u32) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// Count one answer. Exactly one counter moves per call.
    pub fn record(&mut self, result: ReviewResult) {
        match result {
            ReviewResult::Easy => self.remembered = self.remembered.saturating_add(1),
            ReviewResult::Good => {
                self.somewhat_remembered = self.somewhat_remembered.saturating_add(1);
            }
            ReviewResult::Again => self.forgotten = self.forgotten.saturating_add(1),
        }
    }

    /// Number of answers counted so far.
    #[must_use]
    pub fn answered(&self) -> u32 {
        self.remembered
            .saturating_add(self.somewhat_remembered)
            .saturating_add(self.forgotten)
    }

    /// True when every card in the session has an answer.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.answered() == self.total
    }

    /// Shrink `total` to the answers actually given, for sessions ended early.
    pub fn close_at_answered(&mut self) {
        self.total = self.answered();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_moves_exactly_one_counter() {
        let mut stats = SessionStats::with_total(3);
        stats.record(ReviewResult::Easy);
        stats.record(ReviewResult::Good);
        stats.record(ReviewResult::Again);

        assert_eq!(stats.remembered, 1);
        assert_eq!(stats.somewhat_remembered, 1);
        assert_eq!(stats.forgotten, 1);
        assert!(stats.is_complete());
    }

    #[test]
    fn closing_early_keeps_counts_consistent() {
        let mut stats = SessionStats::with_total(4);
        stats.record(ReviewResult::Good);
        stats.record(ReviewResult::Good);
        assert!(!stats.is_complete());

        stats.close_at_answered();
        assert_eq!(stats.total, 2);
        assert!(stats.is_complete());
    }

    #[test]
    fn view_names_match_wire_form() {
        assert_eq!(SessionView::Selection.to_string(), "selection");
        let json = serde_json::to_string(&SessionView::Summary).unwrap();
        assert_eq!(json, "\"summary\"");
    }
}
