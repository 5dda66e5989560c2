use rand::Rng;
use rand::rng;
use rand::seq::SliceRandom;

use kanji_core::model::ReviewCard;

/// Hard upper bound on cards in a single review session.
pub const MAX_SESSION_SIZE: usize = 50;

/// Largest selectable session size for the given number of due items.
#[must_use]
pub fn max_selectable(total_due: usize) -> usize {
    total_due.min(MAX_SESSION_SIZE)
}

/// Clamp a requested session size into `[1, min(50, total_due)]`.
///
/// Returns `0` when nothing is due, since the range is empty.
#[must_use]
pub fn clamp_selection(requested: usize, total_due: usize) -> usize {
    let max = max_selectable(total_due);
    if max == 0 { 0 } else { requested.clamp(1, max) }
}

/// Cards chosen for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub cards: Vec<ReviewCard>,
    pub due_available: usize,
}

impl SessionPlan {
    /// Total number of cards in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.cards.len()
    }

    /// Returns true when no cards were selected for this session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Samples a session from the due list: uniform random permutation, then prefix truncation.
pub struct SessionBuilder {
    size: usize,
}

impl SessionBuilder {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// Build a plan using the thread-local RNG.
    pub fn build(self, due: impl IntoIterator<Item = ReviewCard>) -> SessionPlan {
        self.build_with_rng(due, &mut rng())
    }

    /// Build a plan with a caller-supplied RNG.
    pub fn build_with_rng<R: Rng + ?Sized>(
        self,
        due: impl IntoIterator<Item = ReviewCard>,
        rng: &mut R,
    ) -> SessionPlan {
        let mut cards: Vec<ReviewCard> = due.into_iter().collect();
        let due_available = cards.len();
        let take = clamp_selection(self.size.max(1), due_available);

        cards.as_mut_slice().shuffle(rng);
        cards.truncate(take);

        SessionPlan {
            cards,
            due_available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanji_core::model::VocabId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn build_card(id: u64) -> ReviewCard {
        ReviewCard::new(VocabId::new(id), format!("語{id}"), "", "", "")
    }

    fn due(n: u64) -> Vec<ReviewCard> {
        (1..=n).map(build_card).collect()
    }

    #[test]
    fn clamp_respects_due_count() {
        assert_eq!(clamp_selection(10, 5), 5);
        assert_eq!(clamp_selection(0, 5), 1);
        assert_eq!(clamp_selection(3, 5), 3);
    }

    #[test]
    fn clamp_caps_at_fifty() {
        assert_eq!(clamp_selection(80, 200), MAX_SESSION_SIZE);
        assert_eq!(max_selectable(12), 12);
    }

    #[test]
    fn clamp_with_nothing_due_is_zero() {
        assert_eq!(clamp_selection(4, 0), 0);
    }

    #[test]
    fn builder_samples_without_replacement() {
        let mut rng = StdRng::seed_from_u64(7);
        let plan = SessionBuilder::new(4).build_with_rng(due(10), &mut rng);

        assert_eq!(plan.total(), 4);
        assert_eq!(plan.due_available, 10);
        let ids: HashSet<_> = plan.cards.iter().map(|c| c.vocab_id).collect();
        assert_eq!(ids.len(), 4);
        assert!(ids.iter().all(|id| (1..=10).contains(&id.value())));
    }

    #[test]
    fn builder_takes_everything_when_size_exceeds_due() {
        let plan = SessionBuilder::new(10).build(due(3));
        assert_eq!(plan.total(), 3);
    }

    #[test]
    fn builder_on_empty_due_list_is_empty() {
        let plan = SessionBuilder::new(5).build(Vec::new());
        assert!(plan.is_empty());
        assert_eq!(plan.due_available, 0);
    }

    #[test]
    fn every_card_can_come_first() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut firsts = HashSet::new();
        for _ in 0..200 {
            let plan = SessionBuilder::new(1).build_with_rng(due(3), &mut rng);
            firsts.insert(plan.cards[0].vocab_id);
        }
        assert_eq!(firsts.len(), 3);
    }
}
