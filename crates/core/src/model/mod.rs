mod card;
mod ids;
mod review;
mod session;

pub use ids::{KanjiId, ParseIdError, VocabId};

pub use card::{KanjiFacet, ReviewCard};
pub use review::{ReviewError, ReviewOutcome, ReviewResult};
pub use session::{SessionStats, SessionView};
