mod controller;
mod plan;
mod progress;
mod view;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::{
    AnswerOutcome, ControllerSettings, DEFAULT_SELECTION, DEFAULT_TRANSITION_DELAY, IgnoreReason,
    ReviewSessionController,
};
pub use plan::{MAX_SESSION_SIZE, SessionBuilder, SessionPlan, clamp_selection, max_selectable};
pub use progress::SessionProgress;
pub use view::SessionSnapshot;
