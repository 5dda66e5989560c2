#![forbid(unsafe_code)]

pub mod app_services;
pub mod batch_queue;
pub mod config;
pub mod error;
pub mod sessions;
pub mod submission;
pub mod timer;

pub use kanji_core::Clock;
pub use sessions as session;

pub use app_services::AppServices;
pub use batch_queue::{BatchQueueSettings, BatchSubmissionQueue, DuplicatePolicy};
pub use config::ReviewConfig;
pub use error::{AppServicesError, ConfigError, SessionError};
pub use submission::SubmissionReport;
pub use timer::{Timer, TokioTimer};

pub use sessions::{
    AnswerOutcome, ControllerSettings, IgnoreReason, ReviewSessionController, SessionProgress,
    SessionSnapshot,
};
