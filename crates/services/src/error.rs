//! Shared error types for the services crate.

use thiserror::Error;

use backend::BackendError;
use kanji_core::model::SessionView;

/// Errors emitted by the review session controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no due reviews available")]
    Empty,
    #[error("cannot {action} from the {view} view")]
    InvalidTransition {
        view: SessionView,
        action: &'static str,
    },
    #[error("session changed while the request was in flight")]
    Superseded,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} cannot be empty")]
    Empty { var: &'static str },
    #[error("{var} must be a non-negative integer, got {raw:?}")]
    InvalidNumber { var: &'static str, raw: String },
    #[error("{var} has unsupported value {raw:?}")]
    InvalidChoice { var: &'static str, raw: String },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
