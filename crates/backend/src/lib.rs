#![forbid(unsafe_code)]

pub mod api;
pub mod http;

pub use api::{BackendError, InMemoryBackend, ReviewBackend};
pub use http::{HttpReviewBackend, HttpReviewBackendConfig};
