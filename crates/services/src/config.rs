use std::env;
use std::time::Duration;

use backend::HttpReviewBackendConfig;

use crate::batch_queue::{BatchQueueSettings, DuplicatePolicy};
use crate::error::ConfigError;
use crate::sessions::ControllerSettings;

pub const ENV_API_BASE_URL: &str = "KANJI_API_BASE_URL";
pub const ENV_API_TOKEN: &str = "KANJI_API_TOKEN";
pub const ENV_BATCH_FLUSH_MS: &str = "KANJI_BATCH_FLUSH_MS";
pub const ENV_BATCH_DEDUP: &str = "KANJI_BATCH_DEDUP";
pub const ENV_TRANSITION_MS: &str = "KANJI_TRANSITION_MS";
pub const ENV_DEFAULT_SELECTION: &str = "KANJI_DEFAULT_SELECTION";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// Everything needed to assemble the review services.
#[derive(Clone, Debug)]
pub struct ReviewConfig {
    pub api: HttpReviewBackendConfig,
    pub controller: ControllerSettings,
    pub batch: BatchQueueSettings,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            api: HttpReviewBackendConfig::new(DEFAULT_API_BASE_URL),
            controller: ControllerSettings::default(),
            batch: BatchQueueSettings::default(),
        }
    }
}

impl ReviewConfig {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup. Unset keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a value is set but unusable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(base_url) = lookup(ENV_API_BASE_URL) {
            if base_url.trim().is_empty() {
                return Err(ConfigError::Empty {
                    var: ENV_API_BASE_URL,
                });
            }
            config.api.base_url = base_url.trim().to_owned();
        }
        config.api = config.api.with_token(lookup(ENV_API_TOKEN));

        if let Some(raw) = lookup(ENV_BATCH_FLUSH_MS) {
            config.batch.flush_delay = parse_millis(ENV_BATCH_FLUSH_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_BATCH_DEDUP) {
            config.batch.duplicates = parse_duplicate_policy(&raw)?;
        }
        if let Some(raw) = lookup(ENV_TRANSITION_MS) {
            config.controller.transition_delay = parse_millis(ENV_TRANSITION_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DEFAULT_SELECTION) {
            config.controller.default_selection = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: ENV_DEFAULT_SELECTION,
                    raw,
                })?;
        }

        Ok(config)
    }
}

fn parse_millis(var: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidNumber {
            var,
            raw: raw.to_owned(),
        })
}

fn parse_duplicate_policy(raw: &str) -> Result<DuplicatePolicy, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "keep-all" | "keep_all" | "all" => Ok(DuplicatePolicy::KeepAll),
        "latest" | "latest-per-vocab" => Ok(DuplicatePolicy::LatestPerVocab),
        _ => Err(ConfigError::InvalidChoice {
            var: ENV_BATCH_DEDUP,
            raw: raw.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = ReviewConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api.base_url, DEFAULT_API_BASE_URL);
        assert!(config.api.token.is_none());
        assert_eq!(config.batch.flush_delay, Duration::from_millis(5000));
        assert_eq!(config.batch.duplicates, DuplicatePolicy::KeepAll);
        assert_eq!(config.controller, ControllerSettings::default());
    }

    #[test]
    fn reads_overrides() {
        let config = ReviewConfig::from_lookup(lookup(&[
            (ENV_API_BASE_URL, " https://kanji.example/api "),
            (ENV_API_TOKEN, "secret"),
            (ENV_BATCH_FLUSH_MS, "2500"),
            (ENV_BATCH_DEDUP, "latest"),
            (ENV_TRANSITION_MS, "0"),
            (ENV_DEFAULT_SELECTION, "20"),
        ]))
        .unwrap();

        assert_eq!(config.api.base_url, "https://kanji.example/api");
        assert_eq!(config.api.token.as_deref(), Some("secret"));
        assert_eq!(config.batch.flush_delay, Duration::from_millis(2500));
        assert_eq!(config.batch.duplicates, DuplicatePolicy::LatestPerVocab);
        assert!(config.controller.transition_delay.is_zero());
        assert_eq!(config.controller.default_selection, 20);
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = ReviewConfig::from_lookup(lookup(&[(ENV_BATCH_FLUSH_MS, "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                var: ENV_BATCH_FLUSH_MS,
                raw: "soon".into()
            }
        );
    }

    #[test]
    fn rejects_unknown_dedup_policy() {
        let err = ReviewConfig::from_lookup(lookup(&[(ENV_BATCH_DEDUP, "first")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidChoice { .. }));
    }

    #[test]
    fn rejects_blank_base_url() {
        let err = ReviewConfig::from_lookup(lookup(&[(ENV_API_BASE_URL, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Empty { .. }));
    }
}
