use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::VocabId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur while interpreting review results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReviewError {
    #[error("invalid review result value: {0}")]
    InvalidResult(u8),
    #[error("unknown review result: {0:?}")]
    UnknownResult(String),
}

//
// ─── REVIEW RESULT ────────────────────────────────────────────────────────────
//

/// Three-level self-reported recall strength, weakest to strongest.
///
/// The interval math behind each level lives on the backend; the client only
/// reports which one the learner picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewResult {
    /// Forgotten. The card comes back soon.
    Again,
    /// Partially recalled.
    Good,
    /// Recalled without effort.
    Easy,
}

impl ReviewResult {
    pub const ALL: [ReviewResult; 3] = [
        ReviewResult::Again,
        ReviewResult::Good,
        ReviewResult::Easy,
    ];

    /// Converts a numeric result (0-2) to a `ReviewResult`.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidResult` if the value is not in the range 0-2.
    pub fn from_u8(value: u8) -> Result<Self, ReviewError> {
        match value {
            0 => Ok(Self::Again),
            1 => Ok(Self::Good),
            2 => Ok(Self::Easy),
            _ => Err(ReviewError::InvalidResult(value)),
        }
    }

    /// Wire name used by the backend.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewResult::Again => "again",
            ReviewResult::Good => "good",
            ReviewResult::Easy => "easy",
        }
    }
}

impl fmt::Display for ReviewResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewResult {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "again" => Ok(Self::Again),
            "good" => Ok(Self::Good),
            "easy" => Ok(Self::Easy),
            other => Err(ReviewError::UnknownResult(other.to_owned())),
        }
    }
}

//
// ─── REVIEW OUTCOME ──────────────────────────────────────────────────────────
//

/// A single verdict for one card, as submitted to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub vocab_id: VocabId,
    pub result: ReviewResult,
}

impl ReviewOutcome {
    #[must_use]
    pub fn new(vocab_id: VocabId, result: ReviewResult) -> Self {
        Self { vocab_id, result }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_result_conversion_works() {
        assert_eq!(ReviewResult::from_u8(0).unwrap(), ReviewResult::Again);
        assert_eq!(ReviewResult::from_u8(2).unwrap(), ReviewResult::Easy);
        let err = ReviewResult::from_u8(3).unwrap_err();
        assert!(matches!(err, ReviewError::InvalidResult(3)));
    }

    #[test]
    fn parses_wire_names_case_insensitively() {
        assert_eq!("Good".parse::<ReviewResult>().unwrap(), ReviewResult::Good);
        assert_eq!(" easy ".parse::<ReviewResult>().unwrap(), ReviewResult::Easy);
        assert!(matches!(
            "hard".parse::<ReviewResult>(),
            Err(ReviewError::UnknownResult(_))
        ));
    }

    #[test]
    fn outcome_serializes_with_camel_case_keys() {
        let outcome = ReviewOutcome::new(VocabId::new(5), ReviewResult::Again);
        let json = serde_json::to_value(outcome).unwrap();
        assert_eq!(json, serde_json::json!({ "vocabId": 5, "result": "again" }));
    }
}
