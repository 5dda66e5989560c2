use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An id string that is not a non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
    raw: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} {:?}", self.kind, self.raw)
    }
}

impl std::error::Error for ParseIdError {}

macro_rules! backend_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn value(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self).map_err(|_| ParseIdError {
                    kind: stringify!($name),
                    raw: s.to_owned(),
                })
            }
        }
    };
}

backend_id!(
    /// Backend id of a vocabulary entry. Outcomes are keyed by it.
    VocabId
);

backend_id!(
    /// Backend id of a single kanji character.
    KanjiId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocab_id_display_and_parse() {
        let id: VocabId = "123".parse().unwrap();
        assert_eq!(id, VocabId::new(123));
        assert_eq!(id.to_string(), "123");
        assert_eq!(format!("{id:?}"), "VocabId(123)");
    }

    #[test]
    fn parse_rejects_non_numeric_ids() {
        let err = "漢字".parse::<VocabId>().unwrap_err();
        assert!(err.to_string().contains("VocabId"));
        assert!("-4".parse::<KanjiId>().is_err());
    }

    #[test]
    fn kanji_id_parse_tolerates_whitespace() {
        let id: KanjiId = " 42 ".parse().unwrap();
        assert_eq!(id.value(), 42);
    }

    #[test]
    fn ids_serialize_as_bare_numbers() {
        let json = serde_json::to_string(&VocabId::new(7)).unwrap();
        assert_eq!(json, "7");
        let back: KanjiId = serde_json::from_str("9").unwrap();
        assert_eq!(back, KanjiId::new(9));
    }
}
