use serde::{Deserialize, Serialize};

use crate::model::ids::{KanjiId, VocabId};

//
// ─── KANJI FACET ───────────────────────────────────────────────────────────────
//

/// A kanji character that appears in a vocabulary entry, with its reading aids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KanjiFacet {
    pub id: KanjiId,
    pub character: String,
    #[serde(default)]
    pub onyomi: Option<String>,
    #[serde(default)]
    pub kunyomi: Option<String>,
    #[serde(default)]
    pub mean_vi: Option<String>,
    #[serde(default)]
    pub mean_en: Option<String>,
}

//
// ─── REVIEW CARD ───────────────────────────────────────────────────────────────
//

/// One due vocabulary item pulled into a review session.
///
/// Cards are never mutated once a session holds them; the session only moves
/// an index across its card list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCard {
    pub vocab_id: VocabId,
    pub vocab: String,
    #[serde(default)]
    pub furigana: String,
    #[serde(default)]
    pub mean_vi: String,
    #[serde(default)]
    pub mean_en: String,
    #[serde(default)]
    pub kanjis: Vec<KanjiFacet>,
}

impl ReviewCard {
    /// Builds a card without kanji facets.
    #[must_use]
    pub fn new(
        vocab_id: VocabId,
        vocab: impl Into<String>,
        furigana: impl Into<String>,
        mean_vi: impl Into<String>,
        mean_en: impl Into<String>,
    ) -> Self {
        Self {
            vocab_id,
            vocab: vocab.into(),
            furigana: furigana.into(),
            mean_vi: mean_vi.into(),
            mean_en: mean_en.into(),
            kanjis: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_kanjis(mut self, kanjis: Vec<KanjiFacet>) -> Self {
        self.kanjis = kanjis;
        self
    }

    /// Returns true when the furigana differs from the written form and is worth showing.
    #[must_use]
    pub fn needs_furigana(&self) -> bool {
        !self.furigana.trim().is_empty() && self.furigana != self.vocab
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
