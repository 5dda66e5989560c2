use kanji_core::model::{ReviewCard, ReviewOutcome};
use serde::{Deserialize, Serialize};

/// `GET reviews/due` body: `{ "data": [ ... ] }`.
#[derive(Debug, Deserialize)]
pub(crate) struct DueReviewsResponse {
    #[serde(default)]
    pub data: Vec<ReviewCard>,
}

/// `POST reviews/submit` body: `{ "reviews": [{ "vocabId", "result" }] }`.
#[derive(Debug, Serialize)]
pub(crate) struct SubmitReviewsRequest<'a> {
    pub reviews: &'a [ReviewOutcome],
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanji_core::model::{ReviewResult, VocabId};

    #[test]
    fn due_response_tolerates_missing_data() {
        let body: DueReviewsResponse = serde_json::from_str("{}").unwrap();
        assert!(body.data.is_empty());
    }

    #[test]
    fn due_response_reads_cards() {
        let body: DueReviewsResponse = serde_json::from_str(
            r#"{ "data": [ { "vocabId": 1, "vocab": "猫", "furigana": "ねこ", "meanEn": "cat" } ] }"#,
        )
        .unwrap();
        assert_eq!(body.data.len(), 1);
        assert_eq!(body.data[0].vocab_id, VocabId::new(1));
    }

    #[test]
    fn submit_request_keeps_outcome_order() {
        let outcomes = [
            ReviewOutcome::new(VocabId::new(2), ReviewResult::Easy),
            ReviewOutcome::new(VocabId::new(1), ReviewResult::Again),
        ];
        let json = serde_json::to_value(SubmitReviewsRequest { reviews: &outcomes }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "reviews": [
                    { "vocabId": 2, "result": "easy" },
                    { "vocabId": 1, "result": "again" }
                ]
            })
        );
    }
}
