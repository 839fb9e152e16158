use serde::{Deserialize, Serialize};

use crate::models::SentimentTag;

const POSITIVE_WORDS: &[&str] = &[
    "great",
    "excellent",
    "amazing",
    "wonderful",
    "helpful",
    "strong",
    "good",
    "best",
    "outstanding",
    "fantastic",
];

// "could improve" spans two tokens so it never matches a single word. Kept for parity with
// the lexicon authors use in the feedback form.
const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "poor",
    "terrible",
    "awful",
    "weak",
    "could improve",
    "late",
    "slow",
    "difficult",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Positive,
    Neutral,
    Negative,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Positive => "positive",
            Classification::Neutral => "neutral",
            Classification::Negative => "negative",
        }
    }
}

/// Net keyword score: +1 per token containing a positive entry, -1 per token containing a
/// negative entry. A token can hit both lists.
pub fn score(text: &str) -> i32 {
    let lowered = text.to_lowercase();
    let mut score = 0;

    for token in lowered.split_whitespace() {
        if POSITIVE_WORDS.iter().any(|word| token.contains(word)) {
            score += 1;
        }
        if NEGATIVE_WORDS.iter().any(|word| token.contains(word)) {
            score -= 1;
        }
    }

    score
}

/// Keyword classifier. No negation or sarcasm handling.
pub fn classify(text: &str) -> Classification {
    match score(text) {
        s if s > 0 => Classification::Positive,
        s if s < 0 => Classification::Negative,
        _ => Classification::Neutral,
    }
}

/// Tag to pre-select for an author while they write feedback.
pub fn suggest_tag(text: &str) -> SentimentTag {
    match classify(text) {
        Classification::Positive => SentimentTag::Positive,
        Classification::Neutral => SentimentTag::Neutral,
        Classification::Negative => SentimentTag::Constructive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn praise_is_positive() {
        assert_eq!(
            classify("Great communication skills and always helpful!"),
            Classification::Positive
        );
    }

    #[test]
    fn mixed_feedback_cancels_out() {
        let text = "Sometimes late to meetings but contributes great ideas.";
        assert_eq!(score(text), 0);
        assert_eq!(classify(text), Classification::Neutral);
    }

    #[test]
    fn matches_by_substring() {
        assert_eq!(score("greatly"), 1);
        assert_eq!(classify("Deliverables were always LATE"), Classification::Negative);
    }

    #[test]
    fn empty_text_is_neutral() {
        assert_eq!(classify(""), Classification::Neutral);
        assert_eq!(classify("   \n\t"), Classification::Neutral);
    }

    #[test]
    fn multi_word_entries_never_match() {
        assert_eq!(
            classify("Shows strong leadership but could improve on time management."),
            Classification::Positive
        );
    }

    #[test]
    fn negative_suggestions_become_constructive() {
        assert_eq!(suggest_tag("poor and slow"), SentimentTag::Constructive);
        assert_eq!(suggest_tag("excellent work"), SentimentTag::Positive);
        assert_eq!(suggest_tag("see you tomorrow"), SentimentTag::Neutral);
    }
}
