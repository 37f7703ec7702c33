// Lexicon strategy — counts matches against fixed positive and negative word
// sets, blended with the rating. Needs no model files, so it is always
// available and is what the library strategy falls back on.

use std::collections::HashSet;

use super::traits::{rating_score, FieldSentiment, SentimentLabel, SentimentStrategy};

pub const LEXICON_STRATEGY: &str = "lexicon";

/// Confidence when the text is empty and only the rating speaks.
const EMPTY_TEXT_CONFIDENCE: f64 = 0.7;
/// Confidence when the text has words but none carry sentiment.
const NO_SIGNAL_CONFIDENCE: f64 = 0.6;
/// Confidence for a rating-only neutral call.
const NEUTRAL_RATING_CONFIDENCE: f64 = 0.5;
/// Floor applied once a rating has been blended in.
const RATED_CONFIDENCE_FLOOR: f64 = 0.5;

const POSITIVE_WORDS: &[&str] = &[
    "excellent", "great", "amazing", "wonderful", "fantastic", "awesome", "superb",
    "outstanding", "brilliant", "perfect", "love", "loved", "loving", "good", "nice",
    "best", "better", "happy", "pleased", "satisfied", "recommend", "recommended",
    "quality", "beautiful", "impressive", "remarkable", "incredible", "phenomenal",
    "exceptional", "marvelous", "splendid", "terrific", "fabulous", "delightful",
];

const NEGATIVE_WORDS: &[&str] = &[
    "terrible", "awful", "horrible", "bad", "worst", "hate", "hated", "hating",
    "disappointing", "disappointed", "poor", "useless", "worthless", "garbage",
    "trash", "disgusting", "pathetic", "annoying", "frustrating", "broken",
    "defective", "cheap", "overpriced", "waste", "regret", "avoid", "problems",
    "issues", "failed", "failure", "nightmare", "disaster", "mess", "sucks",
];

pub struct LexicalStrategy {
    positive: HashSet<&'static str>,
    negative: HashSet<&'static str>,
}

impl Default for LexicalStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl LexicalStrategy {
    pub fn new() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().copied().collect(),
            negative: NEGATIVE_WORDS.iter().copied().collect(),
        }
    }

    fn rating_only(rating: Option<f64>, confidence: f64) -> FieldSentiment {
        match rating {
            Some(r) => match SentimentLabel::from_rating(r) {
                SentimentLabel::Neutral => FieldSentiment::new(
                    SentimentLabel::Neutral,
                    NEUTRAL_RATING_CONFIDENCE,
                    rating_score(r),
                ),
                label => FieldSentiment::new(label, confidence, rating_score(r)),
            },
            None => FieldSentiment::neutral(),
        }
    }
}

/// Lowercased word-character runs (letters, digits, underscore).
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

impl SentimentStrategy for LexicalStrategy {
    fn name(&self) -> &'static str {
        LEXICON_STRATEGY
    }

    fn analyze(&self, text: &str, rating: Option<f64>) -> FieldSentiment {
        if text.trim().is_empty() {
            return Self::rating_only(rating, EMPTY_TEXT_CONFIDENCE);
        }

        let words = words(text);
        let positive = words.iter().filter(|w| self.positive.contains(w.as_str())).count();
        let negative = words.iter().filter(|w| self.negative.contains(w.as_str())).count();
        let total = positive + negative;

        if total == 0 {
            return Self::rating_only(rating, NO_SIGNAL_CONFIDENCE);
        }

        let mut score = (positive as f64 - negative as f64) / total as f64;
        let mut confidence = (total as f64 / words.len() as f64).min(1.0);

        if let Some(r) = rating {
            score = (score + rating_score(r)) / 2.0;
            confidence = confidence.max(RATED_CONFIDENCE_FLOOR);
        }

        FieldSentiment::new(SentimentLabel::from_score(score), confidence, score)
    }
}
