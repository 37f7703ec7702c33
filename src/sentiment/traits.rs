// Sentiment strategy traits — the swap-ready abstraction.
//
// A strategy turns one text field (plus the review's rating) into a label and
// a confidence. Two implementations exist: the lexicon strategy, which always
// works, and the library strategy, which needs a local polarity model. The
// scorer picks one at startup and never branches on availability afterwards.

use serde::{Deserialize, Serialize};

use crate::review::NEUTRAL_RATING;

/// Scores strictly above this are positive, strictly below its negation negative.
pub const LABEL_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Label for a polarity score in [-1, 1].
    pub fn from_score(score: f64) -> Self {
        if score > LABEL_THRESHOLD {
            SentimentLabel::Positive
        } else if score < -LABEL_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    /// Label implied by a star rating alone: 4+ positive, 2 or less negative.
    pub fn from_rating(rating: f64) -> Self {
        if rating >= 4.0 {
            SentimentLabel::Positive
        } else if rating <= 2.0 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Map a 1-5 rating onto [-1, 1].
pub fn rating_score(rating: f64) -> f64 {
    (rating - NEUTRAL_RATING) / 2.0
}

/// Sentiment of a single text field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSentiment {
    pub label: SentimentLabel,
    /// Always within [0, 1]
    pub confidence: f64,
    /// Polarity the label was derived from, in [-1, 1]
    pub score: f64,
}

impl FieldSentiment {
    pub fn new(label: SentimentLabel, confidence: f64, score: f64) -> Self {
        Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
            score: score.clamp(-1.0, 1.0),
        }
    }

    pub fn neutral() -> Self {
        Self::new(SentimentLabel::Neutral, 0.0, 0.0)
    }
}

/// One way of scoring a text field. Must be pure and total.
pub trait SentimentStrategy: Send + Sync {
    /// Recorded on every verdict so consumers know which strategy produced it.
    fn name(&self) -> &'static str;

    fn analyze(&self, text: &str, rating: Option<f64>) -> FieldSentiment;
}

/// A source of raw polarity in [-1, 1] for a piece of text.
///
/// Inference is CPU-bound and synchronous; callers run it off the async
/// runtime (the orchestrator scores inside spawn_blocking).
pub trait PolarityModel: Send + Sync {
    fn polarity(&self, text: &str) -> anyhow::Result<f64>;
}
