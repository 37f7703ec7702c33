// Sentiment scorer — the third pipeline stage.
//
// Scores body and summary with the configured strategy, then takes a weighted
// vote: each field counts for its character length times its confidence, and
// the rating adds a small fixed vote of its own. The heaviest label wins and
// its share of the total weight is the verdict's confidence.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::download::{model_files_present, sentiment_model_dir};
use super::lexical::LexicalStrategy;
use super::library::LibraryStrategy;
use super::onnx::OnnxPolarityModel;
use super::traits::{FieldSentiment, SentimentLabel, SentimentStrategy};

/// Vote weight of the rating-derived label.
pub const RATING_WEIGHT: f64 = 0.3;

/// Which strategy to run, chosen by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SentimentMode {
    /// Use the polarity model when its files are present, else the lexicon.
    #[default]
    Auto,
    /// Always use the lexicon.
    Lexicon,
}

impl SentimentMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(SentimentMode::Auto),
            "lexicon" | "lexical" => Some(SentimentMode::Lexicon),
            _ => None,
        }
    }
}

/// Accumulated vote weight per label.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelWeights {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl LabelWeights {
    fn add(&mut self, label: SentimentLabel, weight: f64) {
        match label {
            SentimentLabel::Positive => self.positive += weight,
            SentimentLabel::Negative => self.negative += weight,
            SentimentLabel::Neutral => self.neutral += weight,
        }
    }

    pub fn total(&self) -> f64 {
        self.positive + self.negative + self.neutral
    }

    /// Heaviest label. Ties resolve positive, then negative, then neutral.
    fn winner(&self) -> (SentimentLabel, f64) {
        let mut best = (SentimentLabel::Positive, self.positive);
        for candidate in [
            (SentimentLabel::Negative, self.negative),
            (SentimentLabel::Neutral, self.neutral),
        ] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best
    }
}

/// Sentiment result for a whole review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentVerdict {
    pub label: SentimentLabel,
    /// Winning label's share of the total vote weight, within [0, 1]
    pub confidence: f64,
    /// Strategy that produced the field analyses
    pub method: String,
    pub body: FieldSentiment,
    pub summary: FieldSentiment,
    /// Analyses of the normalized text. Recorded but not part of the vote.
    pub cleaned_body: FieldSentiment,
    pub cleaned_summary: FieldSentiment,
    pub rating: f64,
    pub rating_label: SentimentLabel,
    pub weights: LabelWeights,
}

pub struct SentimentScorer {
    strategy: Box<dyn SentimentStrategy>,
    /// Set when the configured strategy couldn't be used and a fallback runs instead.
    degraded: Option<String>,
}

impl SentimentScorer {
    pub fn new(strategy: Box<dyn SentimentStrategy>) -> Self {
        Self {
            strategy,
            degraded: None,
        }
    }

    /// Scorer running a fallback strategy, with the reason it had to.
    pub fn degraded(strategy: Box<dyn SentimentStrategy>, reason: impl Into<String>) -> Self {
        Self {
            strategy,
            degraded: Some(reason.into()),
        }
    }

    pub fn degraded_reason(&self) -> Option<&str> {
        self.degraded.as_deref()
    }

    /// Scorer on the lexicon strategy.
    pub fn lexical() -> Self {
        Self::new(Box::new(LexicalStrategy::new()))
    }

    pub fn method(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn score(
        &self,
        body: &str,
        summary: &str,
        cleaned_body: &str,
        cleaned_summary: &str,
        rating: f64,
    ) -> SentimentVerdict {
        let body_sentiment = self.strategy.analyze(body, Some(rating));
        let summary_sentiment = self.strategy.analyze(summary, Some(rating));
        let cleaned_body = self.strategy.analyze(cleaned_body, Some(rating));
        let cleaned_summary = self.strategy.analyze(cleaned_summary, Some(rating));
        let rating_label = SentimentLabel::from_rating(rating);

        let mut weights = LabelWeights::default();
        weights.add(
            body_sentiment.label,
            body.chars().count() as f64 * body_sentiment.confidence,
        );
        weights.add(
            summary_sentiment.label,
            summary.chars().count() as f64 * summary_sentiment.confidence,
        );
        weights.add(rating_label, RATING_WEIGHT);

        // total >= RATING_WEIGHT, so the division is always defined
        let (label, weight) = weights.winner();
        let confidence = (weight / weights.total()).clamp(0.0, 1.0);

        SentimentVerdict {
            label,
            confidence,
            method: self.strategy.name().to_string(),
            body: body_sentiment,
            summary: summary_sentiment,
            cleaned_body,
            cleaned_summary,
            rating,
            rating_label,
            weights,
        }
    }
}

/// Pick the strategy once at startup.
///
/// A missing or unloadable model is a degraded capability, not an error: it is
/// logged here and the lexicon strategy takes over for the life of the process.
pub fn select_scorer(mode: SentimentMode, model_dir: &Path) -> SentimentScorer {
    if mode == SentimentMode::Lexicon {
        info!("Sentiment strategy: lexicon (configured)");
        return SentimentScorer::lexical();
    }

    if !model_files_present(model_dir) {
        warn!(
            model_dir = %model_dir.display(),
            "Sentiment model not found, using lexicon strategy. Run `gavel download-model` to enable it."
        );
        return SentimentScorer::degraded(
            Box::new(LexicalStrategy::new()),
            "sentiment model not installed, lexicon strategy used",
        );
    }

    match OnnxPolarityModel::load(&sentiment_model_dir(model_dir)) {
        Ok(model) => {
            info!("Sentiment strategy: onnx-polarity");
            SentimentScorer::new(Box::new(LibraryStrategy::new(Box::new(model))))
        }
        Err(e) => {
            warn!(error = %e, "Failed to load sentiment model, using lexicon strategy");
            SentimentScorer::degraded(
                Box::new(LexicalStrategy::new()),
                format!("sentiment model failed to load ({e}), lexicon strategy used"),
            )
        }
    }
}
