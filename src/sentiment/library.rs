// Library strategy — polarity from a local model, with the lexicon as a
// backstop for weak or failed predictions.
//
// Distance from zero is the confidence proxy. Below LOW_CONFIDENCE the model
// is too unsure to trust alone and its polarity is averaged with the lexicon
// score for the same text.

use tracing::warn;

use super::lexical::LexicalStrategy;
use super::traits::{FieldSentiment, PolarityModel, SentimentLabel, SentimentStrategy};

pub const LIBRARY_STRATEGY: &str = "onnx-polarity";

/// Polarities closer to zero than this get blended with the lexicon.
pub const LOW_CONFIDENCE: f64 = 0.3;

pub struct LibraryStrategy {
    model: Box<dyn PolarityModel>,
    lexical: LexicalStrategy,
}

impl LibraryStrategy {
    pub fn new(model: Box<dyn PolarityModel>) -> Self {
        Self {
            model,
            lexical: LexicalStrategy::new(),
        }
    }
}

impl SentimentStrategy for LibraryStrategy {
    fn name(&self) -> &'static str {
        LIBRARY_STRATEGY
    }

    fn analyze(&self, text: &str, rating: Option<f64>) -> FieldSentiment {
        // Nothing for the model to read; the rating is the only signal.
        if text.trim().is_empty() {
            return self.lexical.analyze(text, rating);
        }

        let polarity = match self.model.polarity(text) {
            Ok(p) => p.clamp(-1.0, 1.0),
            Err(e) => {
                warn!(error = %e, "Polarity model failed, using lexicon for this field");
                return self.lexical.analyze(text, rating);
            }
        };

        if polarity.abs() >= LOW_CONFIDENCE {
            return FieldSentiment::new(SentimentLabel::from_score(polarity), polarity.abs(), polarity);
        }

        let lexical = self.lexical.analyze(text, rating);
        let blended = (polarity + lexical.score) / 2.0;
        FieldSentiment::new(
            SentimentLabel::from_score(blended),
            polarity.abs().max(lexical.confidence),
            blended,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(f64);

    impl PolarityModel for Fixed {
        fn polarity(&self, _text: &str) -> anyhow::Result<f64> {
            Ok(self.0)
        }
    }

    struct Broken;

    impl PolarityModel for Broken {
        fn polarity(&self, _text: &str) -> anyhow::Result<f64> {
            anyhow::bail!("session unavailable")
        }
    }

    #[test]
    fn test_confident_polarity_is_used_directly() {
        let s = LibraryStrategy::new(Box::new(Fixed(-0.8))).analyze("anything", Some(5.0));
        assert_eq!(s.label, SentimentLabel::Negative);
        assert!((s.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_weak_polarity_blends_with_lexicon() {
        // lexicon: "great" with a 5 rating -> score 1.0, confidence 1.0
        let s = LibraryStrategy::new(Box::new(Fixed(-0.1))).analyze("great", Some(5.0));
        assert!((s.score - 0.45).abs() < 1e-9);
        assert_eq!(s.label, SentimentLabel::Positive);
        assert_eq!(s.confidence, 1.0);
    }

    #[test]
    fn test_model_failure_falls_back_to_lexicon() {
        let lib = LibraryStrategy::new(Box::new(Broken));
        let lex = LexicalStrategy::new();
        let text = "awful and broken";
        assert_eq!(lib.analyze(text, Some(2.0)), lex.analyze(text, Some(2.0)));
    }

    #[test]
    fn test_empty_text_skips_model() {
        let s = LibraryStrategy::new(Box::new(Fixed(0.9))).analyze("", Some(1.0));
        assert_eq!(s.label, SentimentLabel::Negative);
    }
}
