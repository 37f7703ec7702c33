use std::path::Path;

use gavel::sentiment::lexical::{LexicalStrategy, LEXICON_STRATEGY};
use gavel::sentiment::library::{LibraryStrategy, LIBRARY_STRATEGY};
use gavel::sentiment::{
    select_scorer, PolarityModel, SentimentLabel, SentimentMode, SentimentScorer, SentimentStrategy,
};

struct Fixed(f64);

impl PolarityModel for Fixed {
    fn polarity(&self, _text: &str) -> anyhow::Result<f64> {
        Ok(self.0)
    }
}

fn library(polarity: f64) -> SentimentScorer {
    SentimentScorer::new(Box::new(LibraryStrategy::new(Box::new(Fixed(polarity)))))
}

// ============================================================
// Whole-review verdicts
// ============================================================

#[test]
fn positive_review_is_positive_and_confident() {
    let verdict = SentimentScorer::lexical().score(
        "This product is absolutely amazing! I love it.",
        "",
        "product absolutely amazing love",
        "",
        5.0,
    );
    assert_eq!(verdict.label, SentimentLabel::Positive);
    assert!(verdict.confidence > 0.5, "confidence {}", verdict.confidence);
    assert_eq!(verdict.method, LEXICON_STRATEGY);
    assert_eq!(verdict.rating_label, SentimentLabel::Positive);
}

#[test]
fn profane_review_is_negative() {
    let verdict = SentimentScorer::lexical().score(
        "This shit is garbage and I hate it",
        "",
        "shit garbage hate",
        "",
        1.0,
    );
    assert_eq!(verdict.label, SentimentLabel::Negative);
    assert_eq!(verdict.body.label, SentimentLabel::Negative);
}

#[test]
fn empty_text_falls_back_to_rating() {
    let scorer = SentimentScorer::lexical();

    let low = scorer.score("", "", "", "", 1.0);
    assert_eq!(low.label, SentimentLabel::Negative);
    assert_eq!(low.confidence, 1.0);

    let mid = scorer.score("", "", "", "", 3.0);
    assert_eq!(mid.label, SentimentLabel::Neutral);
}

#[test]
fn long_body_outweighs_rating() {
    // A confident model reading of a long body beats a one-star rating
    let verdict = library(0.9).score(
        "The gadget arrived early and has worked flawlessly every single day",
        "",
        "gadget arrived early worked flawlessly every single day",
        "",
        1.0,
    );
    assert_eq!(verdict.label, SentimentLabel::Positive);
    assert_eq!(verdict.method, LIBRARY_STRATEGY);
    assert_eq!(verdict.rating_label, SentimentLabel::Negative);
    assert!(verdict.weights.negative > 0.0);
}

#[test]
fn confidence_stays_in_unit_interval() {
    let scorers = [SentimentScorer::lexical(), library(-1.0), library(0.05)];
    let inputs = [
        ("", "", 1.0),
        ("great", "bad", 3.0),
        ("terrible awful horrible", "worst ever", 5.0),
        ("meh", "", 2.0),
        ("Excellent quality, would recommend", "Perfect", 4.0),
    ];
    for scorer in &scorers {
        for (body, summary, rating) in inputs {
            let v = scorer.score(body, summary, body, summary, rating);
            assert!((0.0..=1.0).contains(&v.confidence), "{body:?}: {}", v.confidence);
            for field in [v.body, v.summary, v.cleaned_body, v.cleaned_summary] {
                assert!((0.0..=1.0).contains(&field.confidence));
                assert!((-1.0..=1.0).contains(&field.score));
            }
        }
    }
}

#[test]
fn cleaned_text_is_recorded_but_does_not_vote() {
    let scorer = SentimentScorer::lexical();
    let a = scorer.score("Fine.", "", "great great great", "", 3.0);
    let b = scorer.score("Fine.", "", "awful awful awful", "", 3.0);
    assert_eq!(a.label, b.label);
    assert_eq!(a.weights, b.weights);
    assert_eq!(a.cleaned_body.label, SentimentLabel::Positive);
    assert_eq!(b.cleaned_body.label, SentimentLabel::Negative);
}

// ============================================================
// Strategies
// ============================================================

#[test]
fn weak_polarity_blends_with_lexicon() {
    let strategy = LibraryStrategy::new(Box::new(Fixed(0.1)));
    let field = strategy.analyze("terrible", Some(1.0));
    // (0.1 + -1.0) / 2
    assert!((field.score - (-0.45)).abs() < 1e-9);
    assert_eq!(field.label, SentimentLabel::Negative);
}

#[test]
fn strong_polarity_stands_alone() {
    let strategy = LibraryStrategy::new(Box::new(Fixed(-0.8)));
    let field = strategy.analyze("I expected more", Some(5.0));
    assert_eq!(field.label, SentimentLabel::Negative);
    assert!((field.confidence - 0.8).abs() < 1e-9);
}

#[test]
fn lexicon_without_rating_uses_word_ratio() {
    let field = LexicalStrategy::new().analyze("great product, bad box", None);
    assert_eq!(field.label, SentimentLabel::Neutral);
    assert_eq!(field.score, 0.0);
    assert!((field.confidence - 0.5).abs() < 1e-9);
}

// ============================================================
// Strategy selection
// ============================================================

#[test]
fn missing_model_degrades_to_lexicon() {
    let dir = Path::new("/nonexistent/gavel-models");
    let scorer = select_scorer(SentimentMode::Auto, dir);
    assert_eq!(scorer.method(), LEXICON_STRATEGY);
    assert!(scorer.degraded_reason().is_some());
}

#[test]
fn configured_lexicon_is_not_degraded() {
    let dir = Path::new("/nonexistent/gavel-models");
    let scorer = select_scorer(SentimentMode::Lexicon, dir);
    assert_eq!(scorer.method(), LEXICON_STRATEGY);
    assert!(scorer.degraded_reason().is_none());
}
