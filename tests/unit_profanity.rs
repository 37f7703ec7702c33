use gavel::profanity::detector::{check_field, LOW_RATING_MAX};
use gavel::profanity::vocabulary::{position, PROFANITY_VOCABULARY, VOCABULARY_VERSION};
use gavel::profanity::{detect_text, ProfanityDetector, ProfanityVerdict};
use gavel::text::stopwords::StopWordSet;
use gavel::text::TextNormalizer;

fn detect(body: &str, summary: &str, rating: f64) -> ProfanityVerdict {
    let normalizer = TextNormalizer::new(StopWordSet::Core.load(), None);
    ProfanityDetector::new().detect(
        body,
        &normalizer.normalize(body),
        summary,
        &normalizer.normalize(summary),
        rating,
    )
}

#[test]
fn profane_review_reports_terms_in_vocabulary_order() {
    let verdict = detect("This shit is garbage and I hate it", "", 1.0);
    assert!(verdict.flagged);
    assert_eq!(verdict.terms, vec!["shit", "hate", "garbage"]);
    assert_eq!(verdict.profanity_count, 3);
    assert!(verdict.body.flagged);
    assert!(!verdict.summary.flagged);
    assert!(verdict.low_rating);
    assert_eq!(verdict.vocabulary_version, VOCABULARY_VERSION);
}

#[test]
fn clean_review_is_not_flagged() {
    let verdict = detect("This product is absolutely amazing! I love it.", "Five stars", 5.0);
    assert!(!verdict.flagged);
    assert!(verdict.terms.is_empty());
    assert_eq!(verdict.profanity_count, 0);
    assert!(!verdict.low_rating);
}

#[test]
fn summary_alone_flags_the_review() {
    let verdict = detect("Works as described.", "Total crap", 4.0);
    assert!(verdict.flagged);
    assert!(verdict.summary.flagged);
    assert!(!verdict.body.flagged);
    assert_eq!(verdict.terms, vec!["crap"]);
}

#[test]
fn raw_substring_matches_inside_larger_words() {
    // "ass" inside "classic", "hell" inside "shell"
    let (flagged, terms) = detect_text("A classic shell design");
    assert!(flagged);
    assert_eq!(terms, vec!["hell", "ass"]);
}

#[test]
fn multi_word_entries_only_match_raw_text() {
    let field = check_field(
        "What a piece of shit",
        &["piece".to_string(), "shit".to_string()],
    );
    assert!(field.raw_matches.contains(&"piece of shit".to_string()));
    assert!(!field.token_matches.contains(&"piece of shit".to_string()));
    assert_eq!(field.token_matches, vec!["shit"]);
    assert_eq!(field.terms, vec!["shit", "piece of shit"]);
}

#[test]
fn matching_ignores_case() {
    let (flagged, terms) = detect_text("STUPID design, USELESS manual");
    assert!(flagged);
    assert_eq!(terms, vec!["stupid", "useless"]);
}

#[test]
fn empty_fields_are_clean() {
    let verdict = detect("", "", 3.0);
    assert!(!verdict.flagged);
    assert_eq!(detect_text(""), (false, Vec::new()));
}

#[test]
fn low_rating_boundary() {
    assert!(detect("ok", "", LOW_RATING_MAX).low_rating);
    assert!(!detect("ok", "", 2.5).low_rating);
}

#[test]
fn every_vocabulary_entry_has_a_position() {
    for (i, term) in PROFANITY_VOCABULARY.iter().enumerate() {
        assert_eq!(position(term), Some(i));
    }
    assert_eq!(position("lovely"), None);
}
