use std::path::Path;

use gavel::text::lemmatizer::Lemmatizer;
use gavel::text::normalizer::MIN_TOKEN_LEN;
use gavel::text::stopwords::StopWordSet;
use gavel::text::TextNormalizer;

fn shipped_lemmas() -> Lemmatizer {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/lemmas.tsv");
    Lemmatizer::load(&path).unwrap()
}

// ============================================================
// Normalization
// ============================================================

#[test]
fn review_body_reduces_to_content_tokens() {
    let normalizer = TextNormalizer::new(StopWordSet::Core.load(), None);
    let out = normalizer.normalize("This product is absolutely amazing! I love it.");
    assert_eq!(out.tokens, vec!["product", "absolutely", "amazing", "love"]);
    assert_eq!(out.cleaned, "product absolutely amazing love");
    assert!(!out.lemmatized);
}

#[test]
fn normalization_is_total_over_odd_input() {
    let normalizer = TextNormalizer::new(StopWordSet::Core.load(), None);
    for text in [
        "",
        "   \t\n  ",
        "!!!???...",
        "5/5 ⭐⭐⭐⭐⭐",
        "Ünïcödé wörds",
        "😀😀😀",
        "a b c d e",
        "a-b c!d 123",
        "foo\u{00A0}bar",
        "line\u{2028}separated\u{3000}words",
        "don't-stop-me-now",
    ] {
        let out = normalizer.normalize(text);
        assert!(
            out.tokens.len() <= text.split_whitespace().count(),
            "more tokens than words from {text:?}: {:?}",
            out.tokens
        );
        assert_eq!(out.cleaned, out.tokens.join(" "), "input {text:?}");
        for token in &out.tokens {
            assert!(token.len() > MIN_TOKEN_LEN, "short token {token:?} from {text:?}");
            assert!(token.chars().all(|c| c.is_ascii_lowercase()));
        }
    }
}

#[test]
fn stripping_never_splits_a_word() {
    let normalizer = TextNormalizer::new(StopWordSet::Core.load(), None);
    // Punctuation inside a word is deleted, not turned into a separator
    assert_eq!(normalizer.normalize("well-made x-ray").tokens, vec!["wellmade", "xray"]);
    // Non-ASCII whitespace is stripped too, joining its neighbours
    assert_eq!(normalizer.normalize("foo\u{00A0}bar").tokens, vec!["foobar"]);
    // Words made only of stripped characters disappear
    assert!(normalizer.normalize("a-b c!d 123").tokens.is_empty());
}

#[test]
fn output_never_contains_stop_words() {
    let stop_words = StopWordSet::Core.load();
    let normalizer = TextNormalizer::new(stop_words.clone(), None);
    let out = normalizer.normalize(
        "They said that it would have been better if the seller had shipped it sooner, \
         but they didn't and now we are here.",
    );
    assert!(!out.tokens.is_empty());
    for token in &out.tokens {
        assert!(!stop_words.contains(token), "stop word {token:?} survived");
    }
}

#[test]
fn extended_stop_words_extend_core() {
    let core = StopWordSet::Core.load();
    let extended = StopWordSet::Extended.load();
    assert!(extended.len() > core.len());
    assert!(core.iter().all(|w| extended.contains(w)));
}

#[test]
fn stop_word_set_names() {
    assert_eq!(StopWordSet::from_name("EXTENDED"), Some(StopWordSet::Extended));
    assert_eq!(StopWordSet::from_name("core").map(|s| s.as_str()), Some("core"));
    assert_eq!(StopWordSet::from_name("french"), None);
    assert_eq!(StopWordSet::default(), StopWordSet::Core);
}

// ============================================================
// Lemmatization with the shipped dictionary
// ============================================================

#[test]
fn shipped_dictionary_lemmatizes_plurals() {
    let lemmas = shipped_lemmas();
    assert_eq!(lemmas.lemmatize("batteries"), "battery");
    assert_eq!(lemmas.lemmatize("products"), "product");
    assert_eq!(lemmas.lemmatize("boxes"), "box");
    assert_eq!(lemmas.lemmatize("children"), "child");
    assert_eq!(lemmas.lemmatize("knives"), "knife");
    // Unknown words pass through untouched
    assert_eq!(lemmas.lemmatize("flimsy"), "flimsy");
}

#[test]
fn normalizer_with_dictionary_marks_lemmatized() {
    let normalizer = TextNormalizer::new(StopWordSet::Core.load(), Some(shipped_lemmas()));
    assert!(normalizer.lemmatizes());
    let out = normalizer.normalize("The batteries in these products died within weeks");
    assert_eq!(out.tokens, vec!["battery", "product", "died", "within", "week"]);
    assert!(out.lemmatized);
}
