// Text normalizer — the first pipeline stage.
//
// lowercase -> strip everything but ASCII letters and whitespace -> split on
// whitespace -> drop short tokens and stop words -> lemmatize (if a
// dictionary is loaded). Total over any input: empty text, punctuation-only
// text, and non-Latin text all come back as an empty token list.

use std::collections::HashSet;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use super::lemmatizer::Lemmatizer;

/// Tokens of this length or shorter are dropped.
pub const MIN_TOKEN_LEN: usize = 2;

/// Output of normalization. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NormalizedText {
    pub tokens: Vec<String>,
    /// Tokens joined by single spaces
    pub cleaned: String,
    /// False when no lemmatizer was available and tokens are surface forms.
    pub lemmatized: bool,
}

pub struct TextNormalizer {
    stop_words: HashSet<String>,
    lemmatizer: Option<Lemmatizer>,
    non_letters: Regex,
}

impl TextNormalizer {
    pub fn new(stop_words: HashSet<String>, lemmatizer: Option<Lemmatizer>) -> Self {
        Self {
            stop_words,
            lemmatizer,
            non_letters: Regex::new(r"[^a-zA-Z\s]").expect("valid pattern"),
        }
    }

    /// Whether output tokens are lemmas (false = degraded mode).
    pub fn lemmatizes(&self) -> bool {
        self.lemmatizer.is_some()
    }

    pub fn normalize(&self, text: &str) -> NormalizedText {
        let lowered = text.to_lowercase();
        let letters_only = self.non_letters.replace_all(&lowered, "");

        let tokens: Vec<String> = letters_only
            .split_whitespace()
            .filter(|t| t.len() > MIN_TOKEN_LEN && !self.stop_words.contains(*t))
            .map(|t| match &self.lemmatizer {
                Some(lem) => lem.lemmatize(t),
                None => t.to_string(),
            })
            .collect();

        NormalizedText {
            cleaned: tokens.join(" "),
            tokens,
            lemmatized: self.lemmatizer.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::stopwords::StopWordSet;

    fn plain() -> TextNormalizer {
        TextNormalizer::new(StopWordSet::Core.load(), None)
    }

    #[test]
    fn test_basic_normalization() {
        let out = plain().normalize("This is a GREAT product! I love it very much.");
        assert_eq!(out.tokens, vec!["great", "product", "love", "much"]);
        assert_eq!(out.cleaned, "great product love much");
        assert!(!out.lemmatized);
    }

    #[test]
    fn test_digits_and_punctuation_are_stripped_inside_words() {
        let out = plain().normalize("Worked 4ever... w1th n0 issues");
        // "4ever" -> "ever", "w1th" -> "wth", "n0" -> "n" (too short)
        assert_eq!(out.tokens, vec!["worked", "ever", "wth", "issues"]);
    }

    #[test]
    fn test_empty_and_symbol_only_inputs() {
        let n = plain();
        assert!(n.normalize("").tokens.is_empty());
        assert!(n.normalize("!!! ??? 123").tokens.is_empty());
        assert!(n.normalize("日本語のレビュー").tokens.is_empty());
        assert_eq!(n.normalize("   ").cleaned, "");
    }

    #[test]
    fn test_with_lemmatizer_marks_output() {
        let lem = Lemmatizer::from_reader("product\nbattery\n".as_bytes()).unwrap();
        let n = TextNormalizer::new(StopWordSet::Core.load(), Some(lem));
        let out = n.normalize("The batteries and products died");
        assert_eq!(out.tokens, vec!["battery", "product", "died"]);
        assert!(out.lemmatized);
        assert!(n.lemmatizes());
    }
}
