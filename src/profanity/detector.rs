// Profanity detector — the second pipeline stage.
//
// Each field is checked twice: the raw text by substring, and the normalized
// tokens by exact equality. A review is flagged if any of the four checks
// hits. Pure and total; there is no error path.

use serde::{Deserialize, Serialize};

use super::vocabulary::{self, PROFANITY_VOCABULARY, VOCABULARY_VERSION};
use crate::text::NormalizedText;

/// Ratings at or below this are recorded as low ratings on the verdict.
pub const LOW_RATING_MAX: f64 = 2.0;

/// Matches for one text field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldProfanity {
    pub flagged: bool,
    /// Vocabulary entries found as substrings of the lowercased raw text
    pub raw_matches: Vec<String>,
    /// Tokens exactly equal to a vocabulary entry
    pub token_matches: Vec<String>,
    /// Deduplicated union of both, in vocabulary order
    pub terms: Vec<String>,
}

/// Profanity result for a whole review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfanityVerdict {
    pub flagged: bool,
    /// Deduplicated union across both fields, in vocabulary order
    pub terms: Vec<String>,
    pub profanity_count: usize,
    pub body: FieldProfanity,
    pub summary: FieldProfanity,
    pub low_rating: bool,
    pub vocabulary_version: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProfanityDetector;

impl ProfanityDetector {
    pub fn new() -> Self {
        Self
    }

    /// Check the raw and normalized forms of body and summary.
    pub fn detect(
        &self,
        body: &str,
        body_normalized: &NormalizedText,
        summary: &str,
        summary_normalized: &NormalizedText,
        rating: f64,
    ) -> ProfanityVerdict {
        let body = check_field(body, &body_normalized.tokens);
        let summary = check_field(summary, &summary_normalized.tokens);

        let terms = canonical_union(body.terms.iter().chain(summary.terms.iter()));

        ProfanityVerdict {
            flagged: body.flagged || summary.flagged,
            profanity_count: terms.len(),
            terms,
            body,
            summary,
            low_rating: rating <= LOW_RATING_MAX,
            vocabulary_version: VOCABULARY_VERSION.to_string(),
        }
    }
}

/// Substring check over raw text. `detect_text("")` is `(false, [])`.
pub fn detect_text(text: &str) -> (bool, Vec<String>) {
    let matches = match_text(text);
    (!matches.is_empty(), matches)
}

/// Vocabulary entries that occur anywhere in the lowercased text.
pub fn match_text(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let lowered = text.to_lowercase();
    PROFANITY_VOCABULARY
        .iter()
        .filter(|term| lowered.contains(*term))
        .map(|term| term.to_string())
        .collect()
}

/// Vocabulary entries equal to one of the tokens (case-insensitive).
pub fn match_tokens(tokens: &[String]) -> Vec<String> {
    let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
    PROFANITY_VOCABULARY
        .iter()
        .filter(|term| lowered.iter().any(|t| t == *term))
        .map(|term| term.to_string())
        .collect()
}

pub fn check_field(raw: &str, tokens: &[String]) -> FieldProfanity {
    let raw_matches = match_text(raw);
    let token_matches = match_tokens(tokens);
    let terms = canonical_union(raw_matches.iter().chain(token_matches.iter()));
    FieldProfanity {
        flagged: !terms.is_empty(),
        raw_matches,
        token_matches,
        terms,
    }
}

/// Dedupe and order by vocabulary position so equal sets always serialize
/// identically regardless of which check found them first.
fn canonical_union<'a>(terms: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut positioned: Vec<(usize, &String)> = terms
        .filter_map(|t| vocabulary::position(t).map(|p| (p, t)))
        .collect();
    positioned.sort_by_key(|(p, _)| *p);
    positioned.dedup_by_key(|(p, _)| *p);
    positioned.into_iter().map(|(_, t)| t.clone()).collect()
}
