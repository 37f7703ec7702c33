// Fixed profanity vocabulary.
//
// Closed and versioned: changing the list changes verdicts for stored
// reviews, so bump VOCABULARY_VERSION with any edit. Entry order is the
// canonical order matched terms are reported in.
//
// Raw-text matching is by substring, so it also fires inside larger words
// ("ass" in "class", "hell" in "shell").

pub const VOCABULARY_VERSION: &str = "2";

pub const PROFANITY_VOCABULARY: &[&str] = &[
    "damn",
    "hell",
    "crap",
    "shit",
    "fuck",
    "fucking",
    "fucked",
    "bitch",
    "bastard",
    "asshole",
    "ass",
    "piss",
    "suck",
    "sucks",
    "sucked",
    "stupid",
    "idiot",
    "moron",
    "dumb",
    "hate",
    "terrible",
    "awful",
    "horrible",
    "disgusting",
    "pathetic",
    "worthless",
    "useless",
    "garbage",
    "trash",
    "piece of shit",
    "bullshit",
];

/// Position of a term in the vocabulary, if it is one.
pub fn position(term: &str) -> Option<usize> {
    PROFANITY_VOCABULARY.iter().position(|v| *v == term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_vocabulary_is_lowercase_and_unique() {
        let unique: HashSet<&&str> = PROFANITY_VOCABULARY.iter().collect();
        assert_eq!(unique.len(), PROFANITY_VOCABULARY.len());
        for term in PROFANITY_VOCABULARY {
            assert_eq!(*term, term.to_lowercase());
        }
    }

    #[test]
    fn test_position() {
        assert_eq!(position("damn"), Some(0));
        assert_eq!(position("lovely"), None);
    }
}
