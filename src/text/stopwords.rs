// Stop-word sets for the normalizer.
//
// `Core` is the English function-word list (apostrophe-free, since the
// normalizer strips punctuation before the lookup). `Extended` adds the
// `stop-words` crate's much larger English list, which also removes many
// content words, so it's opt-in.

use std::collections::HashSet;

use stop_words::{get, LANGUAGE};

pub const CORE_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
    "with", "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "can", "will", "just", "don", "should",
    "now", "ain", "aren", "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "mightn",
    "mustn", "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn",
];

/// Which stop-word list the normalizer drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopWordSet {
    #[default]
    Core,
    Extended,
}

impl StopWordSet {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "core" => Some(StopWordSet::Core),
            "extended" => Some(StopWordSet::Extended),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StopWordSet::Core => "core",
            StopWordSet::Extended => "extended",
        }
    }

    /// Materialize the set, lowercased.
    pub fn load(&self) -> HashSet<String> {
        let mut words: HashSet<String> = CORE_STOP_WORDS.iter().map(|w| w.to_string()).collect();
        if *self == StopWordSet::Extended {
            let extra: Vec<String> = get(LANGUAGE::English);
            words.extend(extra.into_iter().map(|w| w.to_lowercase()));
        }
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_contains_function_words_only() {
        let set = StopWordSet::Core.load();
        for w in ["this", "is", "very", "the", "and"] {
            assert!(set.contains(w), "{w} should be a stop word");
        }
        for w in ["great", "product", "love", "garbage"] {
            assert!(!set.contains(w), "{w} should survive");
        }
    }

    #[test]
    fn test_extended_is_superset_of_core() {
        let core = StopWordSet::Core.load();
        let extended = StopWordSet::Extended.load();
        assert!(extended.len() > core.len());
        assert!(core.is_subset(&extended));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(StopWordSet::from_name("Extended"), Some(StopWordSet::Extended));
        assert_eq!(StopWordSet::from_name(" core "), Some(StopWordSet::Core));
        assert_eq!(StopWordSet::from_name("nltk"), None);
    }
}
