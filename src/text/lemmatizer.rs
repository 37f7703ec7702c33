// Dictionary lemmatizer.
//
// Loaded from a tab-separated file: `form<TAB>lemma` lines map inflected
// forms, single-column lines declare known lemmas, `#` starts a comment.
// Unknown tokens go through noun suffix rules and are only rewritten when the
// result is a known lemma, so an unlisted word is never mangled.
//
// The file is optional. When it's missing the normalizer runs without a
// lemmatizer and marks its output as not lemmatized.

use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

/// Noun detachment rules, tried in order; the first candidate that is a
/// known lemma wins.
const NOUN_SUFFIX_RULES: [(&str, &str); 8] = [
    ("s", ""),
    ("ses", "s"),
    ("xes", "x"),
    ("zes", "z"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("ies", "y"),
];

#[derive(Debug, Clone, Default)]
pub struct Lemmatizer {
    /// Irregular and listed inflections: form -> lemma
    forms: HashMap<String, String>,
    /// Every known base form
    lemmas: HashSet<String>,
}

impl Lemmatizer {
    /// Load a lemma dictionary from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open lemma dictionary {}", path.display()))?;
        let lemmatizer = Self::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("Failed to read lemma dictionary {}", path.display()))?;
        debug!(
            path = %path.display(),
            forms = lemmatizer.forms.len(),
            lemmas = lemmatizer.lemmas.len(),
            "Loaded lemma dictionary"
        );
        Ok(lemmatizer)
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lemmatizer = Self::default();
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut cols = line.split('\t').map(str::trim);
            let first = cols.next().unwrap_or_default().to_lowercase();
            match cols.next().filter(|c| !c.is_empty()) {
                Some(lemma) => {
                    let lemma = lemma.to_lowercase();
                    lemmatizer.lemmas.insert(lemma.clone());
                    lemmatizer.forms.insert(first, lemma);
                }
                None => {
                    lemmatizer.lemmas.insert(first);
                }
            }
        }
        if lemmatizer.lemmas.is_empty() {
            anyhow::bail!("lemma dictionary has no entries");
        }
        Ok(lemmatizer)
    }

    /// Reduce a lowercase token to its dictionary lemma, or return it unchanged.
    pub fn lemmatize(&self, token: &str) -> String {
        if let Some(lemma) = self.forms.get(token) {
            return lemma.clone();
        }
        if self.lemmas.contains(token) {
            return token.to_string();
        }
        for (suffix, replacement) in NOUN_SUFFIX_RULES {
            if let Some(stem) = token.strip_suffix(suffix) {
                let candidate = format!("{stem}{replacement}");
                if !stem.is_empty() && self.lemmas.contains(&candidate) {
                    return candidate;
                }
            }
        }
        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Lemmatizer {
        let data = "# sample\nproduct\nbattery\nbox\nchild\nchildren\tchild\nmice\tmouse\nwoman\n";
        Lemmatizer::from_reader(data.as_bytes()).unwrap()
    }

    #[test]
    fn test_irregular_forms() {
        let lem = sample();
        assert_eq!(lem.lemmatize("children"), "child");
        assert_eq!(lem.lemmatize("mice"), "mouse");
    }

    #[test]
    fn test_suffix_rules_need_known_lemma() {
        let lem = sample();
        assert_eq!(lem.lemmatize("products"), "product");
        assert_eq!(lem.lemmatize("batteries"), "battery");
        assert_eq!(lem.lemmatize("boxes"), "box");
        assert_eq!(lem.lemmatize("women"), "woman");
        // "was" -> "wa" is not a known lemma, so it stays put
        assert_eq!(lem.lemmatize("was"), "was");
        assert_eq!(lem.lemmatize("glass"), "glass");
    }

    #[test]
    fn test_known_lemma_is_unchanged() {
        assert_eq!(sample().lemmatize("product"), "product");
    }

    #[test]
    fn test_dictionary_without_entries_is_rejected() {
        let data = "# nothing but comments\n\n";
        assert!(Lemmatizer::from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_load_missing_file_errors() {
        let path = std::env::temp_dir().join("gavel-test-no-such-lemmas.tsv");
        assert!(Lemmatizer::load(&path).is_err());
    }
}
