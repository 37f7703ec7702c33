// Text normalization — tokenizer, stop-words, optional lemmatizer.

pub mod lemmatizer;
pub mod normalizer;
pub mod stopwords;

pub use normalizer::{NormalizedText, TextNormalizer};
