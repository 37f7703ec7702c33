// Profanity detection against a fixed vocabulary.

pub mod detector;
pub mod vocabulary;

pub use detector::{detect_text, FieldProfanity, ProfanityDetector, ProfanityVerdict};
