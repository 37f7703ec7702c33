// Sentiment scoring — trait-based strategies behind one scorer.
//
// SentimentStrategy is the seam. The lexicon strategy always works; the
// library strategy wraps a local ONNX polarity model and is only selected when
// the model files are on disk.

pub mod download;
pub mod lexical;
pub mod library;
pub mod onnx;
pub mod scorer;
pub mod traits;

pub use scorer::{select_scorer, SentimentMode, SentimentScorer, SentimentVerdict};
pub use traits::{FieldSentiment, PolarityModel, SentimentLabel, SentimentStrategy};
