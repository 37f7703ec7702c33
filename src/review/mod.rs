// Review model — the canonical input every invocation is resolved to.
//
// A review's identity is (author id, product id). Re-submitting the same pair
// is the same logical review, so every artifact and marker is keyed by it.

pub mod payload;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rating used when the payload has none (midpoint of the 1-5 scale).
pub const NEUTRAL_RATING: f64 = 3.0;
pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// Identity of one logical review.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReviewKey {
    pub author_id: String,
    pub product_id: String,
}

impl ReviewKey {
    pub fn new(author_id: impl Into<String>, product_id: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
            product_id: product_id.into(),
        }
    }

    /// Flat form safe for blob keys and table primary keys.
    ///
    /// Each id is percent-escaped (everything except ASCII alphanumerics, `-`
    /// and `.`), so the `_` separator can't appear inside either half and two
    /// different keys never collide.
    pub fn storage_key(&self) -> String {
        format!("{}_{}", escape_id(&self.author_id), escape_id(&self.product_id))
    }
}

impl std::fmt::Display for ReviewKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.author_id, self.product_id)
    }
}

fn escape_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'.' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// A product review as submitted. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub author_id: String,
    pub product_id: String,
    pub author_name: Option<String>,
    pub body: String,
    pub summary: String,
    /// Star rating, always within 1.0..=5.0 after parsing.
    pub rating: f64,
    pub submitted_at: Option<DateTime<Utc>>,
    /// The payload had no author id and `author_id` is a placeholder.
    /// Such reviews are moderated but never counted against an author.
    #[serde(default)]
    pub author_defaulted: bool,
}

impl Review {
    pub fn key(&self) -> ReviewKey {
        ReviewKey::new(self.author_id.clone(), self.product_id.clone())
    }
}
