// Data models — the rows the record store keeps.
//
// Kept apart from the queries so the pipeline can use them without depending
// on rusqlite directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;
use crate::profanity::ProfanityVerdict;
use crate::review::{Review, ReviewKey};
use crate::sentiment::SentimentVerdict;
use crate::text::NormalizedText;

/// An author is banned once their violation count goes past this.
pub const BAN_THRESHOLD: u32 = 3;

/// How far a review has got through the pipeline. Ordered: a stored record
/// only ever moves to a later stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Normalized,
    ProfanityChecked,
    SentimentScored,
    Finalized,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Received,
        Stage::Normalized,
        Stage::ProfanityChecked,
        Stage::SentimentScored,
        Stage::Finalized,
    ];

    /// Numeric position, stored alongside the name so SQL can compare stages.
    pub fn rank(&self) -> i64 {
        match self {
            Stage::Received => 0,
            Stage::Normalized => 1,
            Stage::ProfanityChecked => 2,
            Stage::SentimentScored => 3,
            Stage::Finalized => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Normalized => "normalized",
            Stage::ProfanityChecked => "profanity_checked",
            Stage::SentimentScored => "sentiment_scored",
            Stage::Finalized => "finalized",
        }
    }

    pub fn parse(s: &str) -> Option<Stage> {
        Stage::ALL.into_iter().find(|stage| stage.as_str() == s)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// When each stage was completed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageTimestamps {
    pub received_at: Option<DateTime<Utc>>,
    pub normalized_at: Option<DateTime<Utc>>,
    pub profanity_checked_at: Option<DateTime<Utc>>,
    pub sentiment_scored_at: Option<DateTime<Utc>>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl StageTimestamps {
    pub fn mark(&mut self, stage: Stage, at: DateTime<Utc>) {
        let slot = match stage {
            Stage::Received => &mut self.received_at,
            Stage::Normalized => &mut self.normalized_at,
            Stage::ProfanityChecked => &mut self.profanity_checked_at,
            Stage::SentimentScored => &mut self.sentiment_scored_at,
            Stage::Finalized => &mut self.finalized_at,
        };
        *slot = Some(at);
    }
}

/// Normalized forms of both text fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedFields {
    pub body: NormalizedText,
    pub summary: NormalizedText,
}

/// Something short of an error that happened while processing a review:
/// a defaulted input field or a capability that ran in degraded mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordNote {
    pub kind: ErrorKind,
    pub message: String,
}

impl RecordNote {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::MalformedInput,
            message: message.into(),
        }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::DegradedCapability,
            message: message.into(),
        }
    }
}

/// The durable checkpoint for one review. Each stage fills in its section and
/// advances `stage`; nothing earlier is rewritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub key: ReviewKey,
    pub stage: Stage,
    pub review: Review,
    pub notes: Vec<RecordNote>,
    pub normalized: Option<NormalizedFields>,
    pub profanity: Option<ProfanityVerdict>,
    pub sentiment: Option<SentimentVerdict>,
    /// Author standing right after this review was counted (finalized only)
    pub author: Option<UserRecord>,
    pub timestamps: StageTimestamps,
}

impl ReviewRecord {
    pub fn received(review: Review, notes: Vec<RecordNote>, at: DateTime<Utc>) -> Self {
        let mut timestamps = StageTimestamps::default();
        timestamps.mark(Stage::Received, at);
        Self {
            key: review.key(),
            stage: Stage::Received,
            review,
            notes,
            normalized: None,
            profanity: None,
            sentiment: None,
            author: None,
            timestamps,
        }
    }

    /// Move to `stage`, stamping its completion time.
    pub fn advance(&mut self, stage: Stage, at: DateTime<Utc>) {
        debug_assert!(stage > self.stage, "stage must move forward");
        self.stage = stage;
        self.timestamps.mark(stage, at);
    }

    pub fn has_profanity(&self) -> Option<bool> {
        self.profanity.as_ref().map(|p| p.flagged)
    }
}

/// Per-author moderation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub author_id: String,
    pub violation_count: u32,
    pub banned: bool,
    pub banned_at: Option<DateTime<Utc>>,
    /// When the most recent violation was counted; `None` for a clean author
    pub last_violation_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// A clean author with no recorded violations.
    pub fn new(author_id: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
            violation_count: 0,
            banned: false,
            banned_at: None,
            last_violation_at: None,
        }
    }

    /// This record with one more violation. Once banned, always banned.
    pub fn with_violation(&self, at: DateTime<Utc>) -> Self {
        let violation_count = self.violation_count + 1;
        let newly_banned = !self.banned && violation_count > BAN_THRESHOLD;
        Self {
            author_id: self.author_id.clone(),
            violation_count,
            banned: self.banned || violation_count > BAN_THRESHOLD,
            banned_at: if newly_banned { Some(at) } else { self.banned_at },
            last_violation_at: Some(at),
        }
    }
}

/// Result of a conditional violation write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationWrite {
    /// Count updated and the review key marked as counted, atomically.
    Applied,
    /// The review key was counted earlier; nothing changed.
    AlreadyCounted,
    /// The stored count no longer matches what the caller read. Re-read and retry.
    Conflict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_and_rank_agree() {
        for pair in Stage::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn test_stage_parse_roundtrip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(Stage::parse("done"), None);
    }

    #[test]
    fn test_ban_after_fourth_violation() {
        let now = Utc::now();
        let mut user = UserRecord::new("U1");
        for expected in 1..=3 {
            user = user.with_violation(now);
            assert_eq!(user.violation_count, expected);
            assert!(!user.banned);
        }
        user = user.with_violation(now);
        assert_eq!(user.violation_count, 4);
        assert!(user.banned);
        assert_eq!(user.banned_at, Some(now));
    }

    #[test]
    fn test_ban_timestamp_is_kept() {
        let first = Utc::now();
        let mut user = UserRecord::new("U1");
        for _ in 0..4 {
            user = user.with_violation(first);
        }
        let later = first + chrono::Duration::seconds(60);
        let user = user.with_violation(later);
        assert!(user.banned);
        assert_eq!(user.banned_at, Some(first));
        assert_eq!(user.last_violation_at, Some(later));
    }
}
