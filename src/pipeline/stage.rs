// Stage artifacts — where each stage's output lands in the blob store.
//
//   received           reviews_bucket/raw/<key>.json
//   normalized         processed_bucket/normalized/<key>.json
//   profanity_checked  profanity_bucket/profanity/<key>.json
//   sentiment_scored   sentiment_bucket/sentiment/<key>.json
//   finalized          sentiment_bucket/final/<key>.json
//
// The raw artifact is the payload as submitted; every later artifact is the
// ReviewRecord snapshot at that stage.

use crate::config::Buckets;
use crate::db::Stage;
use crate::review::ReviewKey;

/// Bucket and object key of one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    pub bucket: String,
    pub key: String,
}

impl std::fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

fn prefix(stage: Stage) -> &'static str {
    match stage {
        Stage::Received => "raw",
        Stage::Normalized => "normalized",
        Stage::ProfanityChecked => "profanity",
        Stage::SentimentScored => "sentiment",
        Stage::Finalized => "final",
    }
}

pub fn artifact_location(buckets: &Buckets, stage: Stage, key: &ReviewKey) -> ArtifactLocation {
    let bucket = match stage {
        Stage::Received => &buckets.reviews,
        Stage::Normalized => &buckets.processed,
        Stage::ProfanityChecked => &buckets.profanity,
        Stage::SentimentScored | Stage::Finalized => &buckets.sentiment,
    };
    ArtifactLocation {
        bucket: bucket.clone(),
        key: format!("{}/{}.json", prefix(stage), key.storage_key()),
    }
}

/// The stage after `stage`, or None once finalized.
pub fn next_stage(stage: Stage) -> Option<Stage> {
    match stage {
        Stage::Received => Some(Stage::Normalized),
        Stage::Normalized => Some(Stage::ProfanityChecked),
        Stage::ProfanityChecked => Some(Stage::SentimentScored),
        Stage::SentimentScored => Some(Stage::Finalized),
        Stage::Finalized => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_layout() {
        let buckets = Buckets::default();
        let key = ReviewKey::new("U1", "P1");

        let raw = artifact_location(&buckets, Stage::Received, &key);
        assert_eq!(raw.to_string(), "review-analysis-reviews/raw/U1_P1.json");

        let normalized = artifact_location(&buckets, Stage::Normalized, &key);
        assert_eq!(normalized.bucket, "review-analysis-processed");
        assert_eq!(normalized.key, "normalized/U1_P1.json");

        let profanity = artifact_location(&buckets, Stage::ProfanityChecked, &key);
        assert_eq!(profanity.bucket, "review-analysis-profanity");

        let scored = artifact_location(&buckets, Stage::SentimentScored, &key);
        let fin = artifact_location(&buckets, Stage::Finalized, &key);
        assert_eq!(scored.bucket, fin.bucket);
        assert_eq!(fin.key, "final/U1_P1.json");
    }

    #[test]
    fn test_next_stage_walks_forward() {
        let mut stage = Stage::Received;
        let mut seen = vec![stage];
        while let Some(next) = next_stage(stage) {
            assert!(next > stage);
            stage = next;
            seen.push(stage);
        }
        assert_eq!(seen, Stage::ALL.to_vec());
    }
}
