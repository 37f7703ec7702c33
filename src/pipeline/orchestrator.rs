// Pipeline orchestrator — drives one review through every stage.
//
// received -> normalized -> profanity_checked -> sentiment_scored -> finalized
//
// Each transition runs the next stage on the stored checkpoint, writes the
// stage artifact, then advances the checkpoint. A re-invocation for the same
// review key starts from whatever stage was last stored, so a crash costs at
// most one stage of repeated work. Finalizing calls the violation tracker,
// which is idempotent per review key, so replays never double count.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::stage::{artifact_location, next_stage};
use crate::blob::{self, BlobStore};
use crate::config::Buckets;
use crate::db::models::{NormalizedFields, RecordNote};
use crate::db::{RecordStore, ReviewRecord, Stage, UserRecord};
use crate::error::{ErrorKind, PipelineError};
use crate::profanity::{ProfanityDetector, ProfanityVerdict};
use crate::review::payload::{parse_review, parse_review_bytes, Invocation, ParsedReview};
use crate::review::ReviewKey;
use crate::sentiment::{SentimentScorer, SentimentVerdict};
use crate::text::TextNormalizer;
use crate::tracker::UserViolationTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// This invocation took the review to finalized.
    Completed,
    /// The review was finalized by an earlier invocation; nothing was rerun.
    AlreadyCompleted,
    /// Processing stopped early. `stage` is the last durably recorded stage.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// What the caller gets back from one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub status: OutcomeStatus,
    pub review_key: Option<ReviewKey>,
    /// Highest stage durably recorded for this review
    pub stage: Option<Stage>,
    /// Stage the stored checkpoint was at when this invocation started
    pub resumed_from: Option<Stage>,
    pub profanity: Option<ProfanityVerdict>,
    pub sentiment: Option<SentimentVerdict>,
    pub author: Option<UserRecord>,
    pub notes: Vec<RecordNote>,
    pub error: Option<OutcomeError>,
}

impl PipelineOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(
            self.status,
            OutcomeStatus::Completed | OutcomeStatus::AlreadyCompleted
        )
    }

    fn from_record(status: OutcomeStatus, resumed_from: Option<Stage>, record: ReviewRecord) -> Self {
        Self {
            status,
            review_key: Some(record.key),
            stage: Some(record.stage),
            resumed_from,
            profanity: record.profanity,
            sentiment: record.sentiment,
            author: record.author,
            notes: record.notes,
            error: None,
        }
    }
}

/// How far an invocation got before it stopped, for failure reporting.
#[derive(Default)]
struct Progress {
    key: Option<ReviewKey>,
    stage: Option<Stage>,
    resumed_from: Option<Stage>,
}

pub struct PipelineOrchestrator {
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn RecordStore>,
    normalizer: TextNormalizer,
    detector: ProfanityDetector,
    scorer: Arc<SentimentScorer>,
    tracker: UserViolationTracker,
    buckets: Buckets,
}

impl PipelineOrchestrator {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        records: Arc<dyn RecordStore>,
        normalizer: TextNormalizer,
        scorer: SentimentScorer,
        buckets: Buckets,
        max_conflict_retries: u32,
    ) -> Self {
        let tracker = UserViolationTracker::new(Arc::clone(&records), max_conflict_retries);
        Self {
            blobs,
            records,
            normalizer,
            detector: ProfanityDetector::new(),
            scorer: Arc::new(scorer),
            tracker,
            buckets,
        }
    }

    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    pub fn sentiment_method(&self) -> &'static str {
        self.scorer.method()
    }

    /// Run one invocation to completion or to the first failure.
    ///
    /// Never returns partial progress as success: a failure reports the last
    /// stage that was durably stored and the error kind, and the invocation
    /// can be retried as-is.
    pub async fn handle(&self, invocation: Invocation) -> PipelineOutcome {
        let mut progress = Progress::default();
        match self.run(invocation, &mut progress).await {
            Ok((status, record)) => {
                PipelineOutcome::from_record(status, progress.resumed_from, record)
            }
            Err(e) => {
                warn!(
                    review_key = ?progress.key.as_ref().map(|k| k.to_string()),
                    stage = ?progress.stage.map(|s| s.as_str()),
                    kind = %e.kind(),
                    error = %e,
                    "Pipeline invocation failed"
                );
                PipelineOutcome {
                    status: OutcomeStatus::Failed,
                    review_key: progress.key,
                    stage: progress.stage,
                    resumed_from: progress.resumed_from,
                    profanity: None,
                    sentiment: None,
                    author: None,
                    notes: Vec::new(),
                    error: Some(OutcomeError {
                        kind: e.kind(),
                        message: e.to_string(),
                    }),
                }
            }
        }
    }

    /// Parse an event document and run it. A document that is not a
    /// recognizable event fails with `malformed_input`.
    pub async fn handle_event(&self, event: &Value) -> PipelineOutcome {
        match Invocation::from_event(event) {
            Ok(invocation) => self.handle(invocation).await,
            Err(e) => PipelineOutcome {
                status: OutcomeStatus::Failed,
                review_key: None,
                stage: None,
                resumed_from: None,
                profanity: None,
                sentiment: None,
                author: None,
                notes: Vec::new(),
                error: Some(OutcomeError {
                    kind: e.kind(),
                    message: e.to_string(),
                }),
            },
        }
    }

    async fn run(
        &self,
        invocation: Invocation,
        progress: &mut Progress,
    ) -> Result<(OutcomeStatus, ReviewRecord), PipelineError> {
        let (parsed, raw) = self.resolve(invocation).await?;
        let key = parsed.review.key();
        progress.key = Some(key.clone());

        let stored = self
            .records
            .get_review(&key)
            .await
            .map_err(|e| PipelineError::upstream("read review record", e))?;

        let mut record = match stored {
            Some(record) => {
                progress.stage = Some(record.stage);
                progress.resumed_from = Some(record.stage);
                if record.stage == Stage::Finalized {
                    debug!(review_key = %key, "Review already finalized");
                    return Ok((OutcomeStatus::AlreadyCompleted, record));
                }
                info!(review_key = %key, stage = %record.stage, "Resuming review");
                record
            }
            None => self.receive(parsed, raw, progress).await?,
        };

        while let Some(stage) = next_stage(record.stage) {
            let mut next = record.clone();
            self.run_stage(stage, &mut next).await?;
            next.advance(stage, Utc::now());

            self.write_artifact(stage, &next).await?;
            let written = self
                .records
                .put_review(&next)
                .await
                .map_err(|e| PipelineError::upstream("write review record", e))?;

            if written {
                debug!(review_key = %key, stage = %stage, "Stage recorded");
                progress.stage = Some(stage);
                record = next;
            } else {
                // Another invocation got this key to the same stage or further
                // first. Continue from its checkpoint instead of ours.
                record = self
                    .records
                    .get_review(&key)
                    .await
                    .map_err(|e| PipelineError::upstream("read review record", e))?
                    .ok_or_else(|| {
                        PipelineError::UpstreamUnavailable(format!(
                            "review record for {key} disappeared during processing"
                        ))
                    })?;
                progress.stage = Some(record.stage);
                debug!(review_key = %key, stage = %record.stage, "Checkpoint advanced elsewhere");
            }
        }

        info!(
            review_key = %key,
            has_profanity = ?record.has_profanity(),
            sentiment = ?record.sentiment.as_ref().map(|s| s.label.as_str()),
            "Review finalized"
        );
        Ok((OutcomeStatus::Completed, record))
    }

    /// Turn the invocation into a parsed review plus, for inline payloads,
    /// the raw bytes that still need storing.
    async fn resolve(
        &self,
        invocation: Invocation,
    ) -> Result<(ParsedReview, Option<Vec<u8>>), PipelineError> {
        match invocation {
            Invocation::Direct(value) => {
                let parsed = parse_review(&value)?;
                let raw = serde_json::to_vec_pretty(&value).map_err(|e| {
                    PipelineError::MalformedInput(format!("review payload can't be re-encoded: {e}"))
                })?;
                Ok((parsed, Some(raw)))
            }
            Invocation::BlobCreated { bucket, key } => {
                let bytes = self
                    .blobs
                    .get(&bucket, &key)
                    .await
                    .map_err(|e| PipelineError::upstream("fetch review blob", e))?
                    .ok_or_else(|| {
                        PipelineError::UpstreamUnavailable(format!(
                            "review blob {bucket}/{key} not found"
                        ))
                    })?;
                Ok((parse_review_bytes(&bytes)?, None))
            }
        }
    }

    /// First sight of a review key: store the raw payload and the received checkpoint.
    async fn receive(
        &self,
        parsed: ParsedReview,
        raw: Option<Vec<u8>>,
        progress: &mut Progress,
    ) -> Result<ReviewRecord, PipelineError> {
        let key = parsed.review.key();
        for warning in &parsed.warnings {
            warn!(review_key = %key, warning = %warning, "Malformed input defaulted");
        }

        if let Some(raw) = raw {
            let location = artifact_location(&self.buckets, Stage::Received, &key);
            self.blobs
                .put(&location.bucket, &location.key, raw)
                .await
                .map_err(|e| PipelineError::upstream("store raw review", e))?;
        }

        let notes = parsed.warnings.into_iter().map(RecordNote::malformed).collect();
        let record = ReviewRecord::received(parsed.review, notes, Utc::now());

        let written = self
            .records
            .put_review(&record)
            .await
            .map_err(|e| PipelineError::upstream("write review record", e))?;

        if written {
            progress.stage = Some(Stage::Received);
            info!(review_key = %key, "Review received");
            return Ok(record);
        }

        // Raced with another invocation for the same key; use its checkpoint.
        let stored = self
            .records
            .get_review(&key)
            .await
            .map_err(|e| PipelineError::upstream("read review record", e))?
            .ok_or_else(|| {
                PipelineError::UpstreamUnavailable(format!("review record for {key} not readable"))
            })?;
        progress.stage = Some(stored.stage);
        progress.resumed_from = Some(stored.stage);
        Ok(stored)
    }

    /// Fill in the section of `record` that `stage` produces.
    async fn run_stage(&self, stage: Stage, record: &mut ReviewRecord) -> Result<(), PipelineError> {
        match stage {
            Stage::Received => Ok(()),

            Stage::Normalized => {
                let fields = NormalizedFields {
                    body: self.normalizer.normalize(&record.review.body),
                    summary: self.normalizer.normalize(&record.review.summary),
                };
                if !self.normalizer.lemmatizes() {
                    record.notes.push(RecordNote::degraded(
                        "lemma dictionary unavailable, tokens are surface forms",
                    ));
                }
                record.normalized = Some(fields);
                Ok(())
            }

            Stage::ProfanityChecked => {
                let normalized = require(&record.normalized, &record.key, "normalized text")?;
                let verdict = self.detector.detect(
                    &record.review.body,
                    &normalized.body,
                    &record.review.summary,
                    &normalized.summary,
                    record.review.rating,
                );
                if verdict.flagged {
                    debug!(review_key = %record.key, terms = ?verdict.terms, "Profanity detected");
                }
                record.profanity = Some(verdict);
                Ok(())
            }

            Stage::SentimentScored => {
                let normalized = require(&record.normalized, &record.key, "normalized text")?;
                let scorer = Arc::clone(&self.scorer);
                let body = record.review.body.clone();
                let summary = record.review.summary.clone();
                let cleaned_body = normalized.body.cleaned.clone();
                let cleaned_summary = normalized.summary.cleaned.clone();
                let rating = record.review.rating;

                // Model inference is CPU-bound; keep it off the async workers.
                let verdict = tokio::task::spawn_blocking(move || {
                    scorer.score(&body, &summary, &cleaned_body, &cleaned_summary, rating)
                })
                .await
                .map_err(|e| {
                    PipelineError::UpstreamUnavailable(format!("sentiment worker failed: {e}"))
                })?;

                if let Some(reason) = self.scorer.degraded_reason() {
                    record.notes.push(RecordNote::degraded(reason));
                }
                record.sentiment = Some(verdict);
                Ok(())
            }

            Stage::Finalized => {
                let profanity = require(&record.profanity, &record.key, "profanity verdict")?;
                if record.review.author_defaulted {
                    // Placeholder authors are never tracked
                    if profanity.flagged {
                        record.notes.push(RecordNote::malformed(
                            "author id missing, violation not counted against any author",
                        ));
                    }
                    return Ok(());
                }
                let standing = self
                    .tracker
                    .record_violation(&record.key, profanity.flagged)
                    .await?;
                record.author = Some(standing);
                Ok(())
            }
        }
    }

    async fn write_artifact(&self, stage: Stage, record: &ReviewRecord) -> Result<(), PipelineError> {
        let location = artifact_location(&self.buckets, stage, &record.key);
        blob::put_json(self.blobs.as_ref(), &location.bucket, &location.key, record)
            .await
            .map_err(|e| PipelineError::upstream(&format!("store {stage} artifact"), e))
    }
}

/// A section an earlier stage should have stored. Missing means the
/// checkpoint is damaged; report it as a store failure so it gets attention.
fn require<'a, T>(
    section: &'a Option<T>,
    key: &ReviewKey,
    what: &str,
) -> Result<&'a T, PipelineError> {
    section.as_ref().ok_or_else(|| {
        PipelineError::UpstreamUnavailable(format!("stored record for {key} is missing its {what}"))
    })
}
