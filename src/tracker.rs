// User violation tracker — the stateful end of the pipeline.
//
// Each profane review adds one violation to its author, at most once per
// review key. Updates are optimistic: read the author's record, compute the
// next one, and ask the store to write it only if the count hasn't moved.
// A lost race re-reads and tries again, up to a fixed number of attempts.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::db::{RecordStore, UserRecord, ViolationWrite};
use crate::error::PipelineError;
use crate::review::ReviewKey;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// First retry delay; doubles per attempt up to MAX_BACKOFF.
const BASE_BACKOFF: Duration = Duration::from_millis(10);
const MAX_BACKOFF: Duration = Duration::from_millis(250);

pub struct UserViolationTracker {
    store: Arc<dyn RecordStore>,
    max_attempts: u32,
}

impl UserViolationTracker {
    pub fn new(store: Arc<dyn RecordStore>, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Current standing of an author. Authors with no violations get a fresh,
    /// unsaved record.
    pub async fn standing(&self, author_id: &str) -> Result<UserRecord, PipelineError> {
        let stored = self
            .store
            .get_user(author_id)
            .await
            .map_err(|e| PipelineError::upstream("read user record", e))?;
        Ok(stored.unwrap_or_else(|| UserRecord::new(author_id)))
    }

    /// Count this review against its author if it was profane.
    ///
    /// Idempotent per review key: replaying the same key returns the current
    /// standing without incrementing again. Clean reviews never write.
    pub async fn record_violation(
        &self,
        key: &ReviewKey,
        has_profanity: bool,
    ) -> Result<UserRecord, PipelineError> {
        let author_id = key.author_id.as_str();
        if !has_profanity {
            return self.standing(author_id).await;
        }

        for attempt in 1..=self.max_attempts {
            let current = self
                .store
                .get_user(author_id)
                .await
                .map_err(|e| PipelineError::upstream("read user record", e))?;

            let now = Utc::now();
            let next = current
                .as_ref()
                .map(|u| u.with_violation(now))
                .unwrap_or_else(|| UserRecord::new(author_id).with_violation(now));
            let expected = current.as_ref().map(|u| u.violation_count);

            let write = self
                .store
                .apply_violation(key, expected, &next)
                .await
                .map_err(|e| PipelineError::upstream("write user record", e))?;

            match write {
                ViolationWrite::Applied => {
                    if next.banned && !current.as_ref().is_some_and(|u| u.banned) {
                        info!(
                            author_id,
                            violation_count = next.violation_count,
                            "Author banned"
                        );
                    } else {
                        debug!(
                            author_id,
                            review_key = %key,
                            violation_count = next.violation_count,
                            "Violation recorded"
                        );
                    }
                    return Ok(next);
                }
                ViolationWrite::AlreadyCounted => {
                    debug!(review_key = %key, "Violation already counted, skipping");
                    return self.standing(author_id).await;
                }
                ViolationWrite::Conflict => {
                    debug!(author_id, attempt, "Violation update lost a race, retrying");
                    if attempt < self.max_attempts {
                        tokio::time::sleep(backoff(attempt)).await;
                    }
                }
            }
        }

        let conflict = PipelineError::StateConflict {
            author_id: author_id.to_string(),
            attempts: self.max_attempts,
        };
        warn!(error = %conflict, "Giving up on violation update");
        Err(PipelineError::UpstreamUnavailable(conflict.to_string()))
    }
}

fn backoff(attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(8);
    (BASE_BACKOFF * factor).min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff(1), Duration::from_millis(10));
        assert_eq!(backoff(2), Duration::from_millis(20));
        assert_eq!(backoff(3), Duration::from_millis(40));
        assert_eq!(backoff(10), MAX_BACKOFF);
    }
}
