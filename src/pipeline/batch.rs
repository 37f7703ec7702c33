// Batch runs: push a JSONL file of reviews (or events) through the pipeline.
//
// Each line is a review object or an event document. Reviews run
// concurrently; reviews by the same author contend on that author's record,
// which the tracker's conditional updates absorb.

use std::path::Path;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::orchestrator::{OutcomeStatus, PipelineOrchestrator, PipelineOutcome};

/// Totals for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub lines: usize,
    pub completed: usize,
    pub already_completed: usize,
    pub failed: usize,
    /// Lines that weren't JSON at all (counted in `failed` too)
    pub unparseable: usize,
    pub flagged: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &PipelineOutcome) {
        match outcome.status {
            OutcomeStatus::Completed => self.completed += 1,
            OutcomeStatus::AlreadyCompleted => self.already_completed += 1,
            OutcomeStatus::Failed => self.failed += 1,
        }
        if outcome.profanity.as_ref().is_some_and(|p| p.flagged) {
            self.flagged += 1;
        }
    }
}

/// Read a JSONL file, skipping blank lines.
pub fn read_lines(path: &Path, limit: Option<usize>) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file {}", path.display()))?;
    let lines = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(limit.unwrap_or(usize::MAX))
        .map(str::to_string)
        .collect();
    Ok(lines)
}

/// Run every line through the orchestrator, `concurrency` at a time.
pub async fn run(
    orchestrator: &PipelineOrchestrator,
    lines: Vec<String>,
    concurrency: usize,
    show_progress: bool,
) -> (BatchSummary, Vec<PipelineOutcome>) {
    let mut summary = BatchSummary {
        lines: lines.len(),
        ..Default::default()
    };

    let pb = if show_progress {
        let pb = ProgressBar::new(lines.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  Reviews [{bar:30}] {pos}/{len} ({eta})")
                .expect("valid template"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let results: Vec<Option<PipelineOutcome>> =
        stream::iter(lines.into_iter().enumerate().map(|(i, line)| {
            let pb = &pb;
            async move {
                let result = match serde_json::from_str::<Value>(&line) {
                    Ok(event) => Some(orchestrator.handle_event(&event).await),
                    Err(e) => {
                        warn!(line = i + 1, error = %e, "Skipping line that is not JSON");
                        None
                    }
                };
                pb.inc(1);
                result
            }
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    pb.finish_and_clear();

    let mut outcomes = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Some(outcome) => {
                summary.record(&outcome);
                outcomes.push(outcome);
            }
            None => {
                summary.unparseable += 1;
                summary.failed += 1;
            }
        }
    }

    info!(
        lines = summary.lines,
        completed = summary.completed,
        already_completed = summary.already_completed,
        failed = summary.failed,
        flagged = summary.flagged,
        "Batch finished"
    );
    (summary, outcomes)
}
