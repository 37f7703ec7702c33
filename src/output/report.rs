// Aggregate report over everything in the record store.
//
// Built from a full scan of both tables: how many reviews finished, how
// sentiment and profanity are distributed, and which authors are banned.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{RecordStore, ReviewRecord, Stage, UserRecord};
use crate::profanity::vocabulary;
use crate::sentiment::SentimentLabel;

/// How many of the most frequent profanity terms to list.
const TOP_TERMS: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub positive_pct: f64,
    pub negative_pct: f64,
    pub neutral_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfanityStats {
    pub checked: usize,
    pub flagged: usize,
    pub clean: usize,
    pub flagged_pct: f64,
    /// Most frequent terms across flagged reviews, most common first
    pub top_terms: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BannedAuthor {
    pub author_id: String,
    pub violation_count: u32,
    pub banned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub generated_at: DateTime<Utc>,
    pub total_reviews: usize,
    pub finalized: usize,
    /// Records per stage, by stage name
    pub stages: BTreeMap<String, usize>,
    pub sentiment: SentimentDistribution,
    /// Verdict count per sentiment strategy
    pub sentiment_methods: BTreeMap<String, usize>,
    pub profanity: ProfanityStats,
    pub total_users: usize,
    pub users_with_violations: usize,
    pub banned: Vec<BannedAuthor>,
    pub banned_pct: f64,
}

fn pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Build the report from already-loaded records.
pub fn build_report(reviews: &[ReviewRecord], users: &[UserRecord]) -> AggregateReport {
    let mut stages: BTreeMap<String, usize> = BTreeMap::new();
    let mut sentiment = SentimentDistribution::default();
    let mut sentiment_methods: BTreeMap<String, usize> = BTreeMap::new();
    let mut profanity = ProfanityStats::default();
    let mut term_counts: BTreeMap<String, usize> = BTreeMap::new();

    for record in reviews {
        *stages.entry(record.stage.as_str().to_string()).or_default() += 1;

        if let Some(verdict) = &record.sentiment {
            match verdict.label {
                SentimentLabel::Positive => sentiment.positive += 1,
                SentimentLabel::Negative => sentiment.negative += 1,
                SentimentLabel::Neutral => sentiment.neutral += 1,
            }
            *sentiment_methods.entry(verdict.method.clone()).or_default() += 1;
        }

        if let Some(verdict) = &record.profanity {
            profanity.checked += 1;
            if verdict.flagged {
                profanity.flagged += 1;
                for term in &verdict.terms {
                    *term_counts.entry(term.clone()).or_default() += 1;
                }
            }
        }
    }

    let scored = sentiment.positive + sentiment.negative + sentiment.neutral;
    sentiment.positive_pct = pct(sentiment.positive, scored);
    sentiment.negative_pct = pct(sentiment.negative, scored);
    sentiment.neutral_pct = pct(sentiment.neutral, scored);

    profanity.clean = profanity.checked - profanity.flagged;
    profanity.flagged_pct = pct(profanity.flagged, profanity.checked);

    let mut top_terms: Vec<(String, usize)> = term_counts.into_iter().collect();
    // Most frequent first; ties in vocabulary order
    top_terms.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| vocabulary::position(&a.0).cmp(&vocabulary::position(&b.0)))
    });
    top_terms.truncate(TOP_TERMS);
    profanity.top_terms = top_terms;

    let mut banned: Vec<BannedAuthor> = users
        .iter()
        .filter(|u| u.banned)
        .map(|u| BannedAuthor {
            author_id: u.author_id.clone(),
            violation_count: u.violation_count,
            banned_at: u.banned_at,
        })
        .collect();
    banned.sort_by(|a, b| {
        b.violation_count
            .cmp(&a.violation_count)
            .then_with(|| a.author_id.cmp(&b.author_id))
    });

    AggregateReport {
        generated_at: Utc::now(),
        total_reviews: reviews.len(),
        finalized: reviews.iter().filter(|r| r.stage == Stage::Finalized).count(),
        stages,
        sentiment,
        sentiment_methods,
        profanity,
        total_users: users.len(),
        users_with_violations: users.iter().filter(|u| u.violation_count > 0).count(),
        banned_pct: pct(banned.len(), users.len()),
        banned,
    }
}

/// Scan the store and build the report.
pub async fn generate(store: &dyn RecordStore) -> Result<AggregateReport> {
    let reviews = store.list_reviews().await.context("Failed to scan review records")?;
    let users = store.list_users().await.context("Failed to scan users")?;
    Ok(build_report(&reviews, &users))
}

/// Write the report as pretty JSON.
pub fn write_json(report: &AggregateReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
