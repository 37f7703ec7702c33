// Colored terminal output for pipeline outcomes, batch runs and reports.
//
// main.rs display paths delegate here so formatting stays out of the
// command handlers.

use colored::Colorize;

use super::report::AggregateReport;
use crate::pipeline::batch::BatchSummary;
use crate::pipeline::{OutcomeStatus, PipelineOutcome};
use crate::sentiment::SentimentLabel;

/// Display the result of a single invocation.
pub fn display_outcome(outcome: &PipelineOutcome) {
    let key = outcome
        .review_key
        .as_ref()
        .map(|k| k.to_string())
        .unwrap_or_else(|| "(unresolved)".to_string());

    let status = match outcome.status {
        OutcomeStatus::Completed => "completed".green().bold(),
        OutcomeStatus::AlreadyCompleted => "already completed".cyan(),
        OutcomeStatus::Failed => "failed".red().bold(),
    };
    println!("\n{} {}", format!("Review {key}:").bold(), status);

    if let Some(stage) = outcome.stage {
        match outcome.resumed_from {
            Some(from) if from != stage => println!("  Stage: {stage} (resumed from {from})"),
            _ => println!("  Stage: {stage}"),
        }
    }

    if let Some(profanity) = &outcome.profanity {
        if profanity.flagged {
            println!(
                "  Profanity: {} ({})",
                "yes".red().bold(),
                profanity.terms.join(", ")
            );
        } else {
            println!("  Profanity: {}", "no".green());
        }
    }

    if let Some(sentiment) = &outcome.sentiment {
        println!(
            "  Sentiment: {} (confidence {:.2}, {})",
            colorize_label(sentiment.label),
            sentiment.confidence,
            sentiment.method.dimmed()
        );
    }

    if let Some(author) = &outcome.author {
        let standing = if author.banned {
            "banned".red().bold()
        } else {
            "in good standing".green()
        };
        println!(
            "  Author {}: {} violation(s), {}",
            author.author_id, author.violation_count, standing
        );
    }

    for note in &outcome.notes {
        println!("  {} {}: {}", "~".yellow(), note.kind, note.message);
    }

    if let Some(error) = &outcome.error {
        println!("  {} {}: {}", "!!".red().bold(), error.kind, error.message);
    }
}

/// Display the totals of a batch run.
pub fn display_batch_summary(summary: &BatchSummary) {
    println!("\n{}", "=== Batch Summary ===".bold());
    println!("  Lines:              {}", summary.lines);
    println!("  Completed:          {}", summary.completed.to_string().green());
    println!("  Already completed:  {}", summary.already_completed);
    if summary.failed > 0 {
        println!("  Failed:             {}", summary.failed.to_string().red());
        if summary.unparseable > 0 {
            println!("    (not JSON:        {})", summary.unparseable);
        }
    } else {
        println!("  Failed:             0");
    }
    println!("  Flagged profanity:  {}", summary.flagged);
}

/// Display the aggregate report.
pub fn display_report(report: &AggregateReport) {
    println!("\n{}", "=== Review Analysis Report ===".bold());
    println!(
        "  Reviews: {} total, {} finalized",
        report.total_reviews, report.finalized
    );
    for (stage, count) in &report.stages {
        println!("    {:<20} {:>6}", stage.dimmed(), count);
    }

    println!("\n{}", "Sentiment".bold());
    let s = &report.sentiment;
    println!("  {:<10} {:>6}  ({:>5.1}%)", "positive".green(), s.positive, s.positive_pct);
    println!("  {:<10} {:>6}  ({:>5.1}%)", "negative".red(), s.negative, s.negative_pct);
    println!("  {:<10} {:>6}  ({:>5.1}%)", "neutral".yellow(), s.neutral, s.neutral_pct);
    if !report.sentiment_methods.is_empty() {
        let methods: Vec<String> = report
            .sentiment_methods
            .iter()
            .map(|(m, n)| format!("{m}: {n}"))
            .collect();
        println!("  {}", format!("strategies: {}", methods.join(", ")).dimmed());
    }

    println!("\n{}", "Profanity".bold());
    let p = &report.profanity;
    println!(
        "  {} of {} checked reviews flagged ({:.2}%), {} clean",
        p.flagged, p.checked, p.flagged_pct, p.clean
    );
    if !p.top_terms.is_empty() {
        let terms: Vec<String> = p
            .top_terms
            .iter()
            .map(|(t, n)| format!("{t} ({n})"))
            .collect();
        println!("  Top terms: {}", terms.join(", "));
    }

    println!("\n{}", "Authors".bold());
    println!(
        "  {} total, {} with violations, {} banned ({:.2}%)",
        report.total_users,
        report.users_with_violations,
        report.banned.len(),
        report.banned_pct
    );
    for author in &report.banned {
        let since = author
            .banned_at
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!(
            "  {} {:<24} {:>3} violations (banned {})",
            "!!".red().bold(),
            author.author_id,
            author.violation_count,
            since
        );
    }
}

fn colorize_label(label: SentimentLabel) -> colored::ColoredString {
    match label {
        SentimentLabel::Positive => label.as_str().green(),
        SentimentLabel::Negative => label.as_str().red(),
        SentimentLabel::Neutral => label.as_str().yellow(),
    }
}
