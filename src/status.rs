// System status display — DB stats, stage counts, capabilities.

use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::db::RecordStore;
use crate::sentiment::download::model_files_present;

/// Display system status to the terminal.
pub async fn show(store: &Arc<dyn RecordStore>, config: &Config) -> Result<()> {
    let file_size = std::fs::metadata(&config.db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", config.db_path, file_size);
    println!(
        "Tables: {} / {} ({} total)",
        config.tables.reviews,
        config.tables.users,
        store.table_count().await?
    );
    println!("Blob store: {}", config.blob_root.display());

    let counts = store.stage_counts().await?;
    let total: u64 = counts.iter().map(|(_, n)| n).sum();
    if total == 0 {
        println!("Reviews: none processed yet");
        println!("  Run `gavel process` or `gavel batch` to add some");
    } else {
        println!("Reviews: {total}");
        for (stage, count) in &counts {
            println!("  {:<20} {}", stage.as_str(), count);
        }
    }

    let users = store.list_users().await?;
    let banned = users.iter().filter(|u| u.banned).count();
    println!("Authors with violations: {} ({} banned)", users.len(), banned);

    if model_files_present(&config.model_dir) {
        println!("Sentiment model: installed ({})", config.model_dir.display());
    } else {
        println!("Sentiment model: not installed (lexicon strategy in use)");
        println!("  Run `gavel download-model` to enable it");
    }

    if config.lemma_file_present() {
        println!("Lemma dictionary: {}", config.lemma_path.display());
    } else {
        println!(
            "Lemma dictionary: not found at {} (tokens are not lemmatized)",
            config.lemma_path.display()
        );
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
