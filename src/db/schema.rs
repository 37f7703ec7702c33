// Database schema — table creation.
//
// Table names come from configuration, so every statement is built from a
// `TableNames` with the identifiers quoted. A `schema_version` table records
// which layout the file was created with.

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::config::{DEFAULT_REVIEWS_TABLE, DEFAULT_USERS_TABLE};

pub const SCHEMA_VERSION: i64 = 1;

/// Names of the two configured tables plus the derived marker table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub reviews: String,
    pub users: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self::new(DEFAULT_REVIEWS_TABLE, DEFAULT_USERS_TABLE)
    }
}

impl TableNames {
    pub fn new(reviews: impl Into<String>, users: impl Into<String>) -> Self {
        Self {
            reviews: reviews.into(),
            users: users.into(),
        }
    }

    /// Quoted review table identifier.
    pub fn reviews_sql(&self) -> String {
        quote_ident(&self.reviews)
    }

    /// Quoted user table identifier.
    pub fn users_sql(&self) -> String {
        quote_ident(&self.users)
    }

    /// Quoted identifier of the per-review "already counted" marker table.
    pub fn markers_sql(&self) -> String {
        quote_ident(&format!("{}-counted", self.users))
    }
}

/// Quote an SQL identifier, doubling any embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Create all tables if they don't exist yet.
///
/// Idempotent, safe to call on every startup.
pub fn create_tables(conn: &Connection, tables: &TableNames) -> Result<()> {
    let reviews = tables.reviews_sql();
    let users = tables.users_sql();
    let markers = tables.markers_sql();
    let author_index = quote_ident(&format!("idx-{}-author", tables.reviews));
    let stage_index = quote_ident(&format!("idx-{}-stage", tables.reviews));

    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- One row per review key. The full record is JSON; the columns beside
        -- it exist for filtering and for the forward-only stage check.
        CREATE TABLE IF NOT EXISTS {reviews} (
            review_key TEXT PRIMARY KEY,
            author_id TEXT NOT NULL,
            product_id TEXT NOT NULL,
            stage TEXT NOT NULL,
            stage_rank INTEGER NOT NULL,
            has_profanity INTEGER,             -- NULL until profanity_checked
            sentiment_label TEXT,              -- NULL until sentiment_scored
            record_json TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS {users} (
            author_id TEXT PRIMARY KEY,
            violation_count INTEGER NOT NULL DEFAULT 0 CHECK (violation_count >= 0),
            banned INTEGER NOT NULL DEFAULT 0,
            banned_at TEXT,
            last_violation_at TEXT
        );

        -- Review keys whose violation has been added to an author's count.
        -- Written in the same transaction as the count itself.
        CREATE TABLE IF NOT EXISTS {markers} (
            review_key TEXT PRIMARY KEY,
            author_id TEXT NOT NULL,
            counted_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS {author_index} ON {reviews}(author_id);
        CREATE INDEX IF NOT EXISTS {stage_index} ON {reviews}(stage_rank);
        "
    ))
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
