// Database queries — every SQL statement the record store runs.
//
// Keeps SQL in one place and gives the rest of the app plain Rust
// interfaces. Functions take the connection and the configured table names.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use super::models::{ReviewRecord, Stage, UserRecord, ViolationWrite};
use super::schema::TableNames;
use crate::review::ReviewKey;

// --- Review records ---

pub fn get_review(conn: &Connection, t: &TableNames, key: &ReviewKey) -> Result<Option<ReviewRecord>> {
    let sql = format!(
        "SELECT record_json FROM {} WHERE review_key = ?1",
        t.reviews_sql()
    );
    let json: Option<String> = conn
        .query_row(&sql, params![key.storage_key()], |row| row.get(0))
        .optional()?;

    match json {
        Some(json) => {
            let record = serde_json::from_str(&json)
                .with_context(|| format!("Corrupt review record for {key}"))?;
            Ok(Some(record))
        }
        None => Ok(None),
    }
}

/// Insert a record, or replace the stored one if `record` is at a later stage.
///
/// Returns false when the stored record is already at the same or a later
/// stage; in that case nothing is written.
pub fn put_review(conn: &Connection, t: &TableNames, record: &ReviewRecord) -> Result<bool> {
    let json = serde_json::to_string(record).context("Failed to serialize review record")?;
    let sql = format!(
        "INSERT INTO {reviews}
            (review_key, author_id, product_id, stage, stage_rank,
             has_profanity, sentiment_label, record_json, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))
         ON CONFLICT(review_key) DO UPDATE SET
            stage = excluded.stage,
            stage_rank = excluded.stage_rank,
            has_profanity = excluded.has_profanity,
            sentiment_label = excluded.sentiment_label,
            record_json = excluded.record_json,
            updated_at = datetime('now')
         WHERE excluded.stage_rank > {reviews}.stage_rank",
        reviews = t.reviews_sql()
    );

    let changed = conn.execute(
        &sql,
        params![
            record.key.storage_key(),
            record.key.author_id,
            record.key.product_id,
            record.stage.as_str(),
            record.stage.rank(),
            record.has_profanity(),
            record.sentiment.as_ref().map(|s| s.label.as_str()),
            json,
        ],
    )?;
    Ok(changed > 0)
}

/// All review records, ordered by key.
pub fn list_reviews(conn: &Connection, t: &TableNames) -> Result<Vec<ReviewRecord>> {
    let sql = format!(
        "SELECT review_key, record_json FROM {} ORDER BY review_key",
        t.reviews_sql()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut records = Vec::new();
    for row in rows {
        let (key, json) = row?;
        let record = serde_json::from_str(&json)
            .with_context(|| format!("Corrupt review record for {key}"))?;
        records.push(record);
    }
    Ok(records)
}

/// Number of review records at each stage (stages with no records omitted).
pub fn stage_counts(conn: &Connection, t: &TableNames) -> Result<Vec<(Stage, u64)>> {
    let sql = format!(
        "SELECT stage, COUNT(*) FROM {} GROUP BY stage, stage_rank ORDER BY stage_rank",
        t.reviews_sql()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = Vec::new();
    for row in rows {
        let (name, count) = row?;
        let stage = Stage::parse(&name)
            .with_context(|| format!("Unknown stage {name:?} in review table"))?;
        counts.push((stage, count as u64));
    }
    Ok(counts)
}

// --- Users ---

pub fn get_user(conn: &Connection, t: &TableNames, author_id: &str) -> Result<Option<UserRecord>> {
    let sql = format!(
        "SELECT author_id, violation_count, banned, banned_at, last_violation_at
         FROM {} WHERE author_id = ?1",
        t.users_sql()
    );
    let raw = conn
        .query_row(&sql, params![author_id], raw_user_row)
        .optional()?;
    raw.map(RawUser::into_record).transpose()
}

/// All users, most violations first.
pub fn list_users(conn: &Connection, t: &TableNames) -> Result<Vec<UserRecord>> {
    let sql = format!(
        "SELECT author_id, violation_count, banned, banned_at, last_violation_at
         FROM {} ORDER BY violation_count DESC, author_id",
        t.users_sql()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], raw_user_row)?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row?.into_record()?);
    }
    Ok(users)
}

/// Whether this review's violation has already been added to its author's count.
#[cfg(test)]
pub fn is_counted(conn: &Connection, t: &TableNames, key: &ReviewKey) -> Result<bool> {
    let sql = format!(
        "SELECT COUNT(*) > 0 FROM {} WHERE review_key = ?1",
        t.markers_sql()
    );
    let counted: bool = conn.query_row(&sql, params![key.storage_key()], |row| row.get(0))?;
    Ok(counted)
}

/// Conditionally write `next` for one counted review.
///
/// In a single transaction: bail out if `key` is already marked; otherwise
/// write `next` only if the stored count still equals `expected_count`
/// (`None` = no row yet), then mark `key`. Either both writes land or
/// neither does.
///
/// The transaction takes the write lock up front, so writers in other
/// processes queue on the busy timeout instead of failing to upgrade a read.
pub fn apply_violation(
    conn: &mut Connection,
    t: &TableNames,
    key: &ReviewKey,
    expected_count: Option<u32>,
    next: &UserRecord,
) -> Result<ViolationWrite> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .context("Failed to begin violation transaction")?;

    let marked: bool = tx.query_row(
        &format!("SELECT COUNT(*) > 0 FROM {} WHERE review_key = ?1", t.markers_sql()),
        params![key.storage_key()],
        |row| row.get(0),
    )?;
    if marked {
        return Ok(ViolationWrite::AlreadyCounted);
    }

    let banned_at = next.banned_at.map(|ts| ts.to_rfc3339());
    let last_violation_at = next.last_violation_at.map(|ts| ts.to_rfc3339());
    let counted_at = Utc::now().to_rfc3339();

    let changed = match expected_count {
        None => tx.execute(
            &format!(
                "INSERT INTO {} (author_id, violation_count, banned, banned_at, last_violation_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(author_id) DO NOTHING",
                t.users_sql()
            ),
            params![
                next.author_id,
                next.violation_count,
                next.banned,
                banned_at,
                last_violation_at
            ],
        )?,
        Some(expected) => tx.execute(
            &format!(
                "UPDATE {} SET violation_count = ?2, banned = ?3, banned_at = ?4, last_violation_at = ?5
                 WHERE author_id = ?1 AND violation_count = ?6",
                t.users_sql()
            ),
            params![
                next.author_id,
                next.violation_count,
                next.banned,
                banned_at,
                last_violation_at,
                expected
            ],
        )?,
    };

    if changed == 0 {
        // Dropping the transaction rolls it back; nothing was written anyway.
        return Ok(ViolationWrite::Conflict);
    }

    tx.execute(
        &format!(
            "INSERT INTO {} (review_key, author_id, counted_at) VALUES (?1, ?2, ?3)",
            t.markers_sql()
        ),
        params![key.storage_key(), next.author_id, counted_at],
    )?;

    tx.commit().context("Failed to commit violation transaction")?;
    Ok(ViolationWrite::Applied)
}

// --- Row mapping ---

struct RawUser {
    author_id: String,
    violation_count: u32,
    banned: bool,
    banned_at: Option<String>,
    last_violation_at: Option<String>,
}

fn raw_user_row(row: &Row<'_>) -> rusqlite::Result<RawUser> {
    Ok(RawUser {
        author_id: row.get(0)?,
        violation_count: row.get(1)?,
        banned: row.get(2)?,
        banned_at: row.get(3)?,
        last_violation_at: row.get(4)?,
    })
}

impl RawUser {
    fn into_record(self) -> Result<UserRecord> {
        Ok(UserRecord {
            banned_at: self.banned_at.as_deref().map(parse_timestamp).transpose()?,
            last_violation_at: self
                .last_violation_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            author_id: self.author_id,
            violation_count: self.violation_count,
            banned: self.banned,
        })
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid timestamp in users table: {s:?}"))?;
    Ok(parsed.with_timezone(&Utc))
}
