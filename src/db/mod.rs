// Database layer — SQLite storage for review checkpoints and author state.
//
// We use rusqlite with the "bundled" feature so there's no system SQLite
// dependency. The database file lives wherever GAVEL_DB_PATH points
// (defaults to ./gavel.db).

pub mod models;
pub mod queries;
pub mod schema;
pub mod sqlite;
pub mod traits;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub use models::{ReviewRecord, Stage, UserRecord, ViolationWrite, BAN_THRESHOLD};
pub use schema::TableNames;
pub use sqlite::SqliteRecordStore;
pub use traits::RecordStore;

/// How long a writer waits on a locked database file before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the database and create tables.
///
/// Called by `gavel init`.
pub fn initialize(db_path: &str, tables: &TableNames) -> Result<Connection> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;
    configure(&conn)?;

    schema::create_tables(&conn, tables)?;

    Ok(conn)
}

/// Open an existing database (fails if it doesn't exist yet).
pub fn open(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        anyhow::bail!("Database not found at {}. Run `gavel init` first.", db_path);
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;
    configure(&conn)?;

    Ok(conn)
}

/// Open an existing database as a shared record store.
///
/// Tables are created if missing, so pointing at a different set of
/// configured table names in the same file works without re-running init.
pub fn open_store(db_path: &str, tables: &TableNames) -> Result<Arc<dyn RecordStore>> {
    let conn = open(db_path)?;
    schema::create_tables(&conn, tables)?;
    Ok(Arc::new(SqliteRecordStore::new(conn, tables.clone())))
}

fn configure(conn: &Connection) -> Result<()> {
    // WAL lets readers (status, report) run while a batch is writing
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .context("Failed to set busy timeout")?;
    Ok(())
}
