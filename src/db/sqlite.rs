// SqliteRecordStore — rusqlite backend implementing the RecordStore trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{ReviewRecord, Stage, UserRecord, ViolationWrite};
use super::queries;
use super::schema::TableNames;
use super::traits::RecordStore;
use crate::review::ReviewKey;

pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
    tables: TableNames,
}

impl SqliteRecordStore {
    /// Wrap an already-opened rusqlite Connection whose tables exist.
    pub fn new(conn: Connection, tables: TableNames) -> Self {
        Self {
            conn: Mutex::new(conn),
            tables,
        }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn get_review(&self, key: &ReviewKey) -> Result<Option<ReviewRecord>> {
        let conn = self.conn.lock().await;
        queries::get_review(&conn, &self.tables, key)
    }

    async fn put_review(&self, record: &ReviewRecord) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::put_review(&conn, &self.tables, record)
    }

    async fn list_reviews(&self) -> Result<Vec<ReviewRecord>> {
        let conn = self.conn.lock().await;
        queries::list_reviews(&conn, &self.tables)
    }

    async fn stage_counts(&self) -> Result<Vec<(Stage, u64)>> {
        let conn = self.conn.lock().await;
        queries::stage_counts(&conn, &self.tables)
    }

    async fn get_user(&self, author_id: &str) -> Result<Option<UserRecord>> {
        let conn = self.conn.lock().await;
        queries::get_user(&conn, &self.tables, author_id)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let conn = self.conn.lock().await;
        queries::list_users(&conn, &self.tables)
    }

    async fn apply_violation(
        &self,
        key: &ReviewKey,
        expected_count: Option<u32>,
        next: &UserRecord,
    ) -> Result<ViolationWrite> {
        let mut conn = self.conn.lock().await;
        queries::apply_violation(&mut conn, &self.tables, key, expected_count, next)
    }
}
