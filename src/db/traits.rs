// Record store trait — backend-agnostic async interface for review and user
// state.
//
// Implementor: SqliteRecordStore (rusqlite behind a tokio Mutex). Methods are
// async so a natively async backend fits behind the same interface. The
// pipeline only ever holds an `Arc<dyn RecordStore>`.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{ReviewRecord, Stage, UserRecord, ViolationWrite};
use crate::review::ReviewKey;

#[async_trait]
pub trait RecordStore: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Review records ---

    /// Load the checkpoint for a review key.
    async fn get_review(&self, key: &ReviewKey) -> Result<Option<ReviewRecord>>;

    /// Store a checkpoint if it is further along than what's stored.
    /// Returns false when the write was skipped.
    async fn put_review(&self, record: &ReviewRecord) -> Result<bool>;

    /// Every stored review record.
    async fn list_reviews(&self) -> Result<Vec<ReviewRecord>>;

    /// Number of records at each stage.
    async fn stage_counts(&self) -> Result<Vec<(Stage, u64)>>;

    // --- Users ---

    async fn get_user(&self, author_id: &str) -> Result<Option<UserRecord>>;

    /// All users, most violations first.
    async fn list_users(&self) -> Result<Vec<UserRecord>>;

    /// Compare-and-set the author's record and mark `key` as counted, atomically.
    /// `expected_count` is the count the caller read (`None` = no record).
    async fn apply_violation(
        &self,
        key: &ReviewKey,
        expected_count: Option<u32>,
        next: &UserRecord,
    ) -> Result<ViolationWrite>;
}
