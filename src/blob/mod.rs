// Blob store — where the raw review and each stage's artifact are kept.
//
// Objects are addressed by (bucket, key). Keys may contain `/` to group
// artifacts by stage (`raw/`, `normalized/`, ...). Writes replace whole
// objects; there is no partial update.

pub mod fs;
pub mod memory;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store an object, replacing any existing one at the same key.
    async fn put(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// Fetch an object. `Ok(None)` means it doesn't exist.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>>;
}

/// Serialize `value` as pretty JSON and store it.
pub async fn put_json<T: Serialize + Sync>(
    store: &dyn BlobStore,
    bucket: &str,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)
        .with_context(|| format!("Failed to serialize {bucket}/{key}"))?;
    store.put(bucket, key, bytes).await
}

/// Fetch and deserialize a JSON object.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn BlobStore,
    bucket: &str,
    key: &str,
) -> Result<Option<T>> {
    match store.get(bucket, key).await? {
        Some(bytes) => {
            let value = serde_json::from_slice(&bytes)
                .with_context(|| format!("Corrupt JSON object at {bucket}/{key}"))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Reject keys that could escape their bucket when mapped onto a filesystem.
pub(crate) fn validate_key(bucket: &str, key: &str) -> Result<()> {
    if bucket.is_empty() || bucket.contains('/') || bucket == "." || bucket == ".." {
        anyhow::bail!("Invalid bucket name: {bucket:?}");
    }
    if key.is_empty() || key.starts_with('/') {
        anyhow::bail!("Invalid object key: {key:?}");
    }
    if key.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
        anyhow::bail!("Invalid object key: {key:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("reviews", "raw/U1_P1.json").is_ok());
        assert!(validate_key("reviews", "../etc/passwd").is_err());
        assert!(validate_key("reviews", "/abs").is_err());
        assert!(validate_key("reviews", "a//b").is_err());
        assert!(validate_key("", "k").is_err());
        assert!(validate_key("a/b", "k").is_err());
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let store = MemoryBlobStore::new();
        put_json(&store, "b", "k.json", &vec![1, 2, 3]).await.unwrap();
        let back: Option<Vec<i32>> = get_json(&store, "b", "k.json").await.unwrap();
        assert_eq!(back, Some(vec![1, 2, 3]));

        let missing: Option<Vec<i32>> = get_json(&store, "b", "nope.json").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_get_json_rejects_corrupt_object() {
        let store = MemoryBlobStore::new();
        store.put("b", "k.json", b"{not json".to_vec()).await.unwrap();
        let result: Result<Option<Vec<i32>>> = get_json(&store, "b", "k.json").await;
        assert!(result.is_err());
    }
}
