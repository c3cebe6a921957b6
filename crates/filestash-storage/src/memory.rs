//! In-process object store
//!
//! Keeps objects in memory for tests and local development. Contents are lost when the
//! process exits.

use crate::keys::is_safe_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

#[derive(Clone)]
pub struct MemoryStorage {
    bucket: String,
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl MemoryStorage {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Fetch a stored object, if present
    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    /// All keys currently stored, sorted
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn check_key(key: &str) -> StorageResult<()> {
        if !is_safe_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new("filestash")
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String> {
        Self::check_key(key)?;
        let size = data.len();
        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        tracing::debug!(bucket = %self.bucket, key = %key, size_bytes = size, "Memory put");
        Ok(self.public_url(key))
    }

    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<String> {
        Self::check_key(from_key)?;
        Self::check_key(to_key)?;
        let mut objects = self.objects.write().await;
        let object = objects
            .get(from_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(from_key.to_string()))?;
        objects.insert(to_key.to_string(), object);
        tracing::debug!(bucket = %self.bucket, from_key = %from_key, to_key = %to_key, "Memory copy");
        Ok(self.public_url(to_key))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        Self::check_key(key)?;
        self.objects.write().await.remove(key);
        tracing::debug!(bucket = %self.bucket, key = %key, "Memory delete");
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Self::check_key(key)?;
        Ok(self.objects.read().await.contains_key(key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("memory://{}/{}", self.bucket, key)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_copy_delete() {
        let storage = MemoryStorage::new("files");

        let url = storage
            .put("alice/a.txt", Bytes::from_static(b"abc"), "text/plain")
            .await
            .unwrap();
        assert_eq!(url, "memory://files/alice/a.txt");

        storage.copy("alice/a.txt", "alice/b.txt").await.unwrap();
        storage.delete("alice/a.txt").await.unwrap();

        assert_eq!(storage.keys().await, vec!["alice/b.txt".to_string()]);
        let moved = storage.object("alice/b.txt").await.unwrap();
        assert_eq!(moved.data, Bytes::from_static(b"abc"));
        assert_eq!(moved.content_type, "text/plain");
    }

    #[tokio::test]
    async fn copy_missing_is_not_found() {
        let storage = MemoryStorage::default();
        let result = storage.copy("x/none", "x/other").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
        assert!(storage.delete("x/none").await.is_ok());
    }
}
