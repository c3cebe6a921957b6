//! Storage double that records calls and fails on demand

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use filestash_storage::{MemoryStorage, Storage, StorageBackend, StorageError, StorageResult};

#[derive(Default)]
pub struct FlakyStorage {
    inner: MemoryStorage,
    calls: AtomicUsize,
    fail_put: AtomicBool,
    fail_copy: AtomicBool,
    fail_delete: AtomicBool,
    fail_delete_keys: Mutex<HashSet<String>>,
}

impl FlakyStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mutating or reading calls made so far (`put`, `copy`, `delete`, `exists`)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    pub fn fail_copy(&self, fail: bool) {
        self.fail_copy.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Fail deletes of `key` only
    pub fn fail_delete_of(&self, key: &str) {
        self.fail_delete_keys.lock().unwrap().insert(key.to_string());
    }

    pub async fn has_object(&self, key: &str) -> bool {
        self.inner.object(key).await.is_some()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.inner.keys().await
    }
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed(format!("injected failure for {}", key)));
        }
        self.inner.put(key, data, content_type).await
    }

    async fn copy(&self, from_key: &str, to_key: &str) -> StorageResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_copy.load(Ordering::SeqCst) {
            return Err(StorageError::CopyFailed(format!("injected failure for {}", from_key)));
        }
        self.inner.copy(from_key, to_key).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst)
            || self.fail_delete_keys.lock().unwrap().contains(key)
        {
            return Err(StorageError::DeleteFailed(format!("injected failure for {}", key)));
        }
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.exists(key).await
    }

    fn public_url(&self, key: &str) -> String {
        self.inner.public_url(key)
    }

    fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
