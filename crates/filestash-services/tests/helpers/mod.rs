//! Test helpers: services wired over in-memory stores.
//!
//! Run with `cargo test -p filestash-services`. No database or object store is needed.

#![allow(dead_code)]

pub mod repository;
pub mod storage;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use filestash_core::models::UploadStatus;
use filestash_core::Config;
use filestash_db::{InMemoryFileRepository, InMemoryTagRepository};
use filestash_services::{Services, UploadRequest};
use uuid::Uuid;

pub use repository::FlakyFileRepository;
pub use storage::FlakyStorage;

/// Tags registered in every test vocabulary
pub const TEST_TAGS: [&str; 4] = ["go", "java", "rust", "docker"];

pub struct TestApp {
    pub services: Services,
    pub storage: Arc<FlakyStorage>,
    pub files: Arc<InMemoryFileRepository>,
    pub tags: Arc<InMemoryTagRepository>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// Build with extra configuration variables on top of the test defaults.
    pub fn with_env(extra: &[(&str, &str)]) -> Self {
        let config = test_config(extra);
        let storage = Arc::new(FlakyStorage::new());
        let files = Arc::new(InMemoryFileRepository::new());
        let tags = Arc::new(InMemoryTagRepository::with_tags(TEST_TAGS));

        let services = Services::assemble(&config, storage.clone(), files.clone(), tags.clone());

        Self {
            services,
            storage,
            files,
            tags,
        }
    }

    /// Poll the status of `id` until it leaves `in_progress`, or give up after ~2s.
    pub async fn wait_for_upload(&self, id: Uuid) -> UploadStatus {
        for _ in 0..400 {
            let status = self.services.files.get_status(id).await;
            if status != UploadStatus::InProgress {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.services.files.get_status(id).await
    }
}

pub fn test_config(extra: &[(&str, &str)]) -> Config {
    let mut pairs: Vec<(String, String)> = vec![
        ("DATABASE_URL".into(), "postgres://localhost/filestash_test".into()),
        ("STORAGE_BACKEND".into(), "memory".into()),
        ("UPLOAD_STATUS_REAP_INTERVAL_SECS".into(), "0".into()),
    ];
    for (k, v) in extra {
        pairs.retain(|(key, _)| key != k);
        pairs.push((k.to_string(), v.to_string()));
    }

    Config::from_lookup(move |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .expect("test configuration is valid")
}

pub fn upload_request(owner: &str, filename: &str, data: &str, tags: &[&str]) -> UploadRequest {
    UploadRequest {
        owner_id: owner.to_string(),
        data: Bytes::from(data.to_string()),
        filename: filename.to_string(),
        content_type: "text/plain".to_string(),
        is_public: false,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}
