//! File repository double whose saves can be made to fail

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use filestash_core::models::{FileQuery, FileRecord, Page};
use filestash_core::AppError;
use filestash_db::{FileRepository, InMemoryFileRepository};
use uuid::Uuid;

#[derive(Default)]
pub struct FlakyFileRepository {
    inner: InMemoryFileRepository,
    fail_save: AtomicBool,
}

impl FlakyFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.is_empty().await
    }
}

#[async_trait]
impl FileRepository for FlakyFileRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        self.inner.find_by_id(id).await
    }

    async fn save(&self, record: &FileRecord) -> Result<FileRecord, AppError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(AppError::Internal("injected save failure".to_string()));
        }
        self.inner.save(record).await
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        self.inner.delete_by_id(id).await
    }

    async fn exists_by_owner_and_filename_or_hash(
        &self,
        owner_id: &str,
        filename: &str,
        content_hash: &str,
    ) -> Result<bool, AppError> {
        self.inner
            .exists_by_owner_and_filename_or_hash(owner_id, filename, content_hash)
            .await
    }

    async fn exists_by_owner_and_filename(
        &self,
        owner_id: &str,
        filename: &str,
    ) -> Result<bool, AppError> {
        self.inner
            .exists_by_owner_and_filename(owner_id, filename)
            .await
    }

    async fn find_page(&self, query: &FileQuery) -> Result<Page<FileRecord>, AppError> {
        self.inner.find_page(query).await
    }
}
