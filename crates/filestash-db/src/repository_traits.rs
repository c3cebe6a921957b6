//! Repository trait abstractions
//!
//! The orchestration layer depends only on these traits, so it can run against
//! PostgreSQL in production and the in-memory implementations in tests.

use std::collections::BTreeSet;

use async_trait::async_trait;
use filestash_core::models::{FileQuery, FileRecord, Page, Tag};
use filestash_core::AppError;
use uuid::Uuid;

/// File metadata store
#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError>;

    /// Insert the record, or replace the one with the same id
    async fn save(&self, record: &FileRecord) -> Result<FileRecord, AppError>;

    /// Remove a record. Returns whether one existed.
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError>;

    /// Whether `owner_id` already has a file named `filename` or with content `content_hash`
    async fn exists_by_owner_and_filename_or_hash(
        &self,
        owner_id: &str,
        filename: &str,
        content_hash: &str,
    ) -> Result<bool, AppError>;

    /// Whether `owner_id` already has a file named `filename`
    async fn exists_by_owner_and_filename(
        &self,
        owner_id: &str,
        filename: &str,
    ) -> Result<bool, AppError>;

    /// One page of records visible to `query.caller_id`, optionally restricted to a tag
    async fn find_page(&self, query: &FileQuery) -> Result<Page<FileRecord>, AppError>;
}

/// Tag vocabulary store. All names passed in are already normalized.
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn exists(&self, name: &str) -> Result<bool, AppError>;

    /// Whether every name in `names` is registered. An empty set trivially is.
    async fn exists_all(&self, names: &BTreeSet<String>) -> Result<bool, AppError>;

    async fn list(&self) -> Result<Vec<Tag>, AppError>;

    /// Register a name. Fails with `TagAlreadyExists` if it is taken.
    async fn create(&self, name: &str) -> Result<Tag, AppError>;

    /// Remove a name. Returns whether it existed.
    async fn delete_by_name(&self, name: &str) -> Result<bool, AppError>;
}
