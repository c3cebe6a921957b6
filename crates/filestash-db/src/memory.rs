//! In-memory repository implementations
//!
//! These back tests and the development setup without a database. They follow the
//! same visibility, ordering and paging rules as the PostgreSQL repositories.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use filestash_core::models::{FileQuery, FileRecord, Page, SortField, SortOrder, Tag};
use filestash_core::AppError;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repository_traits::{FileRepository, TagRepository};

#[derive(Clone, Default)]
pub struct InMemoryFileRepository {
    records: Arc<RwLock<HashMap<Uuid, FileRecord>>>,
}

impl InMemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn compare(a: &FileRecord, b: &FileRecord, field: SortField, order: SortOrder) -> Ordering {
    let primary = match field {
        SortField::UploadDate => a.upload_date.cmp(&b.upload_date),
        SortField::Filename => a.filename.cmp(&b.filename),
        SortField::FileSize => a.file_size.cmp(&b.file_size),
    };
    let primary = match order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl FileRepository for InMemoryFileRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn save(&self, record: &FileRecord) -> Result<FileRecord, AppError> {
        self.records
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(record.clone())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.records.write().await.remove(&id).is_some())
    }

    async fn exists_by_owner_and_filename_or_hash(
        &self,
        owner_id: &str,
        filename: &str,
        content_hash: &str,
    ) -> Result<bool, AppError> {
        Ok(self.records.read().await.values().any(|r| {
            r.owner_id == owner_id && (r.filename == filename || r.content_hash == content_hash)
        }))
    }

    async fn exists_by_owner_and_filename(
        &self,
        owner_id: &str,
        filename: &str,
    ) -> Result<bool, AppError> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .any(|r| r.owner_id == owner_id && r.filename == filename))
    }

    async fn find_page(&self, query: &FileQuery) -> Result<Page<FileRecord>, AppError> {
        let records = self.records.read().await;
        let mut visible: Vec<&FileRecord> = records
            .values()
            .filter(|r| r.is_visible_to(&query.caller_id))
            .filter(|r| query.tag.as_deref().map_or(true, |tag| r.has_tag(tag)))
            .collect();

        visible.sort_by(|a, b| compare(a, b, query.sort_field, query.sort_order));

        let total = visible.len() as i64;
        let items = visible
            .into_iter()
            .skip(query.page.offset() as usize)
            .take(query.page.size() as usize)
            .cloned()
            .collect();

        Ok(Page::new(items, query.page, total))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryTagRepository {
    tags: Arc<RwLock<BTreeMap<String, Tag>>>,
}

impl InMemoryTagRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-populated with `names`, which must already be normalized
    pub fn with_tags<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags = names
            .into_iter()
            .map(|n| {
                let tag = Tag::new(n);
                (tag.name.clone(), tag)
            })
            .collect();
        Self {
            tags: Arc::new(RwLock::new(tags)),
        }
    }
}

#[async_trait]
impl TagRepository for InMemoryTagRepository {
    async fn exists(&self, name: &str) -> Result<bool, AppError> {
        Ok(self.tags.read().await.contains_key(name))
    }

    async fn exists_all(&self, names: &BTreeSet<String>) -> Result<bool, AppError> {
        let tags = self.tags.read().await;
        Ok(names.iter().all(|n| tags.contains_key(n)))
    }

    async fn list(&self) -> Result<Vec<Tag>, AppError> {
        Ok(self.tags.read().await.values().cloned().collect())
    }

    async fn create(&self, name: &str) -> Result<Tag, AppError> {
        let mut tags = self.tags.write().await;
        if tags.contains_key(name) {
            return Err(AppError::TagAlreadyExists(name.to_string()));
        }
        let tag = Tag::new(name);
        tags.insert(name.to_string(), tag.clone());
        Ok(tag)
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool, AppError> {
        Ok(self.tags.write().await.remove(name).is_some())
    }
}
