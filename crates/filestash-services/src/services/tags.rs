//! Tag vocabulary management

use std::sync::Arc;

use filestash_core::models::Tag;
use filestash_core::validation::normalize_tag_name;
use filestash_core::AppError;
use filestash_db::TagRepository;

#[derive(Clone)]
pub struct TagService {
    tags: Arc<dyn TagRepository>,
}

impl TagService {
    pub fn new(tags: Arc<dyn TagRepository>) -> Self {
        Self { tags }
    }

    pub async fn list(&self) -> Result<Vec<Tag>, AppError> {
        self.tags.list().await
    }

    /// Register a tag under its normalized name.
    pub async fn create(&self, name: &str) -> Result<Tag, AppError> {
        let name = normalize_tag_name(name);
        if name.is_empty() {
            return Err(AppError::EmptyTag);
        }

        let tag = self.tags.create(&name).await?;
        tracing::info!(tag = %tag.name, "Tag created");
        Ok(tag)
    }

    /// Remove a tag. Removing an unknown tag succeeds. Files already carrying it keep it.
    pub async fn delete(&self, name: &str) -> Result<(), AppError> {
        let name = normalize_tag_name(name);
        if name.is_empty() {
            return Err(AppError::EmptyTag);
        }

        if self.tags.delete_by_name(&name).await? {
            tracing::info!(tag = %name, "Tag deleted");
        } else {
            tracing::debug!(tag = %name, "Tag to delete was not registered");
        }
        Ok(())
    }

    pub async fn exists(&self, name: &str) -> Result<bool, AppError> {
        let name = normalize_tag_name(name);
        if name.is_empty() {
            return Ok(false);
        }
        self.tags.exists(&name).await
    }
}
