use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata record for one stored file
///
/// `id` is assigned when the upload is accepted, before the record is persisted, so
/// that its progress can be tracked. `tags` holds normalized names in sorted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct FileRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub filename: String,
    pub content_hash: String,
    pub content_type: String,
    pub file_size: i64,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub upload_date: DateTime<Utc>,
    pub download_url: String,
}

impl FileRecord {
    pub fn is_owned_by(&self, caller_id: &str) -> bool {
        self.owner_id == caller_id
    }

    pub fn is_visible_to(&self, caller_id: &str) -> bool {
        self.is_public || self.is_owned_by(caller_id)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// File representation returned to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResponse {
    pub id: Uuid,
    pub filename: String,
    pub tags: Vec<String>,
    pub content_type: String,
    pub file_size: i64,
    pub upload_date: DateTime<Utc>,
    pub download_url: String,
    pub is_public: bool,
}

impl From<FileRecord> for FileResponse {
    fn from(record: FileRecord) -> Self {
        FileResponse {
            id: record.id,
            filename: record.filename,
            tags: record.tags,
            content_type: record.content_type,
            file_size: record.file_size,
            upload_date: record.upload_date,
            download_url: record.download_url,
            is_public: record.is_public,
        }
    }
}
