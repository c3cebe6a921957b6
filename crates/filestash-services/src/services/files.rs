//! File orchestration: upload, rename, delete and listing
//!
//! Uploads are validated inline (content, tag count, dedup, tag vocabulary) and then
//! handed to the upload worker pool, which writes the object and persists metadata.
//! Callers poll [`FileService::get_status`] with the returned id.
//!
//! Rename refuses a target name the owner already uses (`DuplicateFile`).
//!
//! Partial failures are not rolled back transactionally. Where a second store call
//! fails after the first succeeded, the first is undone best-effort and the failure is
//! logged:
//! - upload: object written, metadata save failed -> object deleted
//! - rename: copy succeeded, old-key delete failed -> new key deleted
//! - rename: objects moved, metadata save failed -> logged only

use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use chrono::Utc;
use filestash_core::constants::DEFAULT_CONTENT_TYPE;
use filestash_core::hashing::hash_reader;
use filestash_core::models::{
    FileQuery, FileRecord, FileResponse, Page, PageRequest, SortField, SortOrder, UploadStatus,
};
use filestash_core::validation::{normalize_tag_filter, sanitize_filename};
use filestash_core::AppError;
use filestash_db::FileRepository;
use filestash_storage::{file_key, Storage};
use filestash_worker::{UploadStatusRegistry, UploadWorkerPool};
use futures::FutureExt;
use uuid::Uuid;

use super::tag_validator::TagValidator;

/// An upload as received from the caller
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub owner_id: String,
    pub data: Bytes,
    pub filename: String,
    pub content_type: String,
    pub is_public: bool,
    pub tags: Vec<String>,
}

/// Listing parameters in their raw, caller-supplied form
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub caller_id: String,
    pub tag: Option<String>,
    pub page: i64,
    pub size: i64,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
}

/// An upload that passed every check and is ready to be stored
struct AcceptedUpload {
    record: FileRecord,
    data: Bytes,
}

#[derive(Clone)]
pub struct FileService {
    storage: Arc<dyn Storage>,
    files: Arc<dyn FileRepository>,
    tag_validator: TagValidator,
    statuses: Arc<UploadStatusRegistry>,
    workers: UploadWorkerPool,
}

impl FileService {
    pub fn new(
        storage: Arc<dyn Storage>,
        files: Arc<dyn FileRepository>,
        tag_validator: TagValidator,
        statuses: Arc<UploadStatusRegistry>,
        workers: UploadWorkerPool,
    ) -> Self {
        Self {
            storage,
            files,
            tag_validator,
            statuses,
            workers,
        }
    }

    /// Accept an upload and store it in the background. Returns the new file id.
    pub async fn upload(&self, request: UploadRequest) -> Result<Uuid, AppError> {
        let accepted = self.accept(request).await?;
        let file_id = accepted.record.id;

        // Registered before submission so a fast job cannot be overwritten by it.
        self.statuses.mark_in_progress(file_id).await;

        let storage = self.storage.clone();
        let files = self.files.clone();
        let job = async move { store(storage, files, accepted).await.map(|_| ()) }.boxed();

        if let Err(e) = self.workers.submit(file_id, job).await {
            tracing::error!(file_id = %file_id, error = %e, "Failed to queue upload");
            self.statuses.mark_failed(file_id).await;
            return Err(AppError::UploadFailed(e.into()));
        }

        tracing::info!(file_id = %file_id, "Upload accepted");
        Ok(file_id)
    }

    /// Accept and store an upload inline, returning the persisted record.
    pub async fn upload_and_wait(&self, request: UploadRequest) -> Result<FileRecord, AppError> {
        let accepted = self.accept(request).await?;
        let file_id = accepted.record.id;

        let record = store(self.storage.clone(), self.files.clone(), accepted)
            .await
            .map_err(|e| {
                tracing::error!(file_id = %file_id, error = %e, "Upload failed");
                AppError::UploadFailed(e)
            })?;

        tracing::info!(file_id = %file_id, "Upload completed");
        Ok(record)
    }

    /// Progress of a background upload. Unknown and evicted ids are `NotFound`.
    pub async fn get_status(&self, file_id: Uuid) -> UploadStatus {
        self.statuses.get(file_id).await
    }

    pub async fn get(&self, file_id: Uuid) -> Result<Option<FileRecord>, AppError> {
        self.files.find_by_id(file_id).await
    }

    pub async fn rename(
        &self,
        file_id: Uuid,
        new_filename: &str,
        caller_id: &str,
    ) -> Result<FileRecord, AppError> {
        let record = self
            .files
            .find_by_id(file_id)
            .await?
            .ok_or(AppError::FileNotFound(file_id))?;

        if !record.is_owned_by(caller_id) {
            return Err(AppError::NotOwner);
        }

        let filename = sanitize_filename(new_filename);
        if filename.is_empty() {
            return Err(AppError::EmptyFilename);
        }

        if filename == record.filename {
            tracing::debug!(file_id = %file_id, "Rename to current filename, nothing to do");
            return Ok(record);
        }

        if self
            .files
            .exists_by_owner_and_filename(&record.owner_id, &filename)
            .await?
        {
            tracing::debug!(file_id = %file_id, filename = %filename, "Rename target already taken");
            return Err(AppError::DuplicateFile);
        }

        let old_key = file_key(&record.owner_id, &record.filename);
        let new_key = file_key(&record.owner_id, &filename);

        let download_url = self
            .storage
            .copy(&old_key, &new_key)
            .await
            .map_err(|e| {
                tracing::error!(file_id = %file_id, from = %old_key, to = %new_key, error = %e, "Failed to copy object");
                AppError::RenameFailed(e.into())
            })?;

        if let Err(e) = self.storage.delete(&old_key).await {
            tracing::error!(file_id = %file_id, key = %old_key, error = %e, "Failed to delete old object");
            if let Err(cleanup) = self.storage.delete(&new_key).await {
                tracing::error!(
                    file_id = %file_id,
                    key = %new_key,
                    error = %cleanup,
                    "Failed to remove copied object, both keys now exist"
                );
            }
            return Err(AppError::RenameFailed(e.into()));
        }

        let mut renamed = record;
        renamed.filename = filename;
        renamed.download_url = download_url;

        let saved = self.files.save(&renamed).await.map_err(|e| {
            tracing::error!(
                file_id = %file_id,
                key = %new_key,
                error = %e,
                "Object moved but metadata update failed"
            );
            AppError::RenameFailed(e.into())
        })?;

        tracing::info!(file_id = %file_id, key = %new_key, "File renamed");
        Ok(saved)
    }

    /// Delete a file. Deleting an unknown id succeeds without touching either store.
    pub async fn delete(&self, file_id: Uuid, caller_id: &str) -> Result<(), AppError> {
        let Some(record) = self.files.find_by_id(file_id).await? else {
            tracing::debug!(file_id = %file_id, "File to delete does not exist");
            return Ok(());
        };

        if !record.is_owned_by(caller_id) {
            return Err(AppError::NotOwner);
        }

        let key = file_key(&record.owner_id, &record.filename);
        self.storage.delete(&key).await.map_err(|e| {
            tracing::error!(file_id = %file_id, key = %key, error = %e, "Failed to delete object");
            AppError::DeleteFailed(e.into())
        })?;

        self.files
            .delete_by_id(file_id)
            .await
            .map_err(|e| AppError::DeleteFailed(e.into()))?;

        tracing::info!(file_id = %file_id, key = %key, "File deleted");
        Ok(())
    }

    /// One page of files visible to the caller
    pub async fn list(&self, request: ListRequest) -> Result<Page<FileResponse>, AppError> {
        let sort_field = match request.sort_field.as_deref() {
            Some(s) => s.parse::<SortField>()?,
            None => SortField::default(),
        };
        let sort_order = match request.sort_order.as_deref() {
            Some(s) => s.parse::<SortOrder>()?,
            None => SortOrder::default(),
        };

        let query = FileQuery {
            caller_id: request.caller_id,
            tag: normalize_tag_filter(request.tag.as_deref()),
            page: PageRequest::new(request.page, request.size),
            sort_field,
            sort_order,
        };

        let page = self.files.find_page(&query).await?;
        Ok(page.map(FileResponse::from))
    }

    async fn accept(&self, request: UploadRequest) -> Result<AcceptedUpload, AppError> {
        if request.data.is_empty() {
            return Err(AppError::EmptyInput);
        }

        self.tag_validator.validate_count(&request.tags)?;

        let filename = sanitize_filename(&request.filename);
        if filename.is_empty() {
            return Err(AppError::EmptyFilename);
        }

        let content_hash = hash_reader(&request.data[..]).await?;

        if self
            .files
            .exists_by_owner_and_filename_or_hash(&request.owner_id, &filename, &content_hash)
            .await?
        {
            tracing::debug!(owner_id = %request.owner_id, filename = %filename, "Duplicate upload rejected");
            return Err(AppError::DuplicateFile);
        }

        let tags = self.tag_validator.normalize(&request.tags);
        if !self.tag_validator.all_exist(&tags).await? {
            return Err(AppError::TagsNotAllowed(tags));
        }

        let content_type = if request.content_type.trim().is_empty() {
            DEFAULT_CONTENT_TYPE.to_string()
        } else {
            request.content_type
        };

        let record = FileRecord {
            id: Uuid::new_v4(),
            owner_id: request.owner_id,
            filename,
            content_hash,
            content_type,
            file_size: request.data.len() as i64,
            is_public: request.is_public,
            tags: tags.into_iter().collect(),
            upload_date: Utc::now(),
            download_url: String::new(),
        };

        Ok(AcceptedUpload {
            record,
            data: request.data,
        })
    }
}

/// Write the object, then persist its metadata.
async fn store(
    storage: Arc<dyn Storage>,
    files: Arc<dyn FileRepository>,
    upload: AcceptedUpload,
) -> anyhow::Result<FileRecord> {
    let AcceptedUpload { mut record, data } = upload;
    let key = file_key(&record.owner_id, &record.filename);
    let start = std::time::Instant::now();

    record.download_url = storage
        .put(&key, data, &record.content_type)
        .await
        .with_context(|| format!("failed to write object {}", key))?;

    match files.save(&record).await {
        Ok(saved) => {
            tracing::info!(
                file_id = %saved.id,
                key = %key,
                bucket = %storage.bucket(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "File stored"
            );
            Ok(saved)
        }
        Err(e) => {
            if let Err(cleanup) = storage.delete(&key).await {
                tracing::error!(
                    file_id = %record.id,
                    key = %key,
                    error = %cleanup,
                    "Failed to remove object after metadata save failure"
                );
            }
            Err(anyhow::Error::new(e).context("failed to save file metadata"))
        }
    }
}
