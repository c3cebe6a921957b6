//! Error types module
//!
//! All service-level failures are unified under the `AppError` enum. Each variant
//! belongs to one [`ErrorKind`], which tells callers whether the request itself was
//! wrong (validation, conflict, authorization, not found) or a backend failed
//! (infrastructure).
//!
//! The `Database` variant wraps `sqlx::Error` only when the `sqlx` feature is enabled.

use std::collections::BTreeSet;
use std::io;

use uuid::Uuid;

use crate::constants::{FILE_DELETE_ERROR, FILE_RENAME_ERROR, FILE_UPLOAD_ERROR};

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors like validation failures
    Debug,
    /// Caller mistakes worth noticing, e.g. ownership violations
    Warn,
    /// Unexpected backend failures
    Error,
}

/// Broad classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    Authorization,
    NotFound,
    Infrastructure,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP-style status code for transports that need one
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "DUPLICATE_FILE")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("File can not be empty")]
    EmptyInput,

    #[error("Too many tags: {count} given, at most {max} allowed")]
    TooManyTags { count: usize, max: usize },

    #[error("One or more tags do not exist in the system: {}", join_tags(.0))]
    TagsNotAllowed(BTreeSet<String>),

    #[error("Filename cannot be empty")]
    EmptyFilename,

    #[error("Tag is empty")]
    EmptyTag,

    #[error("Invalid sort field: {0}")]
    InvalidSortField(String),

    #[error("Invalid sort order: {0}")]
    InvalidSortOrder(String),

    #[error("File already exists")]
    DuplicateFile,

    #[error("Tag already exists: {0}")]
    TagAlreadyExists(String),

    #[error("User is not owner of this file")]
    NotOwner,

    #[error("File not found: {0}")]
    FileNotFound(Uuid),

    #[error("file upload failed")]
    UploadFailed(#[source] anyhow::Error),

    #[error("file rename failed")]
    RenameFailed(#[source] anyhow::Error),

    #[error("file deletion failed")]
    DeleteFailed(#[source] anyhow::Error),

    #[error("Failed to hash content: {0}")]
    Hashing(#[source] io::Error),

    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

fn join_tags(tags: &BTreeSet<String>) -> String {
    tags.iter().cloned().collect::<Vec<_>>().join(", ")
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

/// Static metadata for each variant: (kind, http_status, error_code, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (ErrorKind, u16, &'static str, bool, LogLevel) {
    match err {
        AppError::EmptyInput => (
            ErrorKind::Validation,
            400,
            "EMPTY_INPUT",
            false,
            LogLevel::Debug,
        ),
        AppError::TooManyTags { .. } => (
            ErrorKind::Validation,
            400,
            "TOO_MANY_TAGS",
            false,
            LogLevel::Debug,
        ),
        AppError::TagsNotAllowed(_) => (
            ErrorKind::Validation,
            400,
            "TAGS_NOT_ALLOWED",
            false,
            LogLevel::Debug,
        ),
        AppError::EmptyFilename => (
            ErrorKind::Validation,
            400,
            "EMPTY_FILENAME",
            false,
            LogLevel::Debug,
        ),
        AppError::EmptyTag => (
            ErrorKind::Validation,
            400,
            "EMPTY_TAG",
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidSortField(_) => (
            ErrorKind::Validation,
            400,
            "INVALID_SORT_FIELD",
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidSortOrder(_) => (
            ErrorKind::Validation,
            400,
            "INVALID_SORT_ORDER",
            false,
            LogLevel::Debug,
        ),
        AppError::DuplicateFile => (
            ErrorKind::Conflict,
            409,
            "DUPLICATE_FILE",
            false,
            LogLevel::Debug,
        ),
        AppError::TagAlreadyExists(_) => (
            ErrorKind::Conflict,
            409,
            "TAG_ALREADY_EXISTS",
            false,
            LogLevel::Debug,
        ),
        AppError::NotOwner => (
            ErrorKind::Authorization,
            403,
            "NOT_OWNER",
            false,
            LogLevel::Warn,
        ),
        AppError::FileNotFound(_) => (
            ErrorKind::NotFound,
            404,
            "FILE_NOT_FOUND",
            false,
            LogLevel::Debug,
        ),
        AppError::UploadFailed(_) => (
            ErrorKind::Infrastructure,
            500,
            "UPLOAD_FAILED",
            true,
            LogLevel::Error,
        ),
        AppError::RenameFailed(_) => (
            ErrorKind::Infrastructure,
            500,
            "RENAME_FAILED",
            true,
            LogLevel::Error,
        ),
        AppError::DeleteFailed(_) => (
            ErrorKind::Infrastructure,
            500,
            "DELETE_FAILED",
            true,
            LogLevel::Error,
        ),
        AppError::Hashing(_) => (
            ErrorKind::Infrastructure,
            500,
            "HASHING_ERROR",
            true,
            LogLevel::Error,
        ),
        AppError::Database(_) => (
            ErrorKind::Infrastructure,
            500,
            "DATABASE_ERROR",
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            ErrorKind::Infrastructure,
            500,
            "STORAGE_ERROR",
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            ErrorKind::Infrastructure,
            500,
            "INTERNAL_ERROR",
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Classification of this error
    pub fn kind(&self) -> ErrorKind {
        app_error_static_metadata(self).0
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).1
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::UploadFailed(_) => FILE_UPLOAD_ERROR.to_string(),
            AppError::RenameFailed(_) => FILE_RENAME_ERROR.to_string(),
            AppError::DeleteFailed(_) => FILE_DELETE_ERROR.to_string(),
            AppError::Hashing(_) => "Failed to read file content".to_string(),
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infrastructure_messages_are_stable() {
        let err = AppError::UploadFailed(anyhow::anyhow!("connection reset"));
        assert_eq!(err.to_string(), "file upload failed");
        assert_eq!(err.client_message(), "file upload failed");
        assert!(err.detailed_message().contains("connection reset"));

        let err = AppError::RenameFailed(anyhow::anyhow!("copy failed"));
        assert_eq!(err.to_string(), "file rename failed");

        let err = AppError::DeleteFailed(anyhow::anyhow!("timeout"));
        assert_eq!(err.to_string(), "file deletion failed");
        assert_eq!(err.kind(), ErrorKind::Infrastructure);
        assert!(err.is_sensitive());
    }

    #[test]
    fn tags_not_allowed_lists_offending_tags() {
        let tags: BTreeSet<String> = ["rust".to_string(), "go".to_string()].into();
        let err = AppError::TagsNotAllowed(tags);
        assert_eq!(
            err.to_string(),
            "One or more tags do not exist in the system: go, rust"
        );
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn kinds_match_taxonomy() {
        assert_eq!(AppError::DuplicateFile.kind(), ErrorKind::Conflict);
        assert_eq!(
            AppError::TagAlreadyExists("java".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(AppError::NotOwner.kind(), ErrorKind::Authorization);
        assert_eq!(AppError::NotOwner.log_level(), LogLevel::Warn);
        assert_eq!(
            AppError::FileNotFound(Uuid::nil()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::TooManyTags { count: 6, max: 5 }.kind(),
            ErrorKind::Validation
        );
    }

    #[test]
    fn client_message_hides_internal_details() {
        let err = AppError::Internal("pool exhausted at 10.0.0.3".into());
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(
            AppError::InvalidSortField("size".into()).client_message(),
            "Invalid sort field: size"
        );
    }
}
