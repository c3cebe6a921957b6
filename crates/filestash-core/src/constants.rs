//! Application-wide constants

/// First page index used when a caller supplies none or a negative one.
pub const DEFAULT_PAGE: i64 = 0;

/// Page size used when a caller supplies none or a non-positive one.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Upper bound on a single listing page.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Maximum number of tags a single file may carry.
pub const DEFAULT_MAX_TAGS: usize = 5;

/// Read buffer size for content hashing.
pub const HASH_CHUNK_SIZE: usize = 8192;

/// Replacement for whitespace and path separators in stored filenames.
pub const FILENAME_SEPARATOR: char = '_';

/// Content type recorded when the uploader supplies none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// Stable client-facing messages for infrastructure failures.
pub const FILE_UPLOAD_ERROR: &str = "file upload failed";
pub const FILE_RENAME_ERROR: &str = "file rename failed";
pub const FILE_DELETE_ERROR: &str = "file deletion failed";
