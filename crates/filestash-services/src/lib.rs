//! Filestash Services Layer
//!
//! Business orchestration over the storage, metadata and worker crates: uploads with
//! dedup and tag checks, renames, deletes, listings and the tag vocabulary. Callers
//! (the CLI, or any transport added later) depend on this crate only.

pub mod services;
pub mod setup;

pub use filestash_core::{AppError, Config, ErrorKind, ErrorMetadata};
pub use filestash_storage::{create_storage, Storage, StorageBackend, StorageError};
pub use filestash_worker::{StatusRegistryConfig, UploadStatusRegistry, UploadWorkerPoolConfig};
pub use services::files::{FileService, ListRequest, UploadRequest};
pub use services::tag_validator::TagValidator;
pub use services::tags::TagService;
pub use setup::Services;
