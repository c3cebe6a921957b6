//! Filestash Storage Library
//!
//! Object storage abstraction and its backends: S3 (and S3-compatible providers),
//! the local filesystem, and an in-process memory store for tests and development.
//!
//! # Storage key format
//!
//! Every stored file lives under `{owner_id}/{filename}`, where `filename` is already
//! sanitized. Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so all callers stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use filestash_core::StorageBackend;
pub use keys::file_key;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
