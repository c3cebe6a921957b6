//! Filestash Core Library
//!
//! This crate provides domain models, error types, configuration, content hashing
//! and input normalization shared across all Filestash components.

pub mod config;
pub mod constants;
pub mod error;
pub mod hashing;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorKind, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
