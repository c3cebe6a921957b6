//! Background upload execution.
//!
//! [`UploadWorkerPool`] runs accepted uploads with bounded concurrency and reports each
//! outcome on a channel whose only consumer writes to the [`UploadStatusRegistry`].
//! Pollers read upload progress from the registry; a reaper evicts finished entries.

pub mod pool;
pub mod status;

pub use pool::{
    SubmitError, UploadJob, UploadOutcome, UploadOutcomeSender, UploadWorkerPool,
    UploadWorkerPoolConfig,
};
pub use status::{spawn_status_reaper, StatusReaper, StatusRegistryConfig, UploadStatusRegistry};
