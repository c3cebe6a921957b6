use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Progress of an asynchronous upload, as reported to pollers
///
/// Advisory only: whether a file record exists is the authoritative answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    InProgress,
    Completed,
    Failed,
    /// Never observed, or already evicted
    #[default]
    NotFound,
}

impl UploadStatus {
    /// Completed and failed uploads never change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Failed)
    }
}

impl Display for UploadStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UploadStatus::InProgress => write!(f, "in_progress"),
            UploadStatus::Completed => write!(f, "completed"),
            UploadStatus::Failed => write!(f, "failed"),
            UploadStatus::NotFound => write!(f, "not_found"),
        }
    }
}
