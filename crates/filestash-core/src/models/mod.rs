pub mod file;
pub mod listing;
pub mod tag;
pub mod upload_status;

pub use file::{FileRecord, FileResponse};
pub use listing::{FileQuery, Page, PageRequest, SortField, SortOrder};
pub use tag::Tag;
pub use upload_status::UploadStatus;
