//! Listing parameters and paged results

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::{DEFAULT_PAGE, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    UploadDate,
    Filename,
    FileSize,
}

impl SortField {
    /// Column name in the files table
    pub fn column(&self) -> &'static str {
        match self {
            SortField::UploadDate => "upload_date",
            SortField::Filename => "filename",
            SortField::FileSize => "file_size",
        }
    }
}

impl FromStr for SortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "uploaddate" => Ok(SortField::UploadDate),
            "filename" => Ok(SortField::Filename),
            "filesize" => Ok(SortField::FileSize),
            _ => Err(AppError::InvalidSortField(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(AppError::InvalidSortOrder(s.to_string())),
        }
    }
}

/// Zero-based page request. Out-of-range values are normalized, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    size: i64,
}

impl PageRequest {
    pub fn new(page: i64, size: i64) -> Self {
        let page = if page < 0 { DEFAULT_PAGE } else { page };
        let size = if size <= 0 {
            DEFAULT_PAGE_SIZE
        } else {
            size.min(MAX_PAGE_SIZE)
        };
        Self { page, size }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_elements: i64) -> Self {
        let size = request.size();
        let total_pages = if total_elements == 0 {
            0
        } else {
            (total_elements + size - 1) / size
        };
        Page {
            items,
            page: request.page(),
            size,
            total_elements,
            total_pages,
        }
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

/// Filter for a listing: records visible to `caller_id`, optionally carrying `tag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileQuery {
    pub caller_id: String,
    /// Already normalized
    pub tag: Option<String>,
    pub page: PageRequest,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_parsing() {
        assert_eq!("uploadDate".parse::<SortField>().unwrap(), SortField::UploadDate);
        assert_eq!("FILENAME".parse::<SortField>().unwrap(), SortField::Filename);
        assert_eq!("filesize".parse::<SortField>().unwrap(), SortField::FileSize);
        let err = "owner".parse::<SortField>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid sort field: owner");
    }

    #[test]
    fn sort_order_parsing() {
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!(matches!(
            "sideways".parse::<SortOrder>(),
            Err(AppError::InvalidSortOrder(_))
        ));
    }

    #[test]
    fn page_request_normalizes() {
        let req = PageRequest::new(-3, 0);
        assert_eq!(req.page(), 0);
        assert_eq!(req.size(), 10);

        let req = PageRequest::new(2, 25);
        assert_eq!(req.offset(), 50);

        assert_eq!(PageRequest::new(0, 10_000).size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn page_totals() {
        let page: Page<u8> = Page::new(vec![1, 2], PageRequest::new(0, 2), 5);
        assert_eq!(page.total_pages, 3);

        let empty: Page<u8> = Page::new(vec![], PageRequest::default(), 0);
        assert_eq!(empty.total_pages, 0);

        let mapped = page.map(|n| n.to_string());
        assert_eq!(mapped.items, vec!["1".to_string(), "2".to_string()]);
    }
}
