//! Shared key generation for storage backends.
//!
//! Key format: `{owner_id}/{filename}`.

/// Storage key of a file owned by `owner_id`. `filename` must already be sanitized.
pub fn file_key(owner_id: &str, filename: &str) -> String {
    format!("{}/{}", owner_id, filename)
}

/// Keys that could escape a filesystem root or produce an absolute path are refused.
/// Dots inside a segment (`report..final.pdf`) are fine; a segment that is `.` or `..` is not.
pub(crate) fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('/')
        && !key.split('/').any(|segment| segment == "." || segment == "..")
}
