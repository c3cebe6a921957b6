//! Input normalization for filenames and tags

use std::collections::BTreeSet;

use crate::constants::FILENAME_SEPARATOR;
use crate::error::AppError;

/// Sanitize a filename for use in storage keys and metadata.
///
/// Leading and trailing whitespace is removed, every run of inner whitespace becomes a
/// single `_`, and path separators are replaced with `_` so the result stays a single
/// key segment. A name that is only `.` or `..` sanitizes to the empty string.
pub fn sanitize_filename(filename: &str) -> String {
    let mut out = String::with_capacity(filename.len());
    let mut in_whitespace = false;

    for c in filename.trim().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push(FILENAME_SEPARATOR);
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c == '/' || c == '\\' {
            out.push(FILENAME_SEPARATOR);
        } else {
            out.push(c);
        }
    }

    // A bare `.` or `..` would be a relative path segment, not a name.
    if out == "." || out == ".." {
        out.clear();
    }

    out
}

/// Trim and lower-case a single tag name.
pub fn normalize_tag_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Normalize a tag sequence into a set. Blank entries are dropped.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| normalize_tag_name(t.as_ref()))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Reject a raw tag sequence longer than `max`. Duplicates count.
pub fn validate_tag_count(count: usize, max: usize) -> Result<(), AppError> {
    if count > max {
        return Err(AppError::TooManyTags { count, max });
    }
    Ok(())
}

/// Normalize an optional listing tag filter; blank filters are treated as absent.
pub fn normalize_tag_filter(tag: Option<&str>) -> Option<String> {
    tag.map(normalize_tag_name).filter(|t| !t.is_empty())
}
