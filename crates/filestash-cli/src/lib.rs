use std::path::Path;

use filestash_core::models::FileResponse;
use filestash_infra::{init_telemetry, LogFormat};

/// Environment variable naming the acting user when `--user` is not given
pub const USER_ENV: &str = "FILESTASH_USER";

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Human-readable byte count
pub fn format_size(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes.max(0) as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes.max(0), UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// One line of the `files list` table
pub fn format_file_row(file: &FileResponse) -> String {
    format!(
        "{}  {:<32}  {:>10}  {:<7}  {}",
        file.id,
        truncate_string(&file.filename, 32),
        format_size(file.file_size),
        if file.is_public { "public" } else { "private" },
        file.tags.join(",")
    )
}

/// The acting user: the `--user` flag, else `FILESTASH_USER`.
pub fn resolve_user(flag: Option<String>, env_value: Option<String>) -> anyhow::Result<String> {
    flag.or(env_value)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| anyhow::anyhow!("No user given. Pass --user or set {}", USER_ENV))
}

/// Content type from a file extension; unknown extensions fall back to octet-stream.
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("txt") | Some("log") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("mp3") => "audio/mpeg",
        _ => filestash_core::constants::DEFAULT_CONTENT_TYPE,
    }
}

/// Initialize tracing for the CLI. Library logs stay quiet unless `RUST_LOG` says otherwise.
pub fn init_tracing(log_format: &str) -> anyhow::Result<()> {
    let format: LogFormat = log_format.parse()?;
    init_telemetry(format, "filestash=warn")
}

#[cfg(test)]
mod tests {
    use super::*;
    use filestash_core::models::FileRecord;
    use uuid::Uuid;

    fn response(filename: &str, size: i64, is_public: bool, tags: &[&str]) -> FileResponse {
        FileRecord {
            id: Uuid::nil(),
            owner_id: "alice".to_string(),
            filename: filename.to_string(),
            content_hash: String::new(),
            content_type: "text/plain".to_string(),
            file_size: size,
            is_public,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            upload_date: Default::default(),
            download_url: String::new(),
        }
        .into()
    }

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
        assert_eq!(truncate_string("hello", 5), "hello");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
        assert_eq!(truncate_string("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn file_row() {
        let row = format_file_row(&response("notes.txt", 2048, true, &["go", "rust"]));
        assert!(row.starts_with("00000000-0000-0000-0000-000000000000"));
        assert!(row.contains("notes.txt"));
        assert!(row.contains("2.0 KiB"));
        assert!(row.contains("public"));
        assert!(row.ends_with("go,rust"));
    }

    #[test]
    fn user_resolution() {
        assert_eq!(resolve_user(Some("alice".into()), Some("bob".into())).unwrap(), "alice");
        assert_eq!(resolve_user(None, Some(" bob ".into())).unwrap(), "bob");
        assert!(resolve_user(None, None).is_err());
        assert!(resolve_user(Some("  ".into()), None).is_err());
    }

    #[test]
    fn content_types() {
        assert_eq!(guess_content_type(Path::new("a/report.PDF")), "application/pdf");
        assert_eq!(guess_content_type(Path::new("notes.txt")), "text/plain");
        assert_eq!(guess_content_type(Path::new("blob")), "application/octet-stream");
    }
}
