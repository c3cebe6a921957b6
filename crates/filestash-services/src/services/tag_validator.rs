//! Tag checks applied to every upload

use std::collections::BTreeSet;
use std::sync::Arc;

use filestash_core::validation::{normalize_tags, validate_tag_count};
use filestash_core::AppError;
use filestash_db::TagRepository;

#[derive(Clone)]
pub struct TagValidator {
    tags: Arc<dyn TagRepository>,
    max_tags: usize,
}

impl TagValidator {
    pub fn new(tags: Arc<dyn TagRepository>, max_tags: usize) -> Self {
        Self { tags, max_tags }
    }

    pub fn max_tags(&self) -> usize {
        self.max_tags
    }

    /// Trim, lower-case and deduplicate. Blank entries are dropped.
    pub fn normalize<S: AsRef<str>>(&self, raw: &[S]) -> BTreeSet<String> {
        normalize_tags(raw)
    }

    /// Reject raw sequences longer than the configured maximum, before normalization.
    pub fn validate_count<S>(&self, raw: &[S]) -> Result<(), AppError> {
        validate_tag_count(raw.len(), self.max_tags)
    }

    /// Whether every tag is registered in the vocabulary right now.
    pub async fn all_exist(&self, tags: &BTreeSet<String>) -> Result<bool, AppError> {
        self.tags.exists_all(tags).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filestash_db::InMemoryTagRepository;

    fn validator(max: usize) -> TagValidator {
        TagValidator::new(
            Arc::new(InMemoryTagRepository::with_tags(["java", "spring", "docker"])),
            max,
        )
    }

    #[test]
    fn normalizes_case_whitespace_and_duplicates() {
        let tags = validator(5).normalize(&["  Java  ", "Spring ", " DOCKER", "java", " "]);
        let expected: BTreeSet<String> = ["java", "spring", "docker"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(tags, expected);
    }

    #[test]
    fn rejects_too_many_raw_tags() {
        let raw = ["a", "b", "c", "d", "e", "f"];
        assert!(matches!(
            validator(5).validate_count(&raw),
            Err(AppError::TooManyTags { count: 6, max: 5 })
        ));
        assert!(validator(5).validate_count(&raw[..5]).is_ok());
    }

    #[tokio::test]
    async fn checks_vocabulary() {
        let validator = validator(5);
        let known = validator.normalize(&["JAVA", "docker"]);
        assert!(validator.all_exist(&known).await.unwrap());

        let unknown = validator.normalize(&["java", "rust"]);
        assert!(!validator.all_exist(&unknown).await.unwrap());
    }
}
