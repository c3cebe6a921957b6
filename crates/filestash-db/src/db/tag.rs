use std::collections::BTreeSet;

use async_trait::async_trait;
use filestash_core::{models::Tag, AppError};
use sqlx::{PgPool, Postgres};

use crate::repository_traits::TagRepository;

/// PostgreSQL-backed tag vocabulary
#[derive(Clone)]
pub struct PgTagRepository {
    pool: PgPool,
}

impl PgTagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "select"))]
    async fn exists(&self, name: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM tags WHERE name = $1)",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "select"))]
    async fn exists_all(&self, names: &BTreeSet<String>) -> Result<bool, AppError> {
        if names.is_empty() {
            return Ok(true);
        }

        let names: Vec<String> = names.iter().cloned().collect();
        let found = sqlx::query_scalar::<Postgres, i64>(
            "SELECT COUNT(*) FROM tags WHERE name = ANY($1)",
        )
        .bind(&names)
        .fetch_one(&self.pool)
        .await?;

        Ok(found == names.len() as i64)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "select"))]
    async fn list(&self) -> Result<Vec<Tag>, AppError> {
        let tags = sqlx::query_as::<Postgres, Tag>(
            "SELECT name, created_at FROM tags ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "insert"))]
    async fn create(&self, name: &str) -> Result<Tag, AppError> {
        let tag = sqlx::query_as::<Postgres, Tag>(
            r#"
            INSERT INTO tags (name)
            VALUES ($1)
            ON CONFLICT (name) DO NOTHING
            RETURNING name, created_at
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        tag.ok_or_else(|| AppError::TagAlreadyExists(name.to_string()))
    }

    #[tracing::instrument(skip(self), fields(db.table = "tags", db.operation = "delete"))]
    async fn delete_by_name(&self, name: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tags WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
