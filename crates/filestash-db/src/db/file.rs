use async_trait::async_trait;
use filestash_core::{
    models::{FileQuery, FileRecord, Page},
    AppError,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::repository_traits::FileRepository;

const FILE_COLUMNS: &str = "id, owner_id, filename, content_hash, content_type, file_size, \
                            is_public, tags, upload_date, download_url";

/// PostgreSQL-backed file metadata repository
#[derive(Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends the visibility and tag predicates shared by the count and page queries.
    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &FileQuery) {
        builder.push(" WHERE (is_public OR owner_id = ");
        builder.push_bind(query.caller_id.clone());
        builder.push(")");
        if let Some(ref tag) = query.tag {
            builder.push(" AND ");
            builder.push_bind(tag.clone());
            builder.push(" = ANY(tags)");
        }
    }
}

#[async_trait]
impl FileRepository for PgFileRepository {
    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        let record = sqlx::query_as::<Postgres, FileRecord>(&format!(
            "SELECT {} FROM files WHERE id = $1",
            FILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    #[tracing::instrument(skip(self, record), fields(db.table = "files", db.operation = "upsert", db.record_id = %record.id))]
    async fn save(&self, record: &FileRecord) -> Result<FileRecord, AppError> {
        let saved = sqlx::query_as::<Postgres, FileRecord>(&format!(
            r#"
            INSERT INTO files (id, owner_id, filename, content_hash, content_type, file_size,
                               is_public, tags, upload_date, download_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                filename = EXCLUDED.filename,
                is_public = EXCLUDED.is_public,
                tags = EXCLUDED.tags,
                download_url = EXCLUDED.download_url
            RETURNING {}
            "#,
            FILE_COLUMNS
        ))
        .bind(record.id)
        .bind(&record.owner_id)
        .bind(&record.filename)
        .bind(&record.content_hash)
        .bind(&record.content_type)
        .bind(record.file_size)
        .bind(record.is_public)
        .bind(&record.tags)
        .bind(record.upload_date)
        .bind(&record.download_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(saved)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "delete", db.record_id = %id))]
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self, content_hash), fields(db.table = "files", db.operation = "select"))]
    async fn exists_by_owner_and_filename_or_hash(
        &self,
        owner_id: &str,
        filename: &str,
        content_hash: &str,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM files WHERE owner_id = $1 AND (filename = $2 OR content_hash = $3))",
        )
        .bind(owner_id)
        .bind(filename)
        .bind(content_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    async fn exists_by_owner_and_filename(
        &self,
        owner_id: &str,
        filename: &str,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM files WHERE owner_id = $1 AND filename = $2)",
        )
        .bind(owner_id)
        .bind(filename)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.operation = "select"))]
    async fn find_page(&self, query: &FileQuery) -> Result<Page<FileRecord>, AppError> {
        let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM files");
        Self::push_filters(&mut count_builder, query);
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM files", FILE_COLUMNS));
        Self::push_filters(&mut builder, query);
        // Column and direction come from closed enums, never from caller text.
        builder.push(" ORDER BY ");
        builder.push(query.sort_field.column());
        builder.push(" ");
        builder.push(query.sort_order.as_sql());
        builder.push(", id ASC LIMIT ");
        builder.push_bind(query.page.size());
        builder.push(" OFFSET ");
        builder.push_bind(query.page.offset());

        let records = builder
            .build_query_as::<FileRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(records, query.page, total))
    }
}
