//! Filestash Database Layer
//!
//! Repositories for file metadata and the tag vocabulary, with PostgreSQL and
//! in-memory implementations behind shared traits.

pub mod db;
pub mod memory;
pub mod repository_traits;

pub use db::{PgFileRepository, PgTagRepository};
pub use memory::{InMemoryFileRepository, InMemoryTagRepository};
pub use repository_traits::{FileRepository, TagRepository};

use sqlx::PgPool;

/// Apply the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
