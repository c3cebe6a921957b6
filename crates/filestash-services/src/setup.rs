//! Service wiring from configuration

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use filestash_core::Config;
use filestash_db::{run_migrations, FileRepository, PgFileRepository, PgTagRepository, TagRepository};
use filestash_storage::{create_storage, Storage};
use filestash_worker::{
    spawn_status_reaper, StatusReaper, StatusRegistryConfig, UploadStatusRegistry,
    UploadWorkerPool, UploadWorkerPoolConfig,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::services::files::FileService;
use crate::services::tag_validator::TagValidator;
use crate::services::tags::TagService;

/// Everything a caller needs, plus the background tasks that must be stopped on exit
pub struct Services {
    pub files: FileService,
    pub tags: TagService,
    pub statuses: Arc<UploadStatusRegistry>,
    workers: UploadWorkerPool,
    reaper: Option<StatusReaper>,
    pool: Option<PgPool>,
}

impl Services {
    /// Connect to PostgreSQL, apply migrations, create the storage backend and start the
    /// upload workers.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = setup_database(config).await?;

        let storage = create_storage(config)
            .await
            .context("Failed to initialize storage backend")?;
        tracing::info!(
            backend = %storage.backend_type(),
            bucket = %storage.bucket(),
            "Storage initialized"
        );

        let files: Arc<dyn FileRepository> = Arc::new(PgFileRepository::new(pool.clone()));
        let tags: Arc<dyn TagRepository> = Arc::new(PgTagRepository::new(pool.clone()));

        let mut services = Self::assemble(config, storage, files, tags);
        services.pool = Some(pool);
        Ok(services)
    }

    /// Build the services over already constructed stores. Must run inside a Tokio runtime.
    pub fn assemble(
        config: &Config,
        storage: Arc<dyn Storage>,
        files: Arc<dyn FileRepository>,
        tags: Arc<dyn TagRepository>,
    ) -> Self {
        let statuses = Arc::new(UploadStatusRegistry::new(StatusRegistryConfig {
            ttl: Duration::from_secs(config.upload_status_ttl_secs()),
            evict_on_read: config.upload_status_evict_on_read(),
            ..Default::default()
        }));

        let workers = UploadWorkerPool::new(
            UploadWorkerPoolConfig {
                max_workers: config.upload_max_workers(),
                queue_capacity: config.upload_queue_capacity(),
            },
            statuses.clone(),
        );

        let reaper = match config.upload_status_reap_interval_secs() {
            0 => {
                tracing::warn!("Upload status reaper disabled");
                None
            }
            secs => Some(spawn_status_reaper(
                statuses.clone(),
                Duration::from_secs(secs),
            )),
        };

        let tag_validator = TagValidator::new(tags.clone(), config.max_tags_per_file());
        let files = FileService::new(
            storage,
            files,
            tag_validator,
            statuses.clone(),
            workers.clone(),
        );

        Self {
            files,
            tags: TagService::new(tags),
            statuses,
            workers,
            reaper,
            pool: None,
        }
    }

    /// Stop intake, stop the reaper and close the database pool.
    pub async fn shutdown(self) {
        self.workers.shutdown().await;
        if let Some(reaper) = self.reaper {
            reaper.shutdown().await;
        }
        if let Some(pool) = self.pool {
            pool.close().await;
        }
        tracing::info!("Services shut down");
    }
}

async fn setup_database(config: &Config) -> Result<PgPool> {
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections())
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds()))
        .connect(config.database_url())
        .await
        .context("Failed to connect to database")?;

    tracing::info!(
        max_connections = config.db_max_connections(),
        "Database connected successfully"
    );

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    Ok(pool)
}
