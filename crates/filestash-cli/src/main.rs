//! Filestash CLI: manage stored files and the tag vocabulary.
//!
//! Reads the same environment as the services (DATABASE_URL, STORAGE_BACKEND, ...).
//! The acting user comes from --user or FILESTASH_USER.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use filestash_cli::{format_file_row, guess_content_type, init_tracing, resolve_user, USER_ENV};
use filestash_core::models::UploadStatus;
use filestash_core::Config;
use filestash_infra::shutdown_telemetry;
use filestash_services::{ListRequest, Services, UploadRequest};
use serde::Serialize;
use uuid::Uuid;

const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(200);
const STATUS_POLL_ATTEMPTS: usize = 300;

#[derive(Parser)]
#[command(name = "filestash", about = "Filestash file storage CLI")]
struct Cli {
    /// Acting user (owner of uploads, caller for listings)
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// File operations
    Files {
        #[command(subcommand)]
        sub: FileCommands,
    },
    /// Tag vocabulary operations
    Tags {
        #[command(subcommand)]
        sub: TagCommands,
    },
}

#[derive(Subcommand)]
enum FileCommands {
    /// List files visible to the user
    List {
        /// Only files carrying this tag
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, default_value = "0")]
        page: i64,
        #[arg(long, default_value = "10")]
        size: i64,
        /// uploaddate, filename or filesize
        #[arg(long)]
        sort: Option<String>,
        /// asc or desc
        #[arg(long)]
        order: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Upload a file
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        /// Stored name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
        /// Make the file visible to everyone
        #[arg(long)]
        public: bool,
        /// Tag to attach; repeat for several
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        content_type: Option<String>,
        /// Store inline instead of polling the background upload
        #[arg(long)]
        wait: bool,
    },
    /// Rename a file
    Rename {
        /// File UUID
        id: Uuid,
        /// New file name
        name: String,
    },
    /// Delete a file
    Delete {
        /// File UUID
        id: Uuid,
    },
}

#[derive(Subcommand)]
enum TagCommands {
    /// List registered tags
    List,
    /// Register a tag
    Create { name: String },
    /// Remove a tag
    Delete { name: String },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format())?;

    let services = Services::from_config(&config).await?;
    let result = run(cli, &services).await;

    services.shutdown().await;
    shutdown_telemetry().await;
    result
}

async fn run(cli: Cli, services: &Services) -> anyhow::Result<()> {
    match cli.command {
        Commands::Tags { sub } => match sub {
            TagCommands::List => print_json(&services.tags.list().await?)?,
            TagCommands::Create { name } => print_json(&services.tags.create(&name).await?)?,
            TagCommands::Delete { name } => {
                services.tags.delete(&name).await?;
                print_json(&serde_json::json!({ "success": true, "message": format!("Tag {} deleted", name) }))?;
            }
        },
        Commands::Files { sub } => {
            let user = resolve_user(cli.user, std::env::var(USER_ENV).ok())?;
            run_files(sub, &user, services).await?;
        }
    }
    Ok(())
}

async fn run_files(command: FileCommands, user: &str, services: &Services) -> anyhow::Result<()> {
    match command {
        FileCommands::List {
            tag,
            page,
            size,
            sort,
            order,
            json,
        } => {
            let page = services
                .files
                .list(ListRequest {
                    caller_id: user.to_string(),
                    tag,
                    page,
                    size,
                    sort_field: sort,
                    sort_order: order,
                })
                .await?;
            if json {
                print_json(&page)?;
            } else {
                for file in &page.items {
                    println!("{}", format_file_row(file));
                }
                println!(
                    "page {} of {} ({} files)",
                    page.page + 1,
                    page.total_pages.max(1),
                    page.total_elements
                );
            }
        }
        FileCommands::Upload {
            file,
            name,
            public,
            tags,
            content_type,
            wait,
        } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let filename = match name {
                Some(name) => name,
                None => file
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .context("Upload path has no file name")?,
            };
            let request = UploadRequest {
                owner_id: user.to_string(),
                data: Bytes::from(data),
                filename,
                content_type: content_type
                    .unwrap_or_else(|| guess_content_type(&file).to_string()),
                is_public: public,
                tags,
            };

            if wait {
                let record = services.files.upload_and_wait(request).await?;
                print_json(&filestash_core::models::FileResponse::from(record))?;
            } else {
                let id = services.files.upload(request).await?;
                let status = poll_upload(services, id).await;
                print_json(&serde_json::json!({ "id": id, "status": status }))?;
                if status == UploadStatus::Failed {
                    anyhow::bail!("Upload {} failed", id);
                }
            }
        }
        FileCommands::Rename { id, name } => {
            let record = services.files.rename(id, &name, user).await?;
            print_json(&filestash_core::models::FileResponse::from(record))?;
        }
        FileCommands::Delete { id } => {
            services.files.delete(id, user).await?;
            print_json(&serde_json::json!({ "success": true, "message": format!("File {} deleted", id) }))?;
        }
    }
    Ok(())
}

/// Poll until the upload leaves `in_progress` or the attempts run out.
async fn poll_upload(services: &Services, id: Uuid) -> UploadStatus {
    let mut status = services.files.get_status(id).await;
    for _ in 0..STATUS_POLL_ATTEMPTS {
        if status != UploadStatus::InProgress {
            break;
        }
        tokio::time::sleep(STATUS_POLL_INTERVAL).await;
        status = services.files.get_status(id).await;
    }
    status
}
