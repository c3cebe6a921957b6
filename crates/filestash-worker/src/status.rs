//! Upload status registry and its reaper.
//!
//! Entries are sharded across several maps so that concurrent uploads usually lock
//! different shards. In-progress entries are never evicted; completed and failed
//! entries are dropped once they are older than the configured TTL, and optionally on
//! the first poll that observes them.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};

use filestash_core::models::UploadStatus;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, Copy)]
struct StatusEntry {
    status: UploadStatus,
    updated_at: Instant,
}

impl StatusEntry {
    fn new(status: UploadStatus) -> Self {
        Self {
            status,
            updated_at: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.status.is_terminal() && self.updated_at.elapsed() >= ttl
    }
}

#[derive(Debug, Clone)]
pub struct StatusRegistryConfig {
    /// How long completed and failed entries stay visible
    pub ttl: Duration,
    /// Drop completed and failed entries on the first poll that returns them
    pub evict_on_read: bool,
    pub shard_count: usize,
}

impl Default for StatusRegistryConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            evict_on_read: false,
            shard_count: 16,
        }
    }
}

pub struct UploadStatusRegistry {
    shards: Vec<Arc<Mutex<HashMap<Uuid, StatusEntry>>>>,
    shard_count: usize,
    ttl: Duration,
    evict_on_read: bool,
}

impl UploadStatusRegistry {
    pub fn new(config: StatusRegistryConfig) -> Self {
        let shard_count = config.shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| Arc::new(Mutex::new(HashMap::new())))
            .collect();
        Self {
            shards,
            shard_count,
            ttl: config.ttl,
            evict_on_read: config.evict_on_read,
        }
    }

    fn shard(&self, id: &Uuid) -> &Mutex<HashMap<Uuid, StatusEntry>> {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        id.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % self.shard_count]
    }

    async fn set(&self, id: Uuid, status: UploadStatus) {
        self.shard(&id)
            .lock()
            .await
            .insert(id, StatusEntry::new(status));
        tracing::debug!(file_id = %id, status = %status, "Upload status updated");
    }

    pub async fn mark_in_progress(&self, id: Uuid) {
        self.set(id, UploadStatus::InProgress).await;
    }

    pub async fn mark_completed(&self, id: Uuid) {
        self.set(id, UploadStatus::Completed).await;
    }

    pub async fn mark_failed(&self, id: Uuid) {
        self.set(id, UploadStatus::Failed).await;
    }

    /// Current status of `id`; `NotFound` if it was never recorded or has been evicted.
    pub async fn get(&self, id: Uuid) -> UploadStatus {
        let mut shard = self.shard(&id).lock().await;
        let Some(entry) = shard.get(&id).copied() else {
            return UploadStatus::NotFound;
        };

        if entry.is_expired(self.ttl) {
            shard.remove(&id);
            return UploadStatus::NotFound;
        }

        if self.evict_on_read && entry.status.is_terminal() {
            shard.remove(&id);
        }

        entry.status
    }

    /// Remove every terminal entry older than the TTL. Returns how many were removed.
    pub async fn evict_expired(&self) -> usize {
        let mut evicted = 0;
        for shard in &self.shards {
            let mut entries = shard.lock().await;
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(self.ttl));
            evicted += before - entries.len();
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        let mut total = 0;
        for shard in &self.shards {
            total += shard.lock().await.len();
        }
        total
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for UploadStatusRegistry {
    fn default() -> Self {
        Self::new(StatusRegistryConfig::default())
    }
}

/// Handle to a running reaper task
pub struct StatusReaper {
    shutdown_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl StatusReaper {
    /// Stop the reaper and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.handle.await;
    }
}

/// Periodically evict expired entries from `registry`.
pub fn spawn_status_reaper(registry: Arc<UploadStatusRegistry>, every: Duration) -> StatusReaper {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let evicted = registry.evict_expired().await;
                    if evicted > 0 {
                        tracing::debug!(evicted, "Evicted expired upload statuses");
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
        tracing::debug!("Upload status reaper stopped");
    });

    StatusReaper {
        shutdown_tx,
        handle,
    }
}
