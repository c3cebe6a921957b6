//! Bounded worker pool for accepted uploads.
//!
//! Submissions wait for a free queue slot. At most `max_workers` jobs run at once. Every
//! job ends with exactly one `(file_id, outcome)` message, including jobs that panic and
//! jobs still queued at shutdown; the outcome consumer is the only writer of terminal
//! statuses in the registry.
//!
//! Shutdown: [`UploadWorkerPool::shutdown`] stops intake and fails queued jobs. Jobs that
//! already started run to completion.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

use crate::status::UploadStatusRegistry;

/// Work performed for one accepted upload
pub type UploadJob = BoxFuture<'static, anyhow::Result<()>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Completed,
    Failed(String),
}

/// Sender side of the outcome channel
pub type UploadOutcomeSender = mpsc::Sender<(Uuid, UploadOutcome)>;

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("upload worker pool is shut down")]
    Closed,
}

#[derive(Clone, Debug)]
pub struct UploadWorkerPoolConfig {
    pub max_workers: usize,
    pub queue_capacity: usize,
}

impl Default for UploadWorkerPoolConfig {
    fn default() -> Self {
        Self {
            max_workers: 4,
            queue_capacity: 64,
        }
    }
}

struct QueuedJob {
    file_id: Uuid,
    job: UploadJob,
}

#[derive(Clone)]
pub struct UploadWorkerPool {
    job_tx: mpsc::Sender<QueuedJob>,
    shutdown_tx: mpsc::Sender<()>,
}

impl UploadWorkerPool {
    /// Start the dispatcher and the outcome recorder. Outcomes are written to `registry`.
    pub fn new(config: UploadWorkerPoolConfig, registry: Arc<UploadStatusRegistry>) -> Self {
        let (outcome_tx, mut outcome_rx) = mpsc::channel::<(Uuid, UploadOutcome)>(
            config.queue_capacity.max(1),
        );

        tokio::spawn(async move {
            while let Some((file_id, outcome)) = outcome_rx.recv().await {
                match outcome {
                    UploadOutcome::Completed => registry.mark_completed(file_id).await,
                    UploadOutcome::Failed(_) => registry.mark_failed(file_id).await,
                }
            }
            tracing::debug!("Upload outcome recorder stopped");
        });

        Self::with_outcome_sender(config, outcome_tx)
    }

    /// Start the dispatcher only, reporting outcomes to a caller-owned channel.
    pub fn with_outcome_sender(config: UploadWorkerPoolConfig, outcome_tx: UploadOutcomeSender) -> Self {
        let (job_tx, job_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(Self::dispatch(config, job_rx, shutdown_rx, outcome_tx));

        Self {
            job_tx,
            shutdown_tx,
        }
    }

    /// Queue a job for `file_id`, waiting for a free slot if the queue is full.
    pub async fn submit(&self, file_id: Uuid, job: UploadJob) -> Result<(), SubmitError> {
        self.job_tx
            .send(QueuedJob { file_id, job })
            .await
            .map_err(|_| SubmitError::Closed)?;

        tracing::debug!(file_id = %file_id, "Upload job queued");
        Ok(())
    }

    pub async fn shutdown(&self) {
        tracing::info!("Initiating upload worker pool shutdown");
        let _ = self.shutdown_tx.send(()).await;
    }

    async fn dispatch(
        config: UploadWorkerPoolConfig,
        mut job_rx: mpsc::Receiver<QueuedJob>,
        mut shutdown_rx: mpsc::Receiver<()>,
        outcome_tx: UploadOutcomeSender,
    ) {
        tracing::info!(
            max_workers = config.max_workers,
            queue_capacity = config.queue_capacity,
            "Upload worker pool started"
        );

        let semaphore = Arc::new(Semaphore::new(config.max_workers.max(1)));

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Upload worker pool shutting down");
                    break;
                }
                queued = job_rx.recv() => {
                    let Some(queued) = queued else { break };
                    let permit = match semaphore.clone().acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };
                    let tx = outcome_tx.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        let outcome = Self::run(queued.file_id, queued.job).await;
                        if tx.send((queued.file_id, outcome)).await.is_err() {
                            tracing::warn!(file_id = %queued.file_id, "Upload outcome dropped, recorder gone");
                        }
                    });
                }
            }
        }

        job_rx.close();
        while let Ok(queued) = job_rx.try_recv() {
            tracing::warn!(file_id = %queued.file_id, "Upload job abandoned at shutdown");
            let outcome = UploadOutcome::Failed("worker pool shut down".to_string());
            let _ = outcome_tx.send((queued.file_id, outcome)).await;
        }

        tracing::info!("Upload worker pool stopped");
    }

    async fn run(file_id: Uuid, job: UploadJob) -> UploadOutcome {
        let start = std::time::Instant::now();
        match tokio::spawn(job).await {
            Ok(Ok(())) => {
                tracing::info!(
                    file_id = %file_id,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Upload job completed"
                );
                UploadOutcome::Completed
            }
            Ok(Err(e)) => {
                tracing::error!(file_id = %file_id, error = %e, "Upload job failed");
                UploadOutcome::Failed(e.to_string())
            }
            Err(join_error) => {
                tracing::error!(file_id = %file_id, error = %join_error, "Upload job panicked");
                UploadOutcome::Failed(join_error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusRegistryConfig;
    use filestash_core::models::UploadStatus;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn wait_for_terminal(registry: &UploadStatusRegistry, id: Uuid) -> UploadStatus {
        for _ in 0..200 {
            let status = registry.get(id).await;
            if status.is_terminal() {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        registry.get(id).await
    }

    #[tokio::test]
    async fn outcomes_reach_registry() {
        let registry = Arc::new(UploadStatusRegistry::new(StatusRegistryConfig::default()));
        let pool = UploadWorkerPool::new(UploadWorkerPoolConfig::default(), registry.clone());

        let ok_id = Uuid::new_v4();
        let err_id = Uuid::new_v4();
        registry.mark_in_progress(ok_id).await;
        registry.mark_in_progress(err_id).await;

        pool.submit(ok_id, async { anyhow::Ok(()) }.boxed()).await.unwrap();
        pool.submit(err_id, async { Err(anyhow::anyhow!("bucket missing")) }.boxed())
            .await
            .unwrap();

        assert_eq!(wait_for_terminal(&registry, ok_id).await, UploadStatus::Completed);
        assert_eq!(wait_for_terminal(&registry, err_id).await, UploadStatus::Failed);
    }

    async fn explode() -> anyhow::Result<()> {
        panic!("boom")
    }

    #[tokio::test]
    async fn panicking_job_reports_failure() {
        let (tx, mut rx) = mpsc::channel(4);
        let pool = UploadWorkerPool::with_outcome_sender(UploadWorkerPoolConfig::default(), tx);

        let id = Uuid::new_v4();
        pool.submit(id, explode().boxed()).await.unwrap();

        let (reported, outcome) = rx.recv().await.unwrap();
        assert_eq!(reported, id);
        assert!(matches!(outcome, UploadOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let (tx, mut rx) = mpsc::channel(16);
        let pool = UploadWorkerPool::with_outcome_sender(
            UploadWorkerPoolConfig {
                max_workers: 2,
                queue_capacity: 8,
            },
            tx,
        );

        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        for _ in 0..6 {
            let running = running.clone();
            let peak = peak.clone();
            pool.submit(
                Uuid::new_v4(),
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    anyhow::Ok(())
                }
                .boxed(),
            )
            .await
            .unwrap();
        }

        for _ in 0..6 {
            assert_eq!(rx.recv().await.unwrap().1, UploadOutcome::Completed);
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn submit_after_shutdown_is_rejected() {
        let (tx, _rx) = mpsc::channel(64);
        let pool = UploadWorkerPool::with_outcome_sender(UploadWorkerPoolConfig::default(), tx);

        pool.shutdown().await;

        let mut rejected = false;
        for _ in 0..50 {
            if pool
                .submit(Uuid::new_v4(), async { anyhow::Ok(()) }.boxed())
                .await
                .is_err()
            {
                rejected = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(rejected);
    }
}
