//! Background export queue.
//!
//! Jobs are enqueued with a scene snapshot and processed one at a time by a
//! worker task. Each job gets a [`JobHandle`] to watch its status and await
//! its output.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::error::{ExportError, ExportResult};
use crate::pipeline::{ExportJob, ExportOutput, Exporter, JobStatus};
use crate::scene::ExportScene;
use crate::surface::RenderSurface;

/// Identifier of a queued job, unique per queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

struct QueuedJob {
    id: JobId,
    scene: ExportScene,
    job: ExportJob,
    status: watch::Sender<JobStatus>,
    result: oneshot::Sender<ExportResult<ExportOutput>>,
}

/// Handle to a queued job.
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    status: watch::Receiver<JobStatus>,
    result: oneshot::Receiver<ExportResult<ExportOutput>>,
}

impl JobHandle {
    /// The job id.
    #[must_use]
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Latest status.
    #[must_use]
    pub fn status(&self) -> JobStatus {
        self.status.borrow().clone()
    }

    /// A receiver that observes every status change.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<JobStatus> {
        self.status.clone()
    }

    /// Wait for the job to finish.
    ///
    /// # Errors
    ///
    /// Returns the job's own error, or [`ExportError::QueueClosed`] if the
    /// worker stopped before delivering a result.
    pub async fn wait(self) -> ExportResult<ExportOutput> {
        self.result.await.map_err(|_| ExportError::QueueClosed)?
    }
}

/// A sequential export worker.
pub struct ExportQueue {
    sender: mpsc::UnboundedSender<QueuedJob>,
    worker: JoinHandle<()>,
    next_id: AtomicU64,
}

impl ExportQueue {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn<S: RenderSurface + 'static>(surface: S) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<QueuedJob>();
        let exporter = Exporter::new(surface);

        let worker = tokio::spawn(async move {
            while let Some(queued) = receiver.recv().await {
                queued.status.send_replace(JobStatus::Processing);
                tracing::debug!(job = %queued.id, name = %queued.job.name, "export job started");

                let result = exporter
                    .export(&queued.scene, &queued.job.name, &queued.job.options)
                    .await;
                let status = match &result {
                    Ok(output) => JobStatus::Completed {
                        bytes: output.size(),
                    },
                    Err(e) => {
                        tracing::warn!(job = %queued.id, error = %e, "export job failed");
                        JobStatus::Error {
                            message: e.to_string(),
                        }
                    }
                };
                queued.status.send_replace(status);
                // The caller may have dropped its handle.
                let _ = queued.result.send(result);
            }
            tracing::debug!("export queue worker stopped");
        });

        Self {
            sender,
            worker,
            next_id: AtomicU64::new(1),
        }
    }

    /// Queue a job against a scene snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::QueueClosed`] if the worker has stopped.
    pub fn enqueue(&self, scene: ExportScene, job: ExportJob) -> ExportResult<JobHandle> {
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (status_tx, status_rx) = watch::channel(JobStatus::Pending);
        let (result_tx, result_rx) = oneshot::channel();
        self.sender
            .send(QueuedJob {
                id,
                scene,
                job,
                status: status_tx,
                result: result_tx,
            })
            .map_err(|_| ExportError::QueueClosed)?;
        Ok(JobHandle {
            id,
            status: status_rx,
            result: result_rx,
        })
    }

    /// Stop accepting jobs and wait for queued ones to finish.
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.worker.await {
            tracing::warn!(error = %e, "export queue worker ended abnormally");
        }
    }
}
