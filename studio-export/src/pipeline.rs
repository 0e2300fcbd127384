//! Single and batch exports.

use serde::{Deserialize, Serialize};

use crate::bundle::ExportBundle;
use crate::error::ExportResult;
use crate::options::{ExportFormat, ExportOptions};
use crate::scene::ExportScene;
use crate::surface::RenderSurface;

/// A named export request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportJob {
    /// Job name, used for the output filename.
    pub name: String,
    /// Export options.
    #[serde(default)]
    pub options: ExportOptions,
}

impl ExportJob {
    /// Create a job.
    #[must_use]
    pub fn new(name: impl Into<String>, options: ExportOptions) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}

/// Lifecycle of an export job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting to start.
    Pending,
    /// Rendering.
    Processing,
    /// Finished successfully.
    Completed {
        /// Payload size in bytes.
        bytes: usize,
    },
    /// Failed.
    Error {
        /// Failure description.
        message: String,
    },
}

impl JobStatus {
    /// Whether the job has finished, successfully or not.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Error { .. })
    }
}

/// A progress report from a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct JobProgress {
    /// Position of the job in the batch.
    pub index: usize,
    /// Number of jobs in the batch.
    pub total: usize,
    /// Job name.
    pub name: String,
    /// New status of the job.
    pub status: JobStatus,
    /// Fraction of the batch finished, in `[0, 1]`.
    pub progress: f64,
}

/// An encoded export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutput {
    /// Job name.
    pub name: String,
    /// Output format.
    pub format: ExportFormat,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Encoded payload.
    pub bytes: Vec<u8>,
}

impl ExportOutput {
    /// MIME type of the payload.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Payload size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Final status of one job in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    /// Job name.
    pub name: String,
    /// Terminal status.
    pub status: JobStatus,
}

/// Result of a batch export.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Terminal status of every job, in submission order.
    pub jobs: Vec<JobRecord>,
    /// Successful outputs, ready for delivery.
    pub bundle: ExportBundle,
}

impl BatchReport {
    /// Number of jobs that completed.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.jobs
            .iter()
            .filter(|j| matches!(j.status, JobStatus::Completed { .. }))
            .count()
    }

    /// Number of jobs that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.jobs.len() - self.completed()
    }
}

/// Drives a [`RenderSurface`] through validated exports.
#[derive(Debug, Clone)]
pub struct Exporter<S> {
    surface: S,
}

impl<S: RenderSurface> Exporter<S> {
    /// Create an exporter over a surface.
    pub fn new(surface: S) -> Self {
        Self { surface }
    }

    /// The underlying surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Validate, plan and render a single export.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExportError::Validation`] before rendering if the
    /// options are invalid, or the surface's error if rendering fails.
    pub async fn export(
        &self,
        scene: &ExportScene,
        name: &str,
        options: &ExportOptions,
    ) -> ExportResult<ExportOutput> {
        let scene = scene.for_options(options)?;
        let plan = options.plan(&scene)?;
        tracing::debug!(
            job = %name,
            format = %plan.format,
            width = plan.width,
            height = plan.height,
            "rendering export"
        );
        let bytes = self.surface.render(&scene, &plan).await?;
        Ok(ExportOutput {
            name: name.to_string(),
            format: plan.format,
            width: plan.width,
            height: plan.height,
            bytes,
        })
    }

    /// Run jobs one after another, continuing past failures.
    ///
    /// `on_progress` sees every job go pending, then processing, then
    /// completed or error. Successful outputs are collected into the
    /// report's bundle.
    pub async fn export_batch<F>(
        &self,
        scene: &ExportScene,
        jobs: &[ExportJob],
        mut on_progress: F,
    ) -> BatchReport
    where
        F: FnMut(&JobProgress) + Send,
    {
        let total = jobs.len();
        let mut report = |index: usize, name: &str, status: JobStatus, finished: usize| {
            #[allow(clippy::cast_precision_loss)]
            let progress = if total == 0 {
                1.0
            } else {
                finished as f64 / total as f64
            };
            on_progress(&JobProgress {
                index,
                total,
                name: name.to_string(),
                status,
                progress,
            });
        };

        for (index, job) in jobs.iter().enumerate() {
            report(index, &job.name, JobStatus::Pending, 0);
        }

        let mut bundle = ExportBundle::new(total);
        let mut records = Vec::with_capacity(total);
        for (index, job) in jobs.iter().enumerate() {
            report(index, &job.name, JobStatus::Processing, index);
            let status = match self.export(scene, &job.name, &job.options).await {
                Ok(output) => {
                    let bytes = output.size();
                    bundle.add(output);
                    JobStatus::Completed { bytes }
                }
                Err(e) => {
                    tracing::warn!(job = %job.name, error = %e, "export job failed");
                    bundle.record_failure(&job.name, e.to_string());
                    JobStatus::Error {
                        message: e.to_string(),
                    }
                }
            };
            report(index, &job.name, status.clone(), index + 1);
            records.push(JobRecord {
                name: job.name.clone(),
                status,
            });
        }

        let report = BatchReport {
            jobs: records,
            bundle,
        };
        tracing::info!(
            jobs = total,
            completed = report.completed(),
            failed = report.failed(),
            "batch export finished"
        );
        report
    }
}
