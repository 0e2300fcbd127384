//! Delivery bundles: named payloads plus a manifest.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ExportResult;
use crate::pipeline::ExportOutput;

/// Name of the manifest written next to the bundle files.
pub const MANIFEST_FILE: &str = "manifest.json";

/// One file in a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
    /// Unique, filesystem-safe filename.
    pub filename: String,
    /// The export it came from.
    pub output: ExportOutput,
}

/// Manifest entry for a delivered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestFile {
    /// Filename within the bundle.
    pub filename: String,
    /// Job that produced it.
    pub job: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: usize,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
}

/// Manifest entry for a job that produced no file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFailure {
    /// Job name.
    pub job: String,
    /// Failure description.
    pub message: String,
}

/// Bundle manifest, serialized as `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleManifest {
    /// Number of jobs submitted, failed ones included.
    pub job_count: usize,
    /// Delivered files.
    pub files: Vec<ManifestFile>,
    /// Jobs that failed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ManifestFailure>,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// A set of export payloads ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    job_count: usize,
    files: Vec<BundleFile>,
    failures: Vec<ManifestFailure>,
    taken: HashSet<String>,
    timestamp: u64,
}

impl ExportBundle {
    /// Empty bundle for a batch of `job_count` jobs.
    #[must_use]
    pub fn new(job_count: usize) -> Self {
        Self {
            job_count,
            files: Vec::new(),
            failures: Vec::new(),
            taken: HashSet::new(),
            timestamp: current_timestamp_ms(),
        }
    }

    /// Add an output under a filename derived from its job name. Returns the
    /// filename, which is unique within the bundle.
    pub fn add(&mut self, output: ExportOutput) -> &str {
        let stem = sanitize_filename(&output.name);
        let ext = output.format.extension();
        let mut filename = format!("{stem}.{ext}");
        let mut n = 2;
        while self.taken.contains(&filename) {
            filename = format!("{stem}-{n}.{ext}");
            n += 1;
        }
        self.taken.insert(filename.clone());
        self.files.push(BundleFile { filename, output });
        &self.files[self.files.len() - 1].filename
    }

    /// Note a job that produced no file.
    pub fn record_failure(&mut self, job: &str, message: impl Into<String>) {
        self.failures.push(ManifestFailure {
            job: job.to_string(),
            message: message.into(),
        });
    }

    /// Files in insertion order.
    #[must_use]
    pub fn files(&self) -> &[BundleFile] {
        &self.files
    }

    /// `(filename, payload)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files
            .iter()
            .map(|f| (f.filename.as_str(), f.output.bytes.as_slice()))
    }

    /// Whether the bundle holds no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Describe the bundle.
    #[must_use]
    pub fn manifest(&self) -> BundleManifest {
        BundleManifest {
            job_count: self.job_count,
            files: self
                .files
                .iter()
                .map(|f| ManifestFile {
                    filename: f.filename.clone(),
                    job: f.output.name.clone(),
                    mime_type: f.output.mime_type().to_string(),
                    size: f.output.size(),
                    width: f.output.width,
                    height: f.output.height,
                })
                .collect(),
            failures: self.failures.clone(),
            timestamp: self.timestamp,
        }
    }

    /// Write every file and `manifest.json` into `dir`, creating it if
    /// needed. Returns the manifest path.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> ExportResult<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        for (filename, bytes) in self.entries() {
            std::fs::write(dir.join(filename), bytes)?;
        }
        let manifest_path = dir.join(MANIFEST_FILE);
        std::fs::write(&manifest_path, serde_json::to_string_pretty(&self.manifest())?)?;
        tracing::info!(
            dir = %dir.display(),
            files = self.files.len(),
            "export bundle written"
        );
        Ok(manifest_path)
    }
}

/// Reduce a job name to a safe filename stem: lowercase ASCII letters,
/// digits, `-` and `_`, with other runs collapsed to a single `-`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.ends_with('-') {
            stem.push('-');
        }
    }
    let stem = stem.trim_matches('-');
    if stem.is_empty() {
        "export".to_string()
    } else {
        stem.to_string()
    }
}

fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
