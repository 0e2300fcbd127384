//! # Saorsa Studio Export
//!
//! Turns a canvas scene into delivery files.
//!
//! ## Pipeline
//!
//! 1. Snapshot: [`ExportScene`] deep-copies the store, so later edits are
//!    never observed by a running export.
//! 2. Plan: [`ExportOptions::plan`] validates options and resolves the output
//!    size (explicit width/height, else canvas size × scale).
//! 3. Render: a [`RenderSurface`] encodes the scene. [`SvgSurface`] produces
//!    SVG directly and rasterizes it for PNG, JPEG, WebP and PDF.
//! 4. Deliver: batches collect outputs into an [`ExportBundle`] with a
//!    manifest.
//!
//! ```no_run
//! # async fn demo() -> studio_export::ExportResult<()> {
//! use studio_core::ElementStore;
//! use studio_export::{builtin_presets, ExportOptions, ExportScene, Exporter, SvgSurface};
//!
//! let store = ElementStore::default();
//! let scene = ExportScene::from_store(&store);
//! let jobs: Vec<_> = builtin_presets()
//!     .iter()
//!     .map(|preset| preset.to_job(&ExportOptions::default()))
//!     .collect();
//!
//! let report = Exporter::new(SvgSurface::new())
//!     .export_batch(&scene, &jobs, |progress| println!("{}: {:?}", progress.name, progress.status))
//!     .await;
//! report.bundle.write_to_dir("out")?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod bundle;
pub mod error;
pub mod estimate;
pub mod options;
pub mod pipeline;
pub mod preset;
pub mod queue;
#[cfg(feature = "raster")]
mod raster;
pub mod scene;
pub mod surface;
mod svg;

pub use bundle::{
    sanitize_filename, BundleFile, BundleManifest, ExportBundle, ManifestFailure, ManifestFile,
    MANIFEST_FILE,
};
pub use error::{ExportError, ExportResult};
pub use estimate::{estimate_size, format_bytes, PDF_OVERHEAD_BYTES, SVG_ESTIMATE_BYTES};
pub use options::{ExportFormat, ExportOptions, ExportPlan};
pub use pipeline::{
    BatchReport, ExportJob, ExportOutput, Exporter, JobProgress, JobRecord, JobStatus,
};
pub use preset::{builtin_presets, find_preset, presets_in, ExportPreset, PresetCategory};
pub use queue::{ExportQueue, JobHandle, JobId};
pub use scene::{ExportScene, PaintItem, Screen};
pub use surface::{RenderSurface, SvgSurface};

/// Studio export version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
