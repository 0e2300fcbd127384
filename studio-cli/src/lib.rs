//! # Saorsa Studio CLI
//!
//! Command-line front end over `studio-export`.
//!
//! - `studio export <scene.json>` renders a saved scene in one format or for
//!   a set of store presets and writes a bundle with a manifest.
//! - `studio presets` lists the preset catalogue.
//! - `studio estimate <scene.json>` prints the output size and an
//!   approximate file size.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use studio_core::SceneDocument;
use studio_export::{
    builtin_presets, estimate_size, find_preset, format_bytes, presets_in, ExportFormat,
    ExportJob, ExportOptions, ExportPreset, ExportScene, Exporter, JobStatus, PresetCategory,
    SvgSurface,
};

/// Command-line arguments for `studio`.
#[derive(Debug, Clone, Parser)]
#[command(name = "studio")]
#[command(about = "Saorsa Studio scene exporter")]
#[command(version)]
pub struct CliArgs {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// `studio` subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Export a scene document.
    Export(ExportArgs),
    /// List export presets.
    Presets {
        /// Only list presets in this category.
        #[arg(long)]
        category: Option<PresetCategory>,
    },
    /// Print the output size and estimated file size of an export.
    Estimate {
        /// Scene document (JSON).
        scene: PathBuf,
        /// Export options.
        #[command(flatten)]
        options: OptionArgs,
    },
}

/// Arguments for `studio export`.
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Scene document (JSON).
    pub scene: PathBuf,

    /// Export for a preset; repeatable.
    #[arg(long = "preset", value_name = "ID")]
    pub presets: Vec<String>,

    /// Export for every preset in a category.
    #[arg(long)]
    pub category: Option<PresetCategory>,

    /// Output directory.
    #[arg(long, short, env = "STUDIO_OUT_DIR", default_value = "export")]
    pub out: PathBuf,

    /// Export options.
    #[command(flatten)]
    pub options: OptionArgs,
}

/// Export option overrides, applied over the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct OptionArgs {
    /// JSON file with base export options.
    #[arg(long, env = "STUDIO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format (png, jpg, webp, svg, pdf).
    #[arg(long, short)]
    pub format: Option<ExportFormat>,

    /// Scale factor applied to the canvas size.
    #[arg(long)]
    pub scale: Option<f64>,

    /// Output width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Lossy quality in `[0, 1]`.
    #[arg(long)]
    pub quality: Option<f64>,

    /// Padding around the content, in canvas units.
    #[arg(long)]
    pub padding: Option<f64>,

    /// Leave the backdrop transparent.
    #[arg(long)]
    pub transparent: bool,
}

impl OptionArgs {
    /// Resolve the base options: config file first, then flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub fn resolve(&self) -> anyhow::Result<ExportOptions> {
        let mut options = match &self.config {
            Some(path) => load_options(path)?,
            None => ExportOptions::default(),
        };
        if let Some(format) = self.format {
            options.format = format;
        }
        if let Some(scale) = self.scale {
            options.scale = scale;
        }
        if self.width.is_some() {
            options.width = self.width;
        }
        if self.height.is_some() {
            options.height = self.height;
        }
        if let Some(quality) = self.quality {
            options.quality = quality;
        }
        if let Some(padding) = self.padding {
            options.padding = padding;
        }
        if self.transparent {
            options.include_background = false;
        }
        Ok(options)
    }
}

fn load_options(path: &Path) -> anyhow::Result<ExportOptions> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read export config {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("invalid export config {}", path.display()))
}

fn load_scene(path: &Path) -> anyhow::Result<ExportScene> {
    let document = SceneDocument::load_from_path(path)
        .with_context(|| format!("failed to load scene {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        elements = document.elements.len(),
        "scene loaded"
    );
    Ok(ExportScene::from_document(&document))
}

/// Build the export jobs for `studio export`.
///
/// Presets and categories produce one job each, in the order given. Without
/// either, a single job named after the scene file is produced.
///
/// # Errors
///
/// Returns an error for an unknown preset id or an unreadable config.
pub fn build_jobs(args: &ExportArgs) -> anyhow::Result<Vec<ExportJob>> {
    let base = args.options.resolve()?;
    let mut presets: Vec<ExportPreset> = Vec::new();
    for id in &args.presets {
        presets.push(find_preset(id)?);
    }
    if let Some(category) = args.category {
        presets.extend(presets_in(category));
    }

    if presets.is_empty() {
        let name = args
            .scene
            .file_stem()
            .map_or_else(|| "export".to_string(), |s| s.to_string_lossy().into_owned());
        return Ok(vec![ExportJob::new(name, base)]);
    }
    Ok(presets.iter().map(|p| p.to_job(&base)).collect())
}

/// Run `studio export`. Returns the manifest path.
///
/// # Errors
///
/// Returns an error if the scene cannot be loaded, the bundle cannot be
/// written, or any job failed. Files from successful jobs are written
/// before a job failure is reported.
pub async fn run_export(args: &ExportArgs) -> anyhow::Result<PathBuf> {
    let scene = load_scene(&args.scene)?;
    let jobs = build_jobs(args)?;

    let report = Exporter::new(SvgSurface::new())
        .export_batch(&scene, &jobs, |progress| match &progress.status {
            JobStatus::Completed { bytes } => tracing::info!(
                job = %progress.name,
                size = %format_bytes(u64::try_from(*bytes).unwrap_or(u64::MAX)),
                progress = progress.progress,
                "exported"
            ),
            JobStatus::Error { message } => {
                tracing::error!(job = %progress.name, error = %message, "export failed");
            }
            JobStatus::Pending | JobStatus::Processing => {}
        })
        .await;

    let manifest = report
        .bundle
        .write_to_dir(&args.out)
        .with_context(|| format!("failed to write bundle to {}", args.out.display()))?;

    if report.failed() > 0 {
        anyhow::bail!("{} of {} export jobs failed", report.failed(), report.jobs.len());
    }
    Ok(manifest)
}

/// Render the preset catalogue as a table.
#[must_use]
pub fn preset_table(category: Option<PresetCategory>) -> String {
    let presets = match category {
        Some(category) => presets_in(category),
        None => builtin_presets(),
    };
    let mut out = String::new();
    for preset in presets {
        let _ = writeln!(
            out,
            "{:<24} {:<11} {:>5}x{:<5} {:<4} {}",
            preset.id,
            preset.category.id(),
            preset.width,
            preset.height,
            preset.format.extension(),
            preset.name
        );
    }
    out
}

/// Describe the output of an export without rendering it.
///
/// # Errors
///
/// Returns an error if the scene cannot be loaded or the options are invalid.
pub fn describe_estimate(scene: &Path, options: &OptionArgs) -> anyhow::Result<String> {
    let scene = load_scene(scene)?;
    let options = options.resolve()?;
    let scene = scene.for_options(&options)?;
    let plan = options.plan(&scene)?;
    let bytes = estimate_size(plan.format, plan.width, plan.height, plan.quality);
    Ok(format!(
        "{} {}x{} ~{}",
        plan.format,
        plan.width,
        plan.height,
        format_bytes(bytes)
    ))
}

/// Run a parsed command.
///
/// # Errors
///
/// Returns the first error of the command.
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    match args.command {
        Command::Export(export) => {
            let manifest = run_export(&export).await?;
            println!("{}", manifest.display());
        }
        Command::Presets { category } => print!("{}", preset_table(category)),
        Command::Estimate { scene, options } => {
            println!("{}", describe_estimate(&scene, &options)?);
        }
    }
    Ok(())
}
