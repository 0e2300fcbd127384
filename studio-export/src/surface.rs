//! Rendering surfaces.
//!
//! The pipeline never draws pixels itself: it hands a frozen scene and a
//! validated plan to a [`RenderSurface`]. [`SvgSurface`] is the built-in
//! implementation; hosts with their own renderer implement the trait.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use studio_core::{builtin_devices, DeviceSpec};

use crate::error::{ExportError, ExportResult};
use crate::options::{ExportFormat, ExportPlan};
use crate::scene::ExportScene;
use crate::svg::render_svg;

/// Something that turns a scene into an encoded payload.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// Render `scene` as described by `plan` and return the encoded bytes.
    async fn render(&self, scene: &ExportScene, plan: &ExportPlan) -> ExportResult<Vec<u8>>;
}

/// Built-in surface: serializes the scene to SVG, then rasterizes with
/// resvg for PNG, JPEG, WebP and PDF.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    devices: Arc<HashMap<String, DeviceSpec>>,
}

impl Default for SvgSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgSurface {
    /// Surface using the built-in device catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::with_devices(builtin_devices())
    }

    /// Surface using a caller-supplied device catalogue.
    #[must_use]
    pub fn with_devices(devices: HashMap<String, DeviceSpec>) -> Self {
        Self {
            devices: Arc::new(devices),
        }
    }

    /// The SVG document for a plan, regardless of the plan's format.
    #[must_use]
    pub fn render_svg(&self, scene: &ExportScene, plan: &ExportPlan) -> String {
        render_svg(scene, plan, self.devices.as_ref())
    }

    /// Render and encode on the current thread.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Render`] or [`ExportError::Encode`] if the
    /// image cannot be produced.
    pub fn render_blocking(&self, scene: &ExportScene, plan: &ExportPlan) -> ExportResult<Vec<u8>> {
        let svg = self.render_svg(scene, plan);
        match plan.format {
            ExportFormat::Svg => Ok(svg.into_bytes()),
            _ => encode_raster(&svg, plan),
        }
    }
}

#[cfg(feature = "raster")]
fn encode_raster(svg: &str, plan: &ExportPlan) -> ExportResult<Vec<u8>> {
    crate::raster::encode(svg, plan)
}

#[cfg(not(feature = "raster"))]
fn encode_raster(_svg: &str, plan: &ExportPlan) -> ExportResult<Vec<u8>> {
    Err(ExportError::Render(format!(
        "{} export requires the `raster` feature",
        plan.format
    )))
}

#[async_trait]
impl RenderSurface for SvgSurface {
    async fn render(&self, scene: &ExportScene, plan: &ExportPlan) -> ExportResult<Vec<u8>> {
        let surface = self.clone();
        let scene = scene.clone();
        let plan = plan.clone();
        tokio::task::spawn_blocking(move || surface.render_blocking(&scene, &plan))
            .await
            .map_err(|e| ExportError::Render(format!("render task failed: {e}")))?
    }
}
