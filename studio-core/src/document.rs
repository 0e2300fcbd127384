//! Scene persistence format.
//!
//! A [`SceneDocument`] is the JSON shape an editing session is saved as:
//!
//! ```json
//! {
//!   "canvas": { "width": 1080, "height": 1920, "backgroundColor": "#ffffff", "grid": { ... } },
//!   "elements": [ ... ],
//!   "version": 1,
//!   "timestamp": 1700000000000
//! }
//! ```
//!
//! Zoom and pan are view state and are not persisted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::element::CanvasElement;
use crate::store::current_timestamp_ms;
use crate::viewport::{CanvasViewport, GridSettings};
use crate::{CanvasError, CanvasResult};

/// Newest document version this build reads and the one it writes.
pub const CURRENT_VERSION: u32 = 1;

fn current_version() -> u32 {
    CURRENT_VERSION
}

/// Canvas-wide settings stored with a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasDocument {
    /// Logical canvas width.
    pub width: f64,
    /// Logical canvas height.
    pub height: f64,
    /// Fallback backdrop color.
    #[serde(default = "default_background")]
    pub background_color: String,
    /// Grid settings.
    #[serde(default)]
    pub grid: GridSettings,
}

fn default_background() -> String {
    "#ffffff".to_string()
}

impl CanvasDocument {
    /// Persistent fields of a viewport.
    #[must_use]
    pub fn from_viewport(viewport: &CanvasViewport) -> Self {
        Self {
            width: viewport.width(),
            height: viewport.height(),
            background_color: viewport.background_color.clone(),
            grid: viewport.grid().clone(),
        }
    }

    /// Write these settings onto a viewport, leaving zoom and pan alone.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] if the canvas or grid size is not
    /// positive; the viewport is unchanged.
    pub fn apply_to(&self, viewport: &mut CanvasViewport) -> CanvasResult<()> {
        let mut next = viewport.clone();
        next.set_canvas_size(self.width, self.height)?;
        next.set_grid_size(self.grid.size)?;
        next.set_grid_show(self.grid.show);
        next.set_grid_snap(self.grid.snap);
        next.background_color.clone_from(&self.background_color);
        *viewport = next;
        Ok(())
    }
}

/// A saved scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Canvas settings.
    pub canvas: CanvasDocument,
    /// Elements in paint order.
    pub elements: Vec<CanvasElement>,
    /// Format version.
    #[serde(default = "current_version")]
    pub version: u32,
    /// Save time in milliseconds since the Unix epoch.
    #[serde(default)]
    pub timestamp: u64,
}

impl SceneDocument {
    /// Capture a viewport and element list. Elements are stored in paint
    /// order, so z order survives a round trip even when indices tie.
    #[must_use]
    pub fn capture(viewport: &CanvasViewport, elements: &[CanvasElement]) -> Self {
        let mut elements = elements.to_vec();
        elements.sort_by_key(|el| el.z_index);
        Self {
            canvas: CanvasDocument::from_viewport(viewport),
            elements,
            version: CURRENT_VERSION,
            timestamp: current_timestamp_ms(),
        }
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document, rejecting versions newer than [`CURRENT_VERSION`].
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the version is unsupported.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let document: Self = serde_json::from_str(json)?;
        if document.version > CURRENT_VERSION {
            return Err(CanvasError::UnsupportedVersion {
                found: document.version,
                supported: CURRENT_VERSION,
            });
        }
        Ok(document)
    }

    /// Write the document to a file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> CanvasResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        tracing::debug!(path = %path.display(), elements = self.elements.len(), "scene saved");
        Ok(())
    }

    /// Read a document from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_path(path: impl AsRef<Path>) -> CanvasResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "failed to read scene");
            e
        })?;
        let document = Self::from_json(&contents)?;
        tracing::debug!(path = %path.display(), elements = document.elements.len(), "scene loaded");
        Ok(document)
    }

    /// Viewport described by the canvas settings, at 100% with no pan.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] if the canvas settings are invalid.
    pub fn viewport(&self) -> CanvasResult<CanvasViewport> {
        let mut viewport = CanvasViewport::new(self.canvas.width, self.canvas.height)?;
        self.canvas.apply_to(&mut viewport)?;
        Ok(viewport)
    }
}
