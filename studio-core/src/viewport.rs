//! Canvas-wide viewport: logical canvas size, pan/zoom and grid settings.

use serde::{Deserialize, Serialize};

use crate::geometry::{self, Point, Rect, ViewTransform};
use crate::{CanvasError, CanvasResult};

/// Grid overlay and snapping settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridSettings {
    /// Draw the grid.
    pub show: bool,
    /// Grid pitch in canvas units, always positive.
    pub size: f64,
    /// Snap positions to the grid while placing and dragging.
    pub snap: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            show: false,
            size: 20.0,
            snap: false,
        }
    }
}

/// The viewport of an editing session.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasViewport {
    width: f64,
    height: f64,
    view: ViewTransform,
    /// Grid pitch is always finite and positive.
    grid: GridSettings,
    /// Fallback color painted when no background element exists.
    pub background_color: String,
}

impl CanvasViewport {
    /// Create a viewport for a canvas of the given logical size.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] if either dimension is not positive.
    pub fn new(width: f64, height: f64) -> CanvasResult<Self> {
        validate_canvas_size(width, height)?;
        Ok(Self {
            width,
            height,
            view: ViewTransform::default(),
            grid: GridSettings::default(),
            background_color: "#ffffff".to_string(),
        })
    }

    /// Logical canvas width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Logical canvas height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Canvas bounds in canvas space.
    #[must_use]
    pub fn canvas_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Resize the logical canvas.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] if either dimension is not positive.
    pub fn set_canvas_size(&mut self, width: f64, height: f64) -> CanvasResult<()> {
        validate_canvas_size(width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Current zoom and pan.
    #[must_use]
    pub fn view(&self) -> ViewTransform {
        self.view
    }

    /// Current zoom factor.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.view.zoom
    }

    /// Current pan offset in screen pixels.
    #[must_use]
    pub fn offset(&self) -> Point {
        Point::new(self.view.offset_x, self.view.offset_y)
    }

    /// Replace zoom and pan; the zoom is clamped.
    pub fn set_view(&mut self, view: ViewTransform) {
        self.view = ViewTransform {
            zoom: geometry::clamp_zoom(view.zoom),
            ..view
        };
    }

    /// Set the zoom, clamped to the allowed range, keeping the pan offset.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] for non-finite or non-positive requests.
    pub fn set_zoom(&mut self, zoom: f64) -> CanvasResult<f64> {
        validate_zoom(zoom)?;
        self.view.zoom = geometry::clamp_zoom(zoom);
        Ok(self.view.zoom)
    }

    /// Zoom to `zoom` keeping the canvas point under the screen `anchor` fixed.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] for non-finite or non-positive requests.
    pub fn zoom_at(&mut self, anchor: Point, zoom: f64) -> CanvasResult<f64> {
        validate_zoom(zoom)?;
        self.view = self.view.zoomed_about(anchor, zoom);
        Ok(self.view.zoom)
    }

    /// Multiply the zoom by `factor` about a screen anchor.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] if the resulting zoom is unusable.
    pub fn zoom_by(&mut self, anchor: Point, factor: f64) -> CanvasResult<f64> {
        self.zoom_at(anchor, self.view.zoom * factor)
    }

    /// Pan by a screen-space delta. Panning is unbounded.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.view.offset_x += dx;
        self.view.offset_y += dy;
    }

    /// Set the pan offset.
    pub fn set_offset(&mut self, offset_x: f64, offset_y: f64) {
        self.view.offset_x = offset_x;
        self.view.offset_y = offset_y;
    }

    /// Back to 100% with no pan.
    pub fn reset_view(&mut self) {
        self.view = ViewTransform::default();
    }

    /// Zoom and centre so the whole canvas fits a container of screen size
    /// `container_width × container_height`, leaving `padding` on each side.
    pub fn fit_to_container(&mut self, container_width: f64, container_height: f64, padding: f64) {
        let avail_w = (container_width - padding * 2.0).max(1.0);
        let avail_h = (container_height - padding * 2.0).max(1.0);
        let zoom = geometry::clamp_zoom((avail_w / self.width).min(avail_h / self.height));
        self.view = ViewTransform {
            zoom,
            offset_x: self.width.mul_add(-zoom, container_width) / 2.0,
            offset_y: self.height.mul_add(-zoom, container_height) / 2.0,
        };
    }

    /// Map a screen point into canvas space.
    #[must_use]
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        self.view.to_canvas(screen)
    }

    /// Map a canvas point into screen space.
    #[must_use]
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        self.view.to_screen(canvas)
    }

    /// Canvas-space rectangle visible in a screen area of the given size.
    #[must_use]
    pub fn visible_rect(&self, screen_width: f64, screen_height: f64) -> Rect {
        Rect::from_corners(
            self.screen_to_canvas(Point::ZERO),
            self.screen_to_canvas(Point::new(screen_width, screen_height)),
        )
    }

    /// Grid settings.
    #[must_use]
    pub fn grid(&self) -> &GridSettings {
        &self.grid
    }

    /// Change the grid pitch.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] if the size is not positive.
    pub fn set_grid_size(&mut self, size: f64) -> CanvasResult<()> {
        // Reuse the snapping check so both paths report the same error.
        geometry::snap_to_grid(0.0, size)?;
        self.grid.size = size;
        Ok(())
    }

    /// Turn snapping on or off.
    pub fn set_grid_snap(&mut self, snap: bool) {
        self.grid.snap = snap;
    }

    /// Show or hide the grid overlay.
    pub fn set_grid_show(&mut self, show: bool) {
        self.grid.show = show;
    }

    /// Snap a value to the grid if snapping is on.
    #[must_use]
    pub fn snap(&self, value: f64) -> f64 {
        if self.grid.snap {
            (value / self.grid.size).round() * self.grid.size
        } else {
            value
        }
    }

    /// Snap both coordinates of a point.
    #[must_use]
    pub fn snap_point(&self, p: Point) -> Point {
        Point::new(self.snap(p.x), self.snap(p.y))
    }
}

impl Default for CanvasViewport {
    fn default() -> Self {
        Self {
            width: 1080.0,
            height: 1920.0,
            view: ViewTransform::default(),
            grid: GridSettings::default(),
            background_color: "#ffffff".to_string(),
        }
    }
}

fn validate_canvas_size(width: f64, height: f64) -> CanvasResult<()> {
    if !(width.is_finite() && width > 0.0) {
        return Err(CanvasError::invalid_config("width", format!("must be positive, got {width}")));
    }
    if !(height.is_finite() && height > 0.0) {
        return Err(CanvasError::invalid_config("height", format!("must be positive, got {height}")));
    }
    Ok(())
}

fn validate_zoom(zoom: f64) -> CanvasResult<()> {
    if zoom.is_finite() && zoom > 0.0 {
        Ok(())
    } else {
        Err(CanvasError::validation("zoom", format!("must be a positive number, got {zoom}")))
    }
}
