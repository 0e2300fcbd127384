//! Device specifications and frame scaling.
//!
//! A [`DeviceSpec`] describes a device mockup at its nominal pixel size: the
//! outer frame (bezel included) and the content rectangle where the screen
//! lives. The scaler maps that geometry onto whatever size the frame element
//! has on the canvas. Specs are read-only reference data supplied by a
//! catalogue collaborator through [`DeviceLookup`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::{CanvasError, CanvasResult};

/// Device orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Taller than wide.
    #[default]
    Portrait,
    /// Wider than tall.
    Landscape,
}

/// Broad device family, used for grouping in pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCategory {
    /// Phones.
    Phone,
    /// Tablets.
    Tablet,
    /// Laptops.
    Laptop,
    /// Desktop monitors.
    Desktop,
    /// Watches.
    Watch,
}

/// Nominal geometry of a device mockup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSpec {
    /// Catalogue id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Family.
    pub category: DeviceCategory,
    /// Frame width in nominal pixels, bezel included.
    pub frame_width: f64,
    /// Frame height in nominal pixels, bezel included.
    pub frame_height: f64,
    /// Screen rectangle relative to the frame's top-left, in nominal pixels.
    pub content_area: Rect,
    /// Corner radius of the screen in nominal pixels.
    #[serde(default)]
    pub screen_radius: f64,
    /// Smallest on-canvas scale the frame may be placed at.
    pub min_scale: f64,
    /// Largest on-canvas scale the frame may be placed at.
    pub max_scale: f64,
    /// Scale used when the frame is first placed.
    pub default_scale: f64,
    /// Orientation of the nominal geometry.
    #[serde(default)]
    pub orientation: Orientation,
}

impl DeviceSpec {
    /// Check that the geometry is usable for scaling.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> CanvasResult<()> {
        if !(self.frame_width > 0.0 && self.frame_height > 0.0) {
            return Err(CanvasError::invalid_config(
                "frameSize",
                format!("device {} has a non-positive frame size", self.id),
            ));
        }
        if !(self.min_scale > 0.0 && self.min_scale <= self.max_scale) {
            return Err(CanvasError::invalid_config(
                "scaleBounds",
                format!(
                    "device {} needs 0 < minScale <= maxScale, got [{}, {}]",
                    self.id, self.min_scale, self.max_scale
                ),
            ));
        }
        let frame = Rect::new(0.0, 0.0, self.frame_width, self.frame_height);
        if !frame.contains_rect(&self.content_area) {
            return Err(CanvasError::invalid_config(
                "contentArea",
                format!("device {} has a content area outside its frame", self.id),
            ));
        }
        Ok(())
    }

    /// Width over height of the frame.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        self.frame_width / self.frame_height
    }

    /// Frame size at the default scale.
    #[must_use]
    pub fn default_frame_size(&self) -> (f64, f64) {
        (
            self.frame_width * self.default_scale,
            self.frame_height * self.default_scale,
        )
    }

    /// The same device turned a quarter turn clockwise.
    ///
    /// The content area rotates with the frame, so an off-centre notch or
    /// chin stays attached to the same physical edge.
    #[must_use]
    pub fn rotated(&self) -> Self {
        let c = &self.content_area;
        Self {
            frame_width: self.frame_height,
            frame_height: self.frame_width,
            content_area: Rect::new(
                self.frame_height - (c.y + c.height),
                c.x,
                c.height,
                c.width,
            ),
            orientation: match self.orientation {
                Orientation::Portrait => Orientation::Landscape,
                Orientation::Landscape => Orientation::Portrait,
            },
            ..self.clone()
        }
    }

    /// This device in landscape orientation.
    #[must_use]
    pub fn landscape(&self) -> Self {
        match self.orientation {
            Orientation::Portrait => self.rotated(),
            Orientation::Landscape => self.clone(),
        }
    }
}

/// Result of fitting a device frame into a container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSize {
    /// Frame width on the canvas.
    pub width: f64,
    /// Frame height on the canvas.
    pub height: f64,
    /// Uniform scale relative to the nominal frame.
    pub scale: f64,
}

/// Uniform, aspect-preserving scale that fits the nominal frame into
/// `frame_width × frame_height`.
#[must_use]
pub fn frame_scale(device: &DeviceSpec, frame_width: f64, frame_height: f64) -> f64 {
    (frame_width / device.frame_width).min(frame_height / device.frame_height)
}

/// Content rectangle on the canvas for a frame element occupying `frame`.
#[must_use]
pub fn content_rect(device: &DeviceSpec, frame: Rect) -> Rect {
    let scale = frame_scale(device, frame.width, frame.height);
    let area = &device.content_area;
    Rect::new(
        area.x.mul_add(scale, frame.x),
        area.y.mul_add(scale, frame.y),
        area.width * scale,
        area.height * scale,
    )
}

/// Largest frame that fits `(container_width - padding) × (container_height - padding)`,
/// with the scale clamped to the device's bounds.
///
/// When the clamp kicks in the frame may overflow the container (minimum
/// scale) or leave slack (maximum scale); the aspect ratio is always kept.
#[must_use]
pub fn optimal_frame_size(
    device: &DeviceSpec,
    container_width: f64,
    container_height: f64,
    padding: f64,
) -> FrameSize {
    let available_w = (container_width - padding).max(0.0);
    let available_h = (container_height - padding).max(0.0);
    let fit = frame_scale(device, available_w, available_h);
    let scale = if fit.is_finite() {
        fit.clamp(device.min_scale, device.max_scale)
    } else {
        device.min_scale
    };
    FrameSize {
        width: device.frame_width * scale,
        height: device.frame_height * scale,
        scale,
    }
}

/// Read-only access to device specifications keyed by id.
pub trait DeviceLookup {
    /// Look up a device.
    fn device(&self, id: &str) -> Option<&DeviceSpec>;

    /// Look up a device, failing with [`CanvasError::UnknownDevice`].
    ///
    /// # Errors
    ///
    /// Returns an error if the id is not present.
    fn require(&self, id: &str) -> CanvasResult<&DeviceSpec> {
        self.device(id)
            .ok_or_else(|| CanvasError::UnknownDevice(id.to_string()))
    }
}

impl DeviceLookup for HashMap<String, DeviceSpec> {
    fn device(&self, id: &str) -> Option<&DeviceSpec> {
        self.get(id)
    }
}

impl DeviceLookup for [DeviceSpec] {
    fn device(&self, id: &str) -> Option<&DeviceSpec> {
        self.iter().find(|d| d.id == id)
    }
}

impl DeviceLookup for Vec<DeviceSpec> {
    fn device(&self, id: &str) -> Option<&DeviceSpec> {
        self.as_slice().device(id)
    }
}

fn spec(
    id: &str,
    name: &str,
    category: DeviceCategory,
    frame: (f64, f64),
    content: Rect,
    screen_radius: f64,
    scales: (f64, f64, f64),
) -> DeviceSpec {
    DeviceSpec {
        id: id.to_string(),
        name: name.to_string(),
        category,
        frame_width: frame.0,
        frame_height: frame.1,
        content_area: content,
        screen_radius,
        min_scale: scales.0,
        max_scale: scales.1,
        default_scale: scales.2,
        orientation: if frame.0 > frame.1 {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        },
    }
}

/// A small built-in catalogue of common devices.
#[must_use]
pub fn builtin_devices() -> HashMap<String, DeviceSpec> {
    [
        spec(
            "iphone-15-pro",
            "iPhone 15 Pro",
            DeviceCategory::Phone,
            (1419.0, 2796.0),
            Rect::new(69.0, 66.0, 1281.0, 2664.0),
            165.0,
            (0.05, 1.0, 0.2),
        ),
        spec(
            "pixel-8",
            "Pixel 8",
            DeviceCategory::Phone,
            (1230.0, 2560.0),
            Rect::new(75.0, 80.0, 1080.0, 2400.0),
            120.0,
            (0.05, 1.0, 0.22),
        ),
        spec(
            "ipad-pro-13",
            "iPad Pro 13\"",
            DeviceCategory::Tablet,
            (2232.0, 2912.0),
            Rect::new(84.0, 84.0, 2064.0, 2752.0),
            60.0,
            (0.05, 1.0, 0.15),
        ),
        spec(
            "macbook-pro-14",
            "MacBook Pro 14\"",
            DeviceCategory::Laptop,
            (3840.0, 2420.0),
            Rect::new(408.0, 90.0, 3024.0, 1964.0),
            20.0,
            (0.03, 0.6, 0.12),
        ),
        spec(
            "apple-watch-45",
            "Apple Watch 45mm",
            DeviceCategory::Watch,
            (484.0, 574.0),
            Rect::new(38.0, 38.0, 396.0, 484.0),
            80.0,
            (0.1, 2.0, 0.5),
        ),
    ]
    .into_iter()
    .map(|d| (d.id.clone(), d))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone() -> DeviceSpec {
        spec(
            "test-phone",
            "Test Phone",
            DeviceCategory::Phone,
            (400.0, 800.0),
            Rect::new(20.0, 40.0, 360.0, 720.0),
            10.0,
            (0.1, 2.0, 0.5),
        )
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_frame_scale_is_uniform_minimum() {
        let device = phone();
        assert!(approx(frame_scale(&device, 200.0, 800.0), 0.5));
        assert!(approx(frame_scale(&device, 800.0, 400.0), 0.5));
    }

    #[test]
    fn test_content_rect_maps_into_frame() {
        let device = phone();
        let content = content_rect(&device, Rect::new(100.0, 50.0, 200.0, 400.0));
        assert_eq!(content, Rect::new(110.0, 70.0, 180.0, 360.0));
    }

    #[test]
    fn test_optimal_frame_size_fits_container() {
        let device = phone();
        let size = optimal_frame_size(&device, 540.0, 840.0, 40.0);
        assert!(approx(size.scale, 1.0));
        assert!(approx(size.width, 400.0));
        assert!(approx(size.height, 800.0));
    }

    #[test]
    fn test_optimal_frame_size_clamps_scale() {
        let device = phone();
        let large = optimal_frame_size(&device, 10_000.0, 10_000.0, 0.0);
        assert!(approx(large.scale, 2.0));
        let tiny = optimal_frame_size(&device, 10.0, 10.0, 40.0);
        assert!(approx(tiny.scale, 0.1));
        assert!(approx(tiny.width / tiny.height, device.aspect_ratio()));
    }

    #[test]
    fn test_rotated_moves_content_area() {
        let device = phone();
        let landscape = device.landscape();
        assert_eq!(landscape.orientation, Orientation::Landscape);
        assert!(approx(landscape.frame_width, 800.0));
        assert!(approx(landscape.frame_height, 400.0));
        // Top bezel (y = 40) becomes the right-hand bezel.
        assert_eq!(landscape.content_area, Rect::new(40.0, 20.0, 720.0, 360.0));
        landscape.validate().expect("still valid");
        assert_eq!(landscape.landscape(), landscape);
    }

    #[test]
    fn test_validate_rejects_bad_geometry() {
        let mut device = phone();
        device.content_area = Rect::new(100.0, 100.0, 400.0, 400.0);
        assert_eq!(device.validate().expect_err("outside").field(), Some("contentArea"));

        let mut device = phone();
        device.min_scale = 3.0;
        assert_eq!(device.validate().expect_err("bounds").field(), Some("scaleBounds"));
    }

    #[test]
    fn test_builtin_catalogue_is_valid() {
        let devices = builtin_devices();
        assert!(devices.len() >= 5);
        for device in devices.values() {
            device.validate().expect("builtin device valid");
        }
        assert!(devices.device("iphone-15-pro").is_some());
        assert!(matches!(
            devices.require("nokia-3310"),
            Err(CanvasError::UnknownDevice(_))
        ));
    }
}
