//! Export formats, options and dimension resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use studio_core::Rect;

use crate::error::{ExportError, ExportResult};
use crate::scene::ExportScene;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PNG image.
    #[default]
    Png,
    /// JPEG image.
    #[serde(alias = "jpeg")]
    Jpg,
    /// WebP image.
    Webp,
    /// SVG vector graphics.
    Svg,
    /// PDF document with an embedded raster page.
    Pdf,
}

impl ExportFormat {
    /// Every format, in menu order.
    pub const ALL: [Self; 5] = [Self::Png, Self::Jpg, Self::Webp, Self::Svg, Self::Pdf];

    /// MIME type of the payload.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Svg => "image/svg+xml",
            Self::Pdf => "application/pdf",
        }
    }

    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Webp => "webp",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
        }
    }

    /// Whether the format is a raster image (quality applies).
    #[must_use]
    pub const fn is_raster(self) -> bool {
        matches!(self, Self::Png | Self::Jpg | Self::Webp)
    }

    /// Whether the format can carry an alpha channel.
    #[must_use]
    pub const fn supports_transparency(self) -> bool {
        matches!(self, Self::Png | Self::Webp | Self::Svg)
    }

    /// Largest width or height the format accepts, in pixels.
    #[must_use]
    pub const fn max_dimension(self) -> u32 {
        match self {
            Self::Png => 16_384,
            Self::Jpg => 65_535,
            Self::Webp => 16_383,
            Self::Svg => 32_768,
            // 200 inches at 72 dpi
            Self::Pdf => 14_400,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpg),
            "webp" => Ok(Self::Webp),
            "svg" => Ok(Self::Svg),
            "pdf" => Ok(Self::Pdf),
            other => Err(ExportError::validation(
                "format",
                format!("unsupported format '{other}'"),
            )),
        }
    }
}

/// Options for a single export.
///
/// Every field has a default, so `{}` is a valid PNG export at 1x.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Output format.
    pub format: ExportFormat,
    /// Encoder quality in `[0, 1]`; used by lossy raster formats and estimates.
    pub quality: f64,
    /// Multiplier applied to the canvas size when no override is given.
    pub scale: f64,
    /// Explicit output width in pixels.
    pub width: Option<u32>,
    /// Explicit output height in pixels.
    pub height: Option<u32>,
    /// Paint the backdrop. When false the output is transparent where the
    /// format allows it.
    pub include_background: bool,
    /// Backdrop color overriding the canvas fallback color.
    pub background_color: Option<String>,
    /// Margin around the exported region in canvas units.
    pub padding: f64,
    /// Export only the selected elements, cropped to their bounds.
    pub selected_only: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: 0.92,
            scale: 1.0,
            width: None,
            height: None,
            include_background: true,
            background_color: None,
            padding: 0.0,
            selected_only: false,
        }
    }
}

/// A validated export, ready for a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    /// Output format.
    pub format: ExportFormat,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Encoder quality in `[0, 1]`.
    pub quality: f64,
    /// Canvas region mapped onto the output, padding included.
    pub view: Rect,
    /// Backdrop color, or `None` for a transparent backdrop.
    pub backdrop: Option<String>,
}

impl ExportOptions {
    /// Options for a format with everything else defaulted.
    #[must_use]
    pub fn for_format(format: ExportFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    /// Set an explicit output size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the scale multiplier.
    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Set the encoder quality.
    #[must_use]
    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = quality;
        self
    }

    /// Check option ranges that do not depend on the scene.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Validation`] naming the first offending option.
    pub fn validate(&self) -> ExportResult<()> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(ExportError::validation("scale", "must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(ExportError::validation("quality", "must be between 0 and 1"));
        }
        if self.width == Some(0) {
            return Err(ExportError::validation("width", "must be greater than 0"));
        }
        if self.height == Some(0) {
            return Err(ExportError::validation("height", "must be greater than 0"));
        }
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return Err(ExportError::validation(
                "padding",
                "must be a non-negative number",
            ));
        }
        Ok(())
    }

    /// Output size for a region of `content_width × content_height` canvas units.
    ///
    /// Explicit overrides win. A single override keeps the region's aspect
    /// ratio; otherwise the padded region is multiplied by `scale`.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Validation`] if the options are invalid or the
    /// result exceeds the format's maximum size.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn resolve_dimensions(
        &self,
        content_width: f64,
        content_height: f64,
    ) -> ExportResult<(u32, u32)> {
        self.validate()?;
        let base_w = self.padding.mul_add(2.0, content_width);
        let base_h = self.padding.mul_add(2.0, content_height);
        if !(base_w > 0.0 && base_h > 0.0) {
            return Err(ExportError::validation(
                "width",
                "exported region is empty",
            ));
        }

        let to_px = |value: f64| (value.round() as u32).max(1);
        let (width, height) = match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, to_px(f64::from(w) * base_h / base_w)),
            (None, Some(h)) => (to_px(f64::from(h) * base_w / base_h), h),
            (None, None) => (to_px(base_w * self.scale), to_px(base_h * self.scale)),
        };

        let max = self.format.max_dimension();
        if width > max {
            return Err(ExportError::validation(
                "width",
                format!("{width}px exceeds the {} limit of {max}px", self.format),
            ));
        }
        if height > max {
            return Err(ExportError::validation(
                "height",
                format!("{height}px exceeds the {} limit of {max}px", self.format),
            ));
        }
        Ok((width, height))
    }

    /// Validate against a scene and fix the output geometry.
    ///
    /// The scene should already be narrowed with
    /// [`ExportScene::for_options`].
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Validation`] naming the offending option.
    pub fn plan(&self, scene: &ExportScene) -> ExportResult<ExportPlan> {
        let region = scene.region();
        let (width, height) = self.resolve_dimensions(region.width, region.height)?;
        let backdrop = self.include_background.then(|| {
            self.background_color
                .clone()
                .unwrap_or_else(|| scene.background_color().to_string())
        });
        Ok(ExportPlan {
            format: self.format,
            width,
            height,
            quality: self.quality,
            view: region.expand(self.padding),
            backdrop,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing_and_metadata() {
        assert_eq!("JPEG".parse::<ExportFormat>().expect("jpeg"), ExportFormat::Jpg);
        assert_eq!(ExportFormat::Webp.mime_type(), "image/webp");
        assert_eq!(ExportFormat::Svg.extension(), "svg");
        assert!(!ExportFormat::Pdf.is_raster());
        let err = "tiff".parse::<ExportFormat>().expect_err("unsupported");
        assert_eq!(err.field(), Some("format"));
    }

    #[test]
    fn test_format_serde_accepts_jpeg_alias() {
        let format: ExportFormat = serde_json::from_str("\"jpeg\"").expect("alias");
        assert_eq!(format, ExportFormat::Jpg);
        assert_eq!(serde_json::to_string(&format).expect("json"), "\"jpg\"");
    }

    #[test]
    fn test_empty_json_is_default_options() {
        let options: ExportOptions = serde_json::from_str("{}").expect("defaults");
        assert_eq!(options, ExportOptions::default());
        options.validate().expect("defaults are valid");
    }

    #[test]
    fn test_validation_names_field() {
        let cases = [
            (ExportOptions::default().with_scale(0.0), "scale"),
            (ExportOptions::default().with_scale(f64::NAN), "scale"),
            (ExportOptions::default().with_quality(1.5), "quality"),
            (ExportOptions::default().with_quality(-0.1), "quality"),
            (ExportOptions::default().with_size(0, 10), "width"),
            (ExportOptions::default().with_size(10, 0), "height"),
            (
                ExportOptions {
                    padding: -1.0,
                    ..ExportOptions::default()
                },
                "padding",
            ),
        ];
        for (options, field) in cases {
            let err = options.validate().expect_err("invalid");
            assert_eq!(err.field(), Some(field), "{options:?}");
        }
    }

    #[test]
    fn test_override_wins_over_scale() {
        let options = ExportOptions::default().with_size(1080, 1920).with_scale(3.0);
        assert_eq!(options.resolve_dimensions(500.0, 500.0).expect("dims"), (1080, 1920));
    }

    #[test]
    fn test_scale_multiplies_canvas() {
        let options = ExportOptions::default().with_scale(2.0);
        assert_eq!(options.resolve_dimensions(800.0, 600.0).expect("dims"), (1600, 1200));
    }

    #[test]
    fn test_single_override_keeps_aspect() {
        let options = ExportOptions {
            width: Some(540),
            ..ExportOptions::default()
        };
        assert_eq!(options.resolve_dimensions(1080.0, 1920.0).expect("dims"), (540, 960));

        let options = ExportOptions {
            height: Some(100),
            ..ExportOptions::default()
        };
        assert_eq!(options.resolve_dimensions(400.0, 200.0).expect("dims"), (200, 100));
    }

    #[test]
    fn test_padding_added_before_scale() {
        let options = ExportOptions {
            padding: 10.0,
            scale: 2.0,
            ..ExportOptions::default()
        };
        assert_eq!(options.resolve_dimensions(100.0, 50.0).expect("dims"), (240, 140));
    }

    #[test]
    fn test_max_dimension_enforced_per_format() {
        let png = ExportOptions::default().with_size(16_385, 100);
        assert_eq!(
            png.resolve_dimensions(1.0, 1.0).expect_err("too wide").field(),
            Some("width")
        );

        let jpg = ExportOptions::for_format(ExportFormat::Jpg).with_size(16_385, 100);
        jpg.resolve_dimensions(1.0, 1.0).expect("jpg allows larger");

        let pdf = ExportOptions::for_format(ExportFormat::Pdf).with_scale(20.0);
        assert_eq!(
            pdf.resolve_dimensions(500.0, 1000.0).expect_err("too tall").field(),
            Some("height")
        );
    }

    #[test]
    fn test_png_1080_by_1920_is_valid() {
        let options = ExportOptions::default()
            .with_size(1080, 1920)
            .with_quality(0.9);
        assert_eq!(options.resolve_dimensions(1080.0, 1920.0).expect("dims"), (1080, 1920));
    }
}
