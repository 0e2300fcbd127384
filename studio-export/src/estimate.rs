//! Output size estimation.
//!
//! Estimates are rough upper bounds shown before exporting, not predictions
//! of the encoder's output.

use crate::error::ExportResult;
use crate::options::{ExportFormat, ExportOptions};

/// Fixed estimate for SVG output, whose true size depends on content.
pub const SVG_ESTIMATE_BYTES: u64 = 50 * 1024;

/// Document structure overhead added to PDF estimates.
pub const PDF_OVERHEAD_BYTES: u64 = 10 * 1024;

/// Estimated payload size in bytes for an output of `width × height` pixels.
///
/// - png: `pixels × 4`
/// - jpg: `pixels × 3 × quality`
/// - webp: `pixels × 3 × quality × 0.8`
/// - pdf: `pixels × 3 × quality + overhead`
/// - svg: a constant
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn estimate_size(format: ExportFormat, width: u32, height: u32, quality: f64) -> u64 {
    let pixels = u64::from(width) * u64::from(height);
    let quality = quality.clamp(0.0, 1.0);
    let lossy = |factor: f64| (pixels as f64 * 3.0 * quality * factor).round() as u64;
    match format {
        ExportFormat::Png => pixels * 4,
        ExportFormat::Jpg => lossy(1.0),
        ExportFormat::Webp => lossy(0.8),
        ExportFormat::Pdf => lossy(1.0) + PDF_OVERHEAD_BYTES,
        ExportFormat::Svg => SVG_ESTIMATE_BYTES,
    }
}

impl ExportOptions {
    /// Validate and estimate the output size for a region of the given
    /// canvas size.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExportError::Validation`] if the options are invalid.
    pub fn estimate_size(&self, content_width: f64, content_height: f64) -> ExportResult<u64> {
        let (width, height) = self.resolve_dimensions(content_width, content_height)?;
        Ok(estimate_size(self.format, width, height, self.quality))
    }
}

/// Human-readable byte count using binary multiples, e.g. `1.5 KB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_estimate_is_four_bytes_per_pixel() {
        assert_eq!(estimate_size(ExportFormat::Png, 1080, 1920, 0.9), 1080 * 1920 * 4);
    }

    #[test]
    fn test_lossy_estimates_scale_with_quality() {
        assert_eq!(estimate_size(ExportFormat::Jpg, 100, 100, 0.5), 15_000);
        assert_eq!(estimate_size(ExportFormat::Webp, 100, 100, 0.5), 12_000);
        assert_eq!(
            estimate_size(ExportFormat::Pdf, 100, 100, 1.0),
            30_000 + PDF_OVERHEAD_BYTES
        );
        assert_eq!(estimate_size(ExportFormat::Jpg, 100, 100, 0.0), 0);
    }

    #[test]
    fn test_svg_estimate_is_constant() {
        assert_eq!(estimate_size(ExportFormat::Svg, 1, 1, 1.0), SVG_ESTIMATE_BYTES);
        assert_eq!(estimate_size(ExportFormat::Svg, 4000, 4000, 0.1), SVG_ESTIMATE_BYTES);
    }

    #[test]
    fn test_options_estimate_uses_resolved_size() {
        let options = ExportOptions::default().with_scale(2.0);
        assert_eq!(options.estimate_size(100.0, 50.0).expect("estimate"), 200 * 100 * 4);
        assert!(options.with_quality(2.0).estimate_size(100.0, 50.0).is_err());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1080 * 1920 * 4), "7.91 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3 GB");
    }
}
