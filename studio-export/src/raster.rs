//! Rasterization of the SVG intermediate and encoding to PNG, JPEG, WebP and PDF.

use std::sync::{Arc, OnceLock};

use image::ImageEncoder;

use crate::error::{ExportError, ExportResult};
use crate::options::ExportPlan;

/// Pixels per inch used to size PDF pages.
const PDF_DPI: f32 = 72.0;

/// System fonts, loaded on first use and shared by every export.
fn system_fonts() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "system fonts loaded");
            Arc::new(db)
        })
        .clone()
}

/// Rasterize an SVG document to a pixmap of the plan's size.
///
/// Letterboxed areas (explicit sizes with a different aspect ratio) are
/// filled with the backdrop color.
pub(crate) fn rasterize_svg(svg: &str, plan: &ExportPlan) -> ExportResult<tiny_skia::Pixmap> {
    let opt = usvg::Options {
        fontdb: system_fonts(),
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &opt)
        .map_err(|e| ExportError::Render(format!("SVG parsing failed: {e}")))?;

    let mut pixmap = tiny_skia::Pixmap::new(plan.width.max(1), plan.height.max(1))
        .ok_or_else(|| ExportError::Render("Failed to create pixmap".to_string()))?;
    if let Some([r, g, b, a]) = plan.backdrop.as_deref().and_then(parse_hex_color) {
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
    }

    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Encode a rendered SVG document in the plan's raster or document format.
pub(crate) fn encode(svg: &str, plan: &ExportPlan) -> ExportResult<Vec<u8>> {
    use crate::options::ExportFormat;

    let pixmap = rasterize_svg(svg, plan)?;
    match plan.format {
        ExportFormat::Png => pixmap
            .encode_png()
            .map_err(|e| ExportError::Encode(format!("PNG encoding failed: {e}"))),
        ExportFormat::Jpg => encode_jpeg(&pixmap, plan),
        ExportFormat::Webp => encode_webp(&pixmap),
        ExportFormat::Pdf => encode_pdf(&pixmap, plan),
        ExportFormat::Svg => Ok(svg.as_bytes().to_vec()),
    }
}

/// Flatten premultiplied RGBA onto an opaque color.
fn flatten(pixmap: &tiny_skia::Pixmap, plan: &ExportPlan) -> Vec<u8> {
    let [bg_r, bg_g, bg_b, _] = plan
        .backdrop
        .as_deref()
        .and_then(parse_hex_color)
        .unwrap_or([255, 255, 255, 255]);
    let mut rgb = Vec::with_capacity(pixmap.data().len() / 4 * 3);
    for pixel in pixmap.pixels() {
        let inv = 255 - u16::from(pixel.alpha());
        for (channel, bg) in [(pixel.red(), bg_r), (pixel.green(), bg_g), (pixel.blue(), bg_b)] {
            let value = u16::from(channel) + u16::from(bg) * inv / 255;
            rgb.push(u8::try_from(value).unwrap_or(u8::MAX));
        }
    }
    rgb
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn encode_jpeg(pixmap: &tiny_skia::Pixmap, plan: &ExportPlan) -> ExportResult<Vec<u8>> {
    let rgb = flatten(pixmap, plan);
    let quality = (plan.quality * 100.0).round().clamp(1.0, 100.0) as u8;

    let mut buf = std::io::Cursor::new(Vec::new());
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(
            &rgb,
            pixmap.width(),
            pixmap.height(),
            image::ColorType::Rgb8.into(),
        )
        .map_err(|e| ExportError::Encode(format!("JPEG encoding failed: {e}")))?;
    Ok(buf.into_inner())
}

/// Lossless WebP; the encoder has no lossy mode.
fn encode_webp(pixmap: &tiny_skia::Pixmap) -> ExportResult<Vec<u8>> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }

    let mut buf = std::io::Cursor::new(Vec::new());
    image::codecs::webp::WebPEncoder::new_lossless(&mut buf)
        .write_image(
            &rgba,
            pixmap.width(),
            pixmap.height(),
            image::ColorType::Rgba8.into(),
        )
        .map_err(|e| ExportError::Encode(format!("WebP encoding failed: {e}")))?;
    Ok(buf.into_inner())
}

/// Single-page PDF with the flattened raster filling the page.
#[allow(clippy::cast_precision_loss)]
fn encode_pdf(pixmap: &tiny_skia::Pixmap, plan: &ExportPlan) -> ExportResult<Vec<u8>> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let page_width_mm = width as f32 / PDF_DPI * 25.4;
    let page_height_mm = height as f32 / PDF_DPI * 25.4;

    let (doc, page, layer) = printpdf::PdfDocument::new(
        "Studio Export",
        printpdf::Mm(page_width_mm),
        printpdf::Mm(page_height_mm),
        "Layer 1",
    );
    let current_layer = doc.get_page(page).get_layer(layer);

    let buffer = printpdf::image_crate::RgbImage::from_raw(width, height, flatten(pixmap, plan))
        .ok_or_else(|| ExportError::Encode("PDF image buffer size mismatch".to_string()))?;
    let image = printpdf::image_crate::DynamicImage::ImageRgb8(buffer);
    printpdf::Image::from_dynamic_image(&image).add_to_layer(
        current_layer,
        printpdf::ImageTransform {
            translate_x: Some(printpdf::Mm(0.0)),
            translate_y: Some(printpdf::Mm(0.0)),
            dpi: Some(PDF_DPI),
            ..Default::default()
        },
    );

    doc.save_to_bytes()
        .map_err(|e| ExportError::Encode(format!("PDF save failed: {e}")))
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Other color syntaxes yield `None`.
pub(crate) fn parse_hex_color(color: &str) -> Option<[u8; 4]> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (slot, c) in rgb.iter_mut().zip(hex.chars()) {
                let v = channel(&c.to_string())?;
                *slot = v * 17;
            }
            Some([rgb[0], rgb[1], rgb[2], 255])
        }
        6 | 8 => {
            let alpha = if hex.len() == 8 { channel(&hex[6..8])? } else { 255 };
            Some([channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?, alpha])
        }
        _ => None,
    }
}
