//! Scene to SVG serialization.
//!
//! The SVG document is the intermediate representation for every output
//! format: vector exports return it as-is, raster and PDF exports rasterize it.

use std::fmt::Write;

use base64::Engine;
use studio_core::{
    BackgroundFill, CanvasElement, DeviceLookup, ElementKind, FontStyle, Gradient, GradientType,
    ImageFilters, ImageFit, Rect, ShapeKind, ShapeProps, TextAlign, TextProps,
};

use crate::options::ExportPlan;
use crate::scene::{ExportScene, PaintItem, Screen};

/// Collects `<defs>` entries with unique ids while the body is written.
#[derive(Default)]
struct Defs {
    body: String,
    next: usize,
}

impl Defs {
    fn id(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("{prefix}-{}", self.next)
    }
}

/// Serialize a scene to an SVG document sized by the plan.
pub(crate) fn render_svg<D: DeviceLookup + ?Sized>(
    scene: &ExportScene,
    plan: &ExportPlan,
    devices: &D,
) -> String {
    let view = plan.view;
    let mut defs = Defs::default();
    let mut body = String::with_capacity(4096);

    if let Some(color) = &plan.backdrop {
        let cover = output_cover(plan);
        let _ = write!(
            body,
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
            cover.x,
            cover.y,
            cover.width,
            cover.height,
            escape_xml(color),
        );
    }

    for item in scene.paint_list(devices) {
        match item {
            PaintItem::Backdrop(el) => {
                open_group(&mut body, el);
                if let ElementKind::Background(fill) = &el.kind {
                    render_fill(&mut body, &mut defs, fill, scene.canvas());
                }
                body.push_str("</g>");
            }
            PaintItem::Element(el) => render_element(&mut body, &mut defs, el),
            PaintItem::Frame {
                frame,
                screen,
                content,
            } => render_frame(&mut body, &mut defs, frame, screen, content.as_ref()),
        }
    }

    let mut svg = String::with_capacity(body.len() + defs.body.len() + 256);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{}\" height=\"{}\" viewBox=\"{} {} {} {}\" preserveAspectRatio=\"xMidYMid meet\">",
        plan.width, plan.height, view.x, view.y, view.width, view.height,
    );
    if !defs.body.is_empty() {
        let _ = write!(svg, "<defs>{}</defs>", defs.body);
    }
    svg.push_str(&body);
    svg.push_str("</svg>");
    svg
}

/// User-space region shown by the whole output under `xMidYMid meet`, the
/// letterbox included. Equals the plan's view when the aspect ratios match.
fn output_cover(plan: &ExportPlan) -> Rect {
    let view = plan.view;
    let (out_w, out_h) = (f64::from(plan.width), f64::from(plan.height));
    let scale = (out_w / view.width).min(out_h / view.height);
    if !(scale.is_finite() && scale > 0.0) {
        return view;
    }
    let (width, height) = (out_w / scale, out_h / scale);
    Rect::new(
        view.x - (width - view.width) / 2.0,
        view.y - (height - view.height) / 2.0,
        width,
        height,
    )
}

/// Open a `<g>` carrying the element's opacity and rotation about its centre.
fn open_group(svg: &mut String, el: &CanvasElement) {
    svg.push_str("<g");
    if el.opacity < 1.0 {
        let _ = write!(svg, " opacity=\"{}\"", el.opacity);
    }
    if el.rotation != 0.0 {
        let center = el.bounds().center();
        let _ = write!(
            svg,
            " transform=\"rotate({} {} {})\"",
            el.rotation, center.x, center.y
        );
    }
    svg.push('>');
}

fn render_element(svg: &mut String, defs: &mut Defs, el: &CanvasElement) {
    open_group(svg, el);
    let bounds = el.bounds();
    match &el.kind {
        ElementKind::Text(text) => render_text(svg, text, bounds, el.scale_y.abs()),
        ElementKind::Image(image) => {
            render_image(svg, &image.src, image.fit, Some(&image.filters), bounds);
        }
        ElementKind::Shape(shape) => render_shape(svg, shape, bounds),
        ElementKind::Background(fill) => render_fill(svg, defs, fill, bounds),
        ElementKind::Frame(_) => placeholder(svg, bounds, "Frame"),
    }
    svg.push_str("</g>");
}

fn render_text(svg: &mut String, text: &TextProps, bounds: Rect, scale: f64) {
    let font_size = text.font_size * scale;
    let (x, anchor) = match text.align {
        TextAlign::Left | TextAlign::Justify => (bounds.x, "start"),
        TextAlign::Center => (bounds.center().x, "middle"),
        TextAlign::Right => (bounds.right(), "end"),
    };
    let style = match text.font_style {
        FontStyle::Normal => "normal",
        FontStyle::Italic => "italic",
    };
    let _ = write!(
        svg,
        "<text x=\"{x}\" y=\"{}\" font-family=\"{}, sans-serif\" font-size=\"{font_size}\" font-weight=\"{}\" font-style=\"{style}\" fill=\"{}\" text-anchor=\"{anchor}\"",
        bounds.y + font_size,
        escape_xml(&text.font_family),
        text.font_weight,
        escape_xml(&text.color),
    );
    if text.letter_spacing != 0.0 {
        let _ = write!(svg, " letter-spacing=\"{}\"", text.letter_spacing * scale);
    }
    svg.push('>');
    let line_advance = font_size * text.line_height;
    for (index, line) in text.content.split('\n').enumerate() {
        let dy = if index == 0 { 0.0 } else { line_advance };
        let _ = write!(svg, "<tspan x=\"{x}\" dy=\"{dy}\">{}</tspan>", escape_xml(line));
    }
    svg.push_str("</text>");
}

fn render_shape(svg: &mut String, shape: &ShapeProps, b: Rect) {
    let paint = format!(
        "fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"",
        escape_xml(&shape.fill),
        escape_xml(&shape.stroke),
        shape.stroke_width,
    );
    match shape.shape {
        ShapeKind::Rectangle => {
            let radius = shape.corner_radius.min(b.width / 2.0).min(b.height / 2.0).max(0.0);
            let _ = write!(
                svg,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{radius}\" {paint}/>",
                b.x, b.y, b.width, b.height,
            );
        }
        ShapeKind::Circle => {
            let c = b.center();
            let _ = write!(
                svg,
                "<ellipse cx=\"{}\" cy=\"{}\" rx=\"{}\" ry=\"{}\" {paint}/>",
                c.x,
                c.y,
                b.width / 2.0,
                b.height / 2.0,
            );
        }
        ShapeKind::Triangle => {
            let _ = write!(
                svg,
                "<polygon points=\"{},{} {},{} {},{}\" {paint}/>",
                b.center().x,
                b.y,
                b.right(),
                b.bottom(),
                b.x,
                b.bottom(),
            );
        }
        ShapeKind::Polygon => {
            let _ = write!(svg, "<polygon points=\"{}\" {paint}/>", polygon_points(b, shape.sides));
        }
    }
}

/// Vertices of a regular polygon inscribed in `b`, first vertex at the top.
fn polygon_points(b: Rect, sides: u32) -> String {
    let sides = sides.max(3);
    let c = b.center();
    let step = std::f64::consts::TAU / f64::from(sides);
    let mut points = String::new();
    for i in 0..sides {
        let angle = f64::from(i).mul_add(step, -std::f64::consts::FRAC_PI_2);
        if i > 0 {
            points.push(' ');
        }
        let _ = write!(
            points,
            "{},{}",
            (b.width / 2.0).mul_add(angle.cos(), c.x),
            (b.height / 2.0).mul_add(angle.sin(), c.y),
        );
    }
    points
}

fn render_fill(svg: &mut String, defs: &mut Defs, fill: &BackgroundFill, b: Rect) {
    match fill {
        BackgroundFill::Color { color } => {
            let _ = write!(
                svg,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
                b.x,
                b.y,
                b.width,
                b.height,
                escape_xml(color),
            );
        }
        BackgroundFill::Gradient(gradient) => {
            let id = defs.id("gradient");
            write_gradient(&mut defs.body, &id, gradient);
            let _ = write!(
                svg,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"url(#{id})\"/>",
                b.x, b.y, b.width, b.height,
            );
        }
        BackgroundFill::Image { src, fit } => render_image(svg, src, *fit, None, b),
    }
}

/// Gradient in bounding-box units; 0 degrees runs left to right.
fn write_gradient(defs: &mut String, id: &str, gradient: &Gradient) {
    match gradient.gradient_type {
        GradientType::Linear => {
            let (sin, cos) = gradient.angle.to_radians().sin_cos();
            let _ = write!(
                defs,
                "<linearGradient id=\"{id}\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">",
                0.5 - cos / 2.0,
                0.5 - sin / 2.0,
                0.5 + cos / 2.0,
                0.5 + sin / 2.0,
            );
        }
        GradientType::Radial => {
            let _ = write!(defs, "<radialGradient id=\"{id}\" cx=\"0.5\" cy=\"0.5\" r=\"0.5\">");
        }
    }
    for stop in &gradient.stops {
        let _ = write!(
            defs,
            "<stop offset=\"{}\" stop-color=\"{}\"/>",
            stop.offset.clamp(0.0, 1.0),
            escape_xml(&stop.color),
        );
    }
    defs.push_str(match gradient.gradient_type {
        GradientType::Linear => "</linearGradient>",
        GradientType::Radial => "</radialGradient>",
    });
}

fn render_image(
    svg: &mut String,
    src: &str,
    fit: ImageFit,
    filters: Option<&ImageFilters>,
    b: Rect,
) {
    if !is_embeddable(src) {
        if src.trim().is_empty() {
            tracing::debug!("image without a source; drawing placeholder");
        } else {
            tracing::warn!(
                src = %truncate(src, 64),
                "image source could not be resolved; drawing placeholder"
            );
        }
        placeholder(svg, b, "Image");
        return;
    }
    let aspect = match fit {
        ImageFit::Cover => "xMidYMid slice",
        ImageFit::Contain => "xMidYMid meet",
        ImageFit::Fill => "none",
    };
    let _ = write!(
        svg,
        "<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"{aspect}\"",
        b.x, b.y, b.width, b.height,
    );
    if let Some(filter) = filters.and_then(css_filter) {
        let _ = write!(svg, " filter=\"{filter}\"");
    }
    let _ = write!(svg, " xlink:href=\"{}\"/>", escape_xml(src));
}

/// CSS filter functions for non-neutral image adjustments.
fn css_filter(filters: &ImageFilters) -> Option<String> {
    if filters.is_neutral() {
        return None;
    }
    let mut parts = Vec::new();
    if filters.brightness != 100.0 {
        parts.push(format!("brightness({}%)", filters.brightness));
    }
    if filters.contrast != 100.0 {
        parts.push(format!("contrast({}%)", filters.contrast));
    }
    if filters.saturation != 100.0 {
        parts.push(format!("saturate({}%)", filters.saturation));
    }
    if filters.blur > 0.0 {
        parts.push(format!("blur({}px)", filters.blur));
    }
    if filters.grayscale > 0.0 {
        parts.push(format!("grayscale({}%)", filters.grayscale));
    }
    if filters.sepia > 0.0 {
        parts.push(format!("sepia({}%)", filters.sepia));
    }
    (!parts.is_empty()).then(|| parts.join(" "))
}

/// Only base64 `data:` URIs holding a recognizable image are embedded. Remote
/// URLs are never fetched.
fn is_embeddable(src: &str) -> bool {
    let Some(rest) = src.trim().strip_prefix("data:") else {
        return false;
    };
    let Some((header, payload)) = rest.split_once(',') else {
        return false;
    };
    if !header.ends_with(";base64") {
        return false;
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .ok()
        .is_some_and(|bytes| image::guess_format(&bytes).is_ok())
}

fn render_frame(
    svg: &mut String,
    defs: &mut Defs,
    frame: &CanvasElement,
    screen: Option<Screen>,
    content: Option<&CanvasElement>,
) {
    let ElementKind::Frame(props) = &frame.kind else {
        return;
    };
    let b = frame.bounds();
    let Some(screen) = screen else {
        open_group(svg, frame);
        placeholder(svg, b, &props.device_id);
        svg.push_str("</g>");
        return;
    };

    open_group(svg, frame);
    let bezel = (screen.rect.x - b.x).max(0.0);
    let _ = write!(
        svg,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" fill=\"{}\"/>",
        b.x,
        b.y,
        b.width,
        b.height,
        screen.radius + bezel,
        escape_xml(&props.frame_color),
    );
    let _ = write!(
        svg,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\" fill=\"#000000\"/>",
        screen.rect.x, screen.rect.y, screen.rect.width, screen.rect.height, screen.radius,
    );
    if let Some(content) = content {
        let clip = defs.id("screen");
        let _ = write!(
            defs.body,
            "<clipPath id=\"{clip}\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{}\"/></clipPath>",
            screen.rect.x, screen.rect.y, screen.rect.width, screen.rect.height, screen.radius,
        );
        let _ = write!(svg, "<g clip-path=\"url(#{clip})\">");
        render_element(svg, defs, content);
        svg.push_str("</g>");
    }
    svg.push_str("</g>");
}

/// Grey box with a centred label, drawn for anything that cannot be rendered.
fn placeholder(svg: &mut String, b: Rect, label: &str) {
    let _ = write!(
        svg,
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#e0e0e0\" stroke=\"#999\" stroke-width=\"1\"/>",
        b.x, b.y, b.width, b.height,
    );
    let c = b.center();
    let _ = write!(
        svg,
        "<text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"#666\" text-anchor=\"middle\" font-family=\"sans-serif\">{}</text>",
        c.x,
        c.y,
        escape_xml(label),
    );
}

fn truncate(s: &str, max: usize) -> &str {
    s.char_indices().nth(max).map_or(s, |(i, _)| &s[..i])
}

/// Escape special XML characters.
pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
