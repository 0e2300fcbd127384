//! Canvas elements - the building blocks of a composition.
//!
//! Every element carries common geometry and a closed, per-kind payload. Partial
//! updates go through [`ElementPatch`], whose payload half is typed per kind so a
//! text attribute can never be written onto a shape.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Point, Rect};
use crate::{CanvasError, CanvasResult};

/// Smallest width or height an element may have, in canvas units.
pub const MIN_ELEMENT_SIZE: f64 = 5.0;

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Font style for text elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Italic.
    Italic,
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centred.
    Center,
    /// Flush right.
    Right,
    /// Justified.
    Justify,
}

/// Text payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextProps {
    /// Text content.
    pub content: String,
    /// Font family name.
    pub font_family: String,
    /// Font size in canvas units.
    pub font_size: f64,
    /// CSS-style numeric weight (100..=900).
    pub font_weight: u16,
    /// Upright or italic.
    pub font_style: FontStyle,
    /// Alignment within the element box.
    pub align: TextAlign,
    /// Fill color as hex.
    pub color: String,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
    /// Extra spacing between glyphs.
    pub letter_spacing: f64,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_family: "Inter".to_string(),
            font_size: 32.0,
            font_weight: 400,
            font_style: FontStyle::Normal,
            align: TextAlign::Left,
            color: "#000000".to_string(),
            line_height: 1.2,
            letter_spacing: 0.0,
        }
    }
}

/// How an image fills its element box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFit {
    /// Scale to cover the box, cropping overflow.
    #[default]
    Cover,
    /// Scale to fit inside the box, letterboxing.
    Contain,
    /// Stretch to the box.
    Fill,
}

/// Image adjustment filters. Percentages are 100 = unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageFilters {
    /// Brightness percentage.
    pub brightness: f64,
    /// Contrast percentage.
    pub contrast: f64,
    /// Saturation percentage.
    pub saturation: f64,
    /// Blur radius in canvas units.
    pub blur: f64,
    /// Grayscale amount percentage.
    pub grayscale: f64,
    /// Sepia amount percentage.
    pub sepia: f64,
}

impl Default for ImageFilters {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            blur: 0.0,
            grayscale: 0.0,
            sepia: 0.0,
        }
    }
}

impl ImageFilters {
    /// Whether every filter is at its neutral value.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        *self == Self::default()
    }
}

/// Image payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageProps {
    /// Opaque source locator (URL or data URI). Loading is the renderer's job.
    pub src: String,
    /// Intrinsic width in pixels, 0 if unknown.
    pub natural_width: u32,
    /// Intrinsic height in pixels, 0 if unknown.
    pub natural_height: u32,
    /// Fit mode.
    pub fit: ImageFit,
    /// Adjustment filters.
    pub filters: ImageFilters,
}

impl ImageProps {
    /// Whether the source looks loadable at all. Empty or whitespace sources
    /// render as a placeholder box.
    #[must_use]
    pub fn has_source(&self) -> bool {
        !self.src.trim().is_empty()
    }
}

/// Geometric primitive drawn by a shape element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis-aligned rectangle with optional rounded corners.
    #[default]
    Rectangle,
    /// Ellipse inscribed in the element box.
    Circle,
    /// Isosceles triangle, apex at the top.
    Triangle,
    /// Regular polygon with `sides` vertices.
    Polygon,
}

/// Shape payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeProps {
    /// Primitive.
    pub shape: ShapeKind,
    /// Fill color as hex.
    pub fill: String,
    /// Stroke color as hex.
    pub stroke: String,
    /// Stroke width in canvas units.
    pub stroke_width: f64,
    /// Corner radius (rectangles only).
    pub corner_radius: f64,
    /// Vertex count (polygons only, at least 3).
    pub sides: u32,
}

impl Default for ShapeProps {
    fn default() -> Self {
        Self {
            shape: ShapeKind::Rectangle,
            fill: "#3b82f6".to_string(),
            stroke: "#000000".to_string(),
            stroke_width: 0.0,
            corner_radius: 0.0,
            sides: 6,
        }
    }
}

/// Device-frame payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameProps {
    /// Catalogue id of the device this frame depicts.
    pub device_id: String,
    /// Element shown inside the frame's content area, if any.
    pub content_id: Option<ElementId>,
    /// Bezel color as hex.
    pub frame_color: String,
}

impl Default for FrameProps {
    fn default() -> Self {
        Self {
            device_id: String::new(),
            content_id: None,
            frame_color: "#1f1f1f".to_string(),
        }
    }
}

/// Gradient geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientType {
    /// Straight-line gradient along `angle`.
    #[default]
    Linear,
    /// Concentric gradient from the centre.
    Radial,
}

/// One color stop of a gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient, 0..=1.
    pub offset: f64,
    /// Color as hex.
    pub color: String,
}

/// Gradient description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gradient {
    /// Linear or radial.
    #[serde(default)]
    pub gradient_type: GradientType,
    /// Direction in degrees for linear gradients (0 = left to right).
    #[serde(default)]
    pub angle: f64,
    /// Color stops, at least two.
    pub stops: Vec<GradientStop>,
}

/// Background payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackgroundFill {
    /// Solid color.
    Color {
        /// Color as hex.
        color: String,
    },
    /// Gradient fill.
    Gradient(Gradient),
    /// Image fill.
    Image {
        /// Opaque source locator.
        src: String,
        /// Fit mode.
        #[serde(default)]
        fit: ImageFit,
    },
}

/// The type of content an element contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ElementKind {
    /// A text block.
    Text(TextProps),
    /// A raster image.
    Image(ImageProps),
    /// A vector primitive.
    Shape(ShapeProps),
    /// A device mockup frame.
    Frame(FrameProps),
    /// The canvas backdrop.
    Background(BackgroundFill),
}

impl ElementKind {
    /// Text element with default styling.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text(TextProps {
            content: content.into(),
            ..TextProps::default()
        })
    }

    /// Image element for a source locator.
    #[must_use]
    pub fn image(src: impl Into<String>) -> Self {
        Self::Image(ImageProps {
            src: src.into(),
            ..ImageProps::default()
        })
    }

    /// Shape element with default styling.
    #[must_use]
    pub fn shape(shape: ShapeKind) -> Self {
        Self::Shape(ShapeProps {
            shape,
            ..ShapeProps::default()
        })
    }

    /// Device frame for a catalogue id.
    #[must_use]
    pub fn frame(device_id: impl Into<String>) -> Self {
        Self::Frame(FrameProps {
            device_id: device_id.into(),
            ..FrameProps::default()
        })
    }

    /// Solid color background.
    #[must_use]
    pub fn solid_background(color: impl Into<String>) -> Self {
        Self::Background(BackgroundFill::Color {
            color: color.into(),
        })
    }

    /// Lowercase type tag, as used in scene documents.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Shape(_) => "shape",
            Self::Frame(_) => "frame",
            Self::Background(_) => "background",
        }
    }

    /// Whether this is a background element.
    #[must_use]
    pub const fn is_background(&self) -> bool {
        matches!(self, Self::Background(_))
    }

    /// Default box size for a freshly placed element of this kind.
    #[must_use]
    pub fn default_size(&self) -> (f64, f64) {
        match self {
            Self::Text(_) => (300.0, 60.0),
            Self::Image(props) if props.natural_width > 0 && props.natural_height > 0 => {
                (f64::from(props.natural_width), f64::from(props.natural_height))
            }
            Self::Image(_) => (300.0, 200.0),
            Self::Shape(_) => (150.0, 150.0),
            Self::Frame(_) => (300.0, 600.0),
            Self::Background(_) => (1080.0, 1920.0),
        }
    }

    fn validate(&self) -> CanvasResult<()> {
        match self {
            Self::Text(text) => {
                if !(text.font_size.is_finite() && text.font_size > 0.0) {
                    return Err(CanvasError::validation("fontSize", "must be positive"));
                }
                if !(100..=900).contains(&text.font_weight) {
                    return Err(CanvasError::validation("fontWeight", "must be within 100..=900"));
                }
                if !(text.line_height.is_finite() && text.line_height > 0.0) {
                    return Err(CanvasError::validation("lineHeight", "must be positive"));
                }
            }
            Self::Image(image) => {
                let f = &image.filters;
                let all = [f.brightness, f.contrast, f.saturation, f.blur, f.grayscale, f.sepia];
                if all.iter().any(|v| !v.is_finite() || *v < 0.0) {
                    return Err(CanvasError::validation("filters", "values must be non-negative"));
                }
            }
            Self::Shape(shape) => {
                if shape.shape == ShapeKind::Polygon && shape.sides < 3 {
                    return Err(CanvasError::validation("sides", "a polygon needs at least 3 sides"));
                }
                if !(shape.stroke_width.is_finite() && shape.stroke_width >= 0.0) {
                    return Err(CanvasError::validation("strokeWidth", "must be non-negative"));
                }
                if !(shape.corner_radius.is_finite() && shape.corner_radius >= 0.0) {
                    return Err(CanvasError::validation("cornerRadius", "must be non-negative"));
                }
            }
            Self::Frame(_) => {}
            Self::Background(BackgroundFill::Gradient(gradient)) => {
                if gradient.stops.len() < 2 {
                    return Err(CanvasError::validation("stops", "a gradient needs two stops"));
                }
                if gradient
                    .stops
                    .iter()
                    .any(|s| !(0.0..=1.0).contains(&s.offset))
                {
                    return Err(CanvasError::validation("stops", "offsets must be within [0, 1]"));
                }
            }
            Self::Background(_) => {}
        }
        Ok(())
    }
}

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

/// A canvas element with geometry, appearance flags and a typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasElement {
    /// Unique identifier.
    pub id: ElementId,
    /// Left edge in canvas units.
    pub x: f64,
    /// Top edge in canvas units.
    pub y: f64,
    /// Unscaled width.
    pub width: f64,
    /// Unscaled height.
    pub height: f64,
    /// Rotation in degrees, clockwise about the box centre.
    #[serde(default)]
    pub rotation: f64,
    /// Horizontal scale factor.
    #[serde(default = "one")]
    pub scale_x: f64,
    /// Vertical scale factor.
    #[serde(default = "one")]
    pub scale_y: f64,
    /// Opacity within `[0, 1]`.
    #[serde(default = "one")]
    pub opacity: f64,
    /// Whether the element is drawn.
    #[serde(default = "yes")]
    pub visible: bool,
    /// Locked elements cannot be picked or dragged on the canvas.
    #[serde(default)]
    pub locked: bool,
    /// Paint order; higher paints later.
    #[serde(default)]
    pub z_index: i64,
    /// Typed payload.
    pub kind: ElementKind,
}

impl CanvasElement {
    /// Create a new element of the given kind at the origin with the kind's default size.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        let (width, height) = kind.default_size();
        Self {
            id: ElementId::new(),
            x: 0.0,
            y: 0.0,
            width,
            height,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
            visible: true,
            locked: false,
            z_index: 0,
            kind,
        }
    }

    /// Set position and size from a rectangle.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.x = bounds.x;
        self.y = bounds.y;
        self.width = bounds.width;
        self.height = bounds.height;
        self
    }

    /// Set the top-left position.
    #[must_use]
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the size.
    #[must_use]
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the rotation in degrees.
    #[must_use]
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// Set the opacity.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    /// Set the lock flag.
    #[must_use]
    pub fn with_locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    /// Axis-aligned box after scaling, ignoring rotation.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.x,
            self.y,
            self.width * self.scale_x.abs(),
            self.height * self.scale_y.abs(),
        )
    }

    /// Check if a canvas point falls on this element, honouring rotation.
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        let bounds = self.bounds();
        if self.rotation == 0.0 {
            return bounds.contains_point(point);
        }
        // Rotate the probe into the element's unrotated frame.
        let center = bounds.center();
        let (sin, cos) = (-self.rotation.to_radians()).sin_cos();
        let dx = point.x - center.x;
        let dy = point.y - center.y;
        let local = Point::new(
            dx.mul_add(cos, -dy * sin) + center.x,
            dx.mul_add(sin, dy * cos) + center.y,
        );
        bounds.contains_point(local)
    }

    /// Whether the element can be picked on the canvas.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.visible && !self.locked
    }

    /// Enforce the minimum size and check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] naming the first offending field.
    pub fn normalize(&mut self, min_size: f64) -> CanvasResult<()> {
        let geometry = [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
            ("rotation", self.rotation),
            ("scaleX", self.scale_x),
            ("scaleY", self.scale_y),
        ];
        for (field, value) in geometry {
            if !value.is_finite() {
                return Err(CanvasError::validation(field, "must be a finite number"));
            }
        }
        if self.scale_x == 0.0 || self.scale_y == 0.0 {
            return Err(CanvasError::validation("scale", "must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(CanvasError::validation(
                "opacity",
                format!("must be within [0, 1], got {}", self.opacity),
            ));
        }
        self.kind.validate()?;
        self.width = self.width.max(min_size);
        self.height = self.height.max(min_size);
        Ok(())
    }

    /// Apply a partial update atomically: either every field changes or none does.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] if the payload patch targets a different
    /// element kind or the result violates a range constraint.
    pub fn apply_patch(&mut self, patch: &ElementPatch, min_size: f64) -> CanvasResult<()> {
        let mut next = self.clone();
        if let Some(v) = patch.x {
            next.x = v;
        }
        if let Some(v) = patch.y {
            next.y = v;
        }
        if let Some(v) = patch.width {
            next.width = v;
        }
        if let Some(v) = patch.height {
            next.height = v;
        }
        if let Some(v) = patch.rotation {
            next.rotation = v;
        }
        if let Some(v) = patch.scale_x {
            next.scale_x = v;
        }
        if let Some(v) = patch.scale_y {
            next.scale_y = v;
        }
        if let Some(v) = patch.opacity {
            next.opacity = v;
        }
        if let Some(v) = patch.visible {
            next.visible = v;
        }
        if let Some(v) = patch.locked {
            next.locked = v;
        }
        if let Some(payload) = &patch.payload {
            payload.apply_to(&mut next.kind)?;
        }
        next.normalize(min_size)?;
        *self = next;
        Ok(())
    }
}

/// Partial update of an element. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementPatch {
    /// New left edge.
    pub x: Option<f64>,
    /// New top edge.
    pub y: Option<f64>,
    /// New width.
    pub width: Option<f64>,
    /// New height.
    pub height: Option<f64>,
    /// New rotation.
    pub rotation: Option<f64>,
    /// New horizontal scale.
    pub scale_x: Option<f64>,
    /// New vertical scale.
    pub scale_y: Option<f64>,
    /// New opacity.
    pub opacity: Option<f64>,
    /// New visibility.
    pub visible: Option<bool>,
    /// New lock flag.
    pub locked: Option<bool>,
    /// Field-level changes to the payload.
    pub payload: Option<PayloadPatch>,
}

impl ElementPatch {
    /// Move to a position.
    #[must_use]
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Resize.
    #[must_use]
    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// Patch only the payload.
    #[must_use]
    pub fn payload(payload: PayloadPatch) -> Self {
        Self {
            payload: Some(payload),
            ..Self::default()
        }
    }

    /// Whether applying this patch would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Field-level payload changes, one variant per element kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum PayloadPatch {
    /// Text attribute changes.
    Text(TextPatch),
    /// Image attribute changes.
    Image(ImagePatch),
    /// Shape attribute changes.
    Shape(ShapePatch),
    /// Frame attribute changes.
    Frame(FramePatch),
    /// Replacement backdrop fill.
    Background(BackgroundFill),
}

impl PayloadPatch {
    const fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Shape(_) => "shape",
            Self::Frame(_) => "frame",
            Self::Background(_) => "background",
        }
    }

    fn apply_to(&self, kind: &mut ElementKind) -> CanvasResult<()> {
        match (self, kind) {
            (Self::Text(p), ElementKind::Text(t)) => {
                assign(&mut t.content, &p.content);
                assign(&mut t.font_family, &p.font_family);
                assign(&mut t.font_size, &p.font_size);
                assign(&mut t.font_weight, &p.font_weight);
                assign(&mut t.font_style, &p.font_style);
                assign(&mut t.align, &p.align);
                assign(&mut t.color, &p.color);
                assign(&mut t.line_height, &p.line_height);
                assign(&mut t.letter_spacing, &p.letter_spacing);
            }
            (Self::Image(p), ElementKind::Image(i)) => {
                assign(&mut i.src, &p.src);
                assign(&mut i.natural_width, &p.natural_width);
                assign(&mut i.natural_height, &p.natural_height);
                assign(&mut i.fit, &p.fit);
                assign(&mut i.filters, &p.filters);
            }
            (Self::Shape(p), ElementKind::Shape(s)) => {
                assign(&mut s.shape, &p.shape);
                assign(&mut s.fill, &p.fill);
                assign(&mut s.stroke, &p.stroke);
                assign(&mut s.stroke_width, &p.stroke_width);
                assign(&mut s.corner_radius, &p.corner_radius);
                assign(&mut s.sides, &p.sides);
            }
            (Self::Frame(p), ElementKind::Frame(f)) => {
                assign(&mut f.device_id, &p.device_id);
                assign(&mut f.content_id, &p.content_id);
                assign(&mut f.frame_color, &p.frame_color);
            }
            (Self::Background(fill), ElementKind::Background(b)) => {
                *b = fill.clone();
            }
            (patch, kind) => {
                return Err(CanvasError::validation(
                    "payload",
                    format!(
                        "{} attributes cannot be applied to a {} element",
                        patch.type_name(),
                        kind.type_name()
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn assign<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *slot = v.clone();
    }
}

/// Text attribute changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct TextPatch {
    pub content: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub font_weight: Option<u16>,
    pub font_style: Option<FontStyle>,
    pub align: Option<TextAlign>,
    pub color: Option<String>,
    pub line_height: Option<f64>,
    pub letter_spacing: Option<f64>,
}

/// Image attribute changes. Filters are replaced as a set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct ImagePatch {
    pub src: Option<String>,
    pub natural_width: Option<u32>,
    pub natural_height: Option<u32>,
    pub fit: Option<ImageFit>,
    pub filters: Option<ImageFilters>,
}

/// Shape attribute changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct ShapePatch {
    pub shape: Option<ShapeKind>,
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub corner_radius: Option<f64>,
    pub sides: Option<u32>,
}

/// Frame attribute changes. `content_id: Some(None)` unlinks the content;
/// in JSON that is `"contentId": null`, while an absent key leaves it alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct FramePatch {
    pub device_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_id: Option<Option<ElementId>>,
    pub frame_color: Option<String>,
}

/// A key that is present maps to `Some`, even when its value is `null`.
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<ElementId>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<ElementId>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_kind_default_size() {
        let el = CanvasElement::new(ElementKind::shape(ShapeKind::Circle));
        assert!((el.width - 150.0).abs() < f64::EPSILON);
        assert!((el.opacity - 1.0).abs() < f64::EPSILON);
        assert!(el.visible);
        assert!(!el.locked);
    }

    #[test]
    fn test_image_default_size_uses_natural_dimensions() {
        let kind = ElementKind::Image(ImageProps {
            src: "https://example.com/a.png".to_string(),
            natural_width: 640,
            natural_height: 480,
            ..ImageProps::default()
        });
        assert_eq!(kind.default_size(), (640.0, 480.0));
    }

    #[test]
    fn test_normalize_clamps_minimum_size() {
        let mut el = CanvasElement::new(ElementKind::text("tiny")).with_size(1.0, 2.0);
        el.normalize(MIN_ELEMENT_SIZE).expect("valid");
        assert!((el.width - MIN_ELEMENT_SIZE).abs() < f64::EPSILON);
        assert!((el.height - MIN_ELEMENT_SIZE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_normalize_rejects_opacity_out_of_range() {
        let mut el = CanvasElement::new(ElementKind::text("x")).with_opacity(1.5);
        let err = el.normalize(MIN_ELEMENT_SIZE).expect_err("invalid");
        assert_eq!(err.field(), Some("opacity"));
    }

    #[test]
    fn test_polygon_needs_three_sides() {
        let mut el = CanvasElement::new(ElementKind::Shape(ShapeProps {
            shape: ShapeKind::Polygon,
            sides: 2,
            ..ShapeProps::default()
        }));
        assert_eq!(
            el.normalize(MIN_ELEMENT_SIZE).expect_err("invalid").field(),
            Some("sides")
        );
    }

    #[test]
    fn test_apply_patch_merges_payload_fields() {
        let mut el = CanvasElement::new(ElementKind::text("Hello"));
        let patch = ElementPatch {
            x: Some(40.0),
            payload: Some(PayloadPatch::Text(TextPatch {
                color: Some("#ff0000".to_string()),
                ..TextPatch::default()
            })),
            ..ElementPatch::default()
        };
        el.apply_patch(&patch, MIN_ELEMENT_SIZE).expect("patch");

        assert!((el.x - 40.0).abs() < f64::EPSILON);
        let ElementKind::Text(text) = &el.kind else {
            panic!("kind changed");
        };
        assert_eq!(text.content, "Hello");
        assert_eq!(text.color, "#ff0000");
    }

    #[test]
    fn test_apply_patch_rejects_wrong_kind_without_mutation() {
        let mut el = CanvasElement::new(ElementKind::shape(ShapeKind::Rectangle));
        let before = el.clone();
        let patch = ElementPatch {
            x: Some(99.0),
            payload: Some(PayloadPatch::Text(TextPatch::default())),
            ..ElementPatch::default()
        };
        let err = el.apply_patch(&patch, MIN_ELEMENT_SIZE).expect_err("mismatch");
        assert_eq!(err.field(), Some("payload"));
        assert_eq!(el, before);
    }

    #[test]
    fn test_frame_patch_unlinks_content() {
        let mut el = CanvasElement::new(ElementKind::Frame(FrameProps {
            device_id: "iphone-15-pro".to_string(),
            content_id: Some(ElementId::new()),
            ..FrameProps::default()
        }));
        let patch = ElementPatch::payload(PayloadPatch::Frame(FramePatch {
            content_id: Some(None),
            ..FramePatch::default()
        }));
        el.apply_patch(&patch, MIN_ELEMENT_SIZE).expect("patch");
        let ElementKind::Frame(frame) = &el.kind else {
            panic!("kind changed");
        };
        assert!(frame.content_id.is_none());
        assert_eq!(frame.device_id, "iphone-15-pro");
    }

    #[test]
    fn test_contains_point_respects_rotation() {
        let el = CanvasElement::new(ElementKind::shape(ShapeKind::Rectangle))
            .with_bounds(Rect::new(0.0, 45.0, 100.0, 10.0))
            .with_rotation(90.0);
        // Rotated a quarter turn about (50, 50): now a tall thin bar.
        assert!(el.contains_point(Point::new(50.0, 5.0)));
        assert!(!el.contains_point(Point::new(5.0, 50.0)));
    }

    #[test]
    fn test_gradient_needs_two_stops() {
        let mut el = CanvasElement::new(ElementKind::Background(BackgroundFill::Gradient(
            Gradient {
                gradient_type: GradientType::Linear,
                angle: 90.0,
                stops: vec![GradientStop {
                    offset: 0.0,
                    color: "#fff".to_string(),
                }],
            },
        )));
        assert_eq!(
            el.normalize(MIN_ELEMENT_SIZE).expect_err("invalid").field(),
            Some("stops")
        );
    }

    #[test]
    fn test_element_json_shape() {
        let el = CanvasElement::new(ElementKind::text("Hi")).at(10.0, 20.0);
        let json = serde_json::to_value(&el).expect("serialize");
        assert_eq!(json["kind"]["type"], "text");
        assert_eq!(json["kind"]["data"]["content"], "Hi");
        assert_eq!(json["zIndex"], 0);
        assert_eq!(json["scaleX"], 1.0);

        let back: CanvasElement = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, el);
    }

    #[test]
    fn test_element_json_defaults_optional_fields() {
        let json = serde_json::json!({
            "id": ElementId::new(),
            "x": 1.0, "y": 2.0, "width": 30.0, "height": 40.0,
            "kind": { "type": "background", "data": { "kind": "color", "color": "#fff" } }
        });
        let el: CanvasElement = serde_json::from_value(json).expect("deserialize");
        assert!(el.visible);
        assert!((el.opacity - 1.0).abs() < f64::EPSILON);
        assert!(el.kind.is_background());
    }

    #[test]
    fn test_frame_patch_null_content_id_unlinks() {
        let unlink: FramePatch =
            serde_json::from_str(r#"{"contentId": null}"#).expect("parse");
        assert_eq!(unlink.content_id, Some(None));

        let untouched: FramePatch =
            serde_json::from_str(r##"{"frameColor": "#111111"}"##).expect("parse");
        assert_eq!(untouched.content_id, None);

        let json = serde_json::to_value(&unlink).expect("json");
        assert!(json["contentId"].is_null());
        assert!(json.as_object().expect("object").contains_key("contentId"));
        let json = serde_json::to_value(&untouched).expect("json");
        assert!(!json.as_object().expect("object").contains_key("contentId"));

        let mut frame = CanvasElement::new(ElementKind::Frame(FrameProps {
            device_id: "pixel-8".to_string(),
            content_id: Some(ElementId::new()),
            ..FrameProps::default()
        }));
        frame
            .apply_patch(&ElementPatch::payload(PayloadPatch::Frame(unlink)), MIN_ELEMENT_SIZE)
            .expect("patch");
        let ElementKind::Frame(props) = &frame.kind else {
            panic!("expected a frame");
        };
        assert_eq!(props.content_id, None);
    }
}
