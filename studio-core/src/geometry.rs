//! Coordinate math shared by the viewport, the gesture controller and hit testing.
//!
//! Screen space is measured in device pixels with the origin at the top-left of
//! the editor surface. Canvas space is the logical composition coordinate system.
//! The forward transform is `screen = canvas * zoom + offset`.

use serde::{Deserialize, Serialize};

use crate::{CanvasError, CanvasResult};

/// Smallest zoom factor the viewport accepts.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest zoom factor the viewport accepts.
pub const MAX_ZOOM: f64 = 5.0;

/// Multiplicative zoom step applied per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 1.1;

/// Single-finger movement (screen px) below which a touch is still a tap.
pub const PAN_THRESHOLD: f64 = 10.0;

/// A point in either screen or canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Point halfway between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    /// Translate by a delta.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Axis-aligned rectangle, top-left anchored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width (non-negative).
    pub width: f64,
    /// Height (non-negative).
    pub height: f64,
}

impl Rect {
    /// Create a rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle spanned by two arbitrary corners, as produced by a
    /// marquee drag in any direction.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// The four corners, clockwise from top-left.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }

    /// Whether a point lies inside or on the boundary.
    #[must_use]
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Whether all four corners of `other` lie inside this rectangle.
    #[must_use]
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.corners().iter().all(|c| self.contains_point(*c))
    }

    /// Whether the two rectangles overlap.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Smallest rectangle covering both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(x, y, right - x, bottom - y)
    }

    /// Grow by `amount` on every side.
    #[must_use]
    pub fn expand(&self, amount: f64) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }
}

/// Zoom and pan of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    /// Zoom factor, always within `[MIN_ZOOM, MAX_ZOOM]`.
    pub zoom: f64,
    /// Horizontal pan in screen pixels.
    pub offset_x: f64,
    /// Vertical pan in screen pixels.
    pub offset_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl ViewTransform {
    /// Map a screen point into canvas space.
    #[must_use]
    pub fn to_canvas(&self, screen: Point) -> Point {
        screen_to_canvas(screen.x, screen.y, self.zoom, self.offset_x, self.offset_y)
    }

    /// Map a canvas point into screen space.
    #[must_use]
    pub fn to_screen(&self, canvas: Point) -> Point {
        canvas_to_screen(canvas.x, canvas.y, self.zoom, self.offset_x, self.offset_y)
    }

    /// Zoom to `new_zoom` (clamped) keeping the canvas point under `anchor` fixed.
    #[must_use]
    pub fn zoomed_about(&self, anchor: Point, new_zoom: f64) -> Self {
        let zoom = clamp_zoom(new_zoom);
        let offset = zoom_about_point(
            anchor,
            self.zoom,
            Point::new(self.offset_x, self.offset_y),
            zoom,
        );
        Self {
            zoom,
            offset_x: offset.x,
            offset_y: offset.y,
        }
    }
}

/// Convert screen coordinates to canvas coordinates.
#[must_use]
pub fn screen_to_canvas(screen_x: f64, screen_y: f64, zoom: f64, offset_x: f64, offset_y: f64) -> Point {
    Point::new((screen_x - offset_x) / zoom, (screen_y - offset_y) / zoom)
}

/// Convert canvas coordinates to screen coordinates.
#[must_use]
pub fn canvas_to_screen(canvas_x: f64, canvas_y: f64, zoom: f64, offset_x: f64, offset_y: f64) -> Point {
    Point::new(canvas_x.mul_add(zoom, offset_x), canvas_y.mul_add(zoom, offset_y))
}

/// Clamp a zoom request to `[MIN_ZOOM, MAX_ZOOM]`.
///
/// Non-finite input yields `MIN_ZOOM`; callers that must reject such input
/// validate before clamping.
#[must_use]
pub fn clamp_zoom(zoom: f64) -> f64 {
    if zoom.is_nan() {
        return MIN_ZOOM;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Round `value` to the nearest multiple of `grid_size`.
///
/// # Errors
///
/// Returns [`CanvasError::InvalidConfig`] if `grid_size` is not a positive finite number.
pub fn snap_to_grid(value: f64, grid_size: f64) -> CanvasResult<f64> {
    if !grid_size.is_finite() || grid_size <= 0.0 {
        return Err(CanvasError::invalid_config(
            "gridSize",
            format!("must be a positive number, got {grid_size}"),
        ));
    }
    Ok((value / grid_size).round() * grid_size)
}

/// Pan offset that keeps the canvas point under `anchor` in place while the
/// zoom changes from `old_zoom` to `new_zoom`.
#[must_use]
pub fn zoom_about_point(anchor: Point, old_zoom: f64, old_offset: Point, new_zoom: f64) -> Point {
    let canvas = screen_to_canvas(anchor.x, anchor.y, old_zoom, old_offset.x, old_offset.y);
    Point::new(
        canvas.x.mul_add(-new_zoom, anchor.x),
        canvas.y.mul_add(-new_zoom, anchor.y),
    )
}

/// Zoom factor for one wheel event. Scrolling up (negative delta) zooms in.
#[must_use]
pub fn wheel_zoom_factor(delta_y: f64, step: f64) -> f64 {
    if delta_y < 0.0 {
        step
    } else if delta_y > 0.0 {
        1.0 / step
    } else {
        1.0
    }
}

/// Whether a drag from `start` to `current` has moved far enough to count as a pan.
#[must_use]
pub fn exceeds_threshold(start: Point, current: Point, threshold: f64) -> bool {
    start.distance_to(current) >= threshold
}

/// Tracks a two-finger pinch across frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchTracker {
    prev_distance: f64,
    prev_midpoint: Point,
}

impl PinchTracker {
    /// Start tracking from the first frame's touch points.
    #[must_use]
    pub fn start(a: Point, b: Point) -> Self {
        Self {
            prev_distance: a.distance_to(b),
            prev_midpoint: a.midpoint(b),
        }
    }

    /// Midpoint recorded at the last frame.
    #[must_use]
    pub fn midpoint(&self) -> Point {
        self.prev_midpoint
    }

    /// Advance to the next frame and derive the new view.
    ///
    /// The zoom scales by the ratio of finger distances and the canvas point
    /// that sat under the previous midpoint ends up under the current midpoint.
    pub fn update(&mut self, a: Point, b: Point, view: ViewTransform) -> ViewTransform {
        let distance = a.distance_to(b);
        let midpoint = a.midpoint(b);

        let ratio = if self.prev_distance > f64::EPSILON {
            distance / self.prev_distance
        } else {
            1.0
        };
        let zoom = clamp_zoom(view.zoom * ratio);

        let anchor = view.to_canvas(self.prev_midpoint);
        let next = ViewTransform {
            zoom,
            offset_x: anchor.x.mul_add(-zoom, midpoint.x),
            offset_y: anchor.y.mul_add(-zoom, midpoint.y),
        };

        self.prev_distance = distance;
        self.prev_midpoint = midpoint;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_screen_to_canvas_formula() {
        let p = screen_to_canvas(150.0, 90.0, 2.0, 50.0, 10.0);
        assert!(approx(p.x, 50.0));
        assert!(approx(p.y, 40.0));
    }

    #[test]
    fn test_canvas_to_screen_inverts() {
        let s = canvas_to_screen(50.0, 40.0, 2.0, 50.0, 10.0);
        assert!(approx(s.x, 150.0));
        assert!(approx(s.y, 90.0));
    }

    #[test]
    fn test_snap_to_grid() {
        assert!(approx(snap_to_grid(23.0, 10.0).expect("snap"), 20.0));
        assert!(approx(snap_to_grid(25.0, 10.0).expect("snap"), 30.0));
        assert!(approx(snap_to_grid(-7.0, 5.0).expect("snap"), -5.0));
    }

    #[test]
    fn test_snap_rejects_bad_grid() {
        for grid in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            let err = snap_to_grid(10.0, grid).expect_err("must reject");
            assert_eq!(err.field(), Some("gridSize"));
        }
    }

    #[test]
    fn test_clamp_zoom() {
        assert!(approx(clamp_zoom(0.01), MIN_ZOOM));
        assert!(approx(clamp_zoom(12.0), MAX_ZOOM));
        assert!(approx(clamp_zoom(1.5), 1.5));
        assert!(approx(clamp_zoom(f64::NAN), MIN_ZOOM));
    }

    #[test]
    fn test_rect_from_corners_normalizes() {
        let r = Rect::from_corners(Point::new(100.0, 80.0), Point::new(20.0, 10.0));
        assert_eq!(r, Rect::new(20.0, 10.0, 80.0, 70.0));
    }

    #[test]
    fn test_rect_containment_requires_all_corners() {
        let query = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(!query.contains_rect(&Rect::new(50.0, 50.0, 80.0, 80.0)));
        assert!(query.contains_rect(&Rect::new(10.0, 10.0, 50.0, 50.0)));
        assert!(query.contains_rect(&Rect::new(0.0, 0.0, 100.0, 100.0)));
    }

    #[test]
    fn test_rect_union_and_expand() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 10.0, 20.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 30.0, 25.0));
        assert_eq!(a.expand(5.0), Rect::new(-5.0, -5.0, 20.0, 20.0));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_zoom_about_point_keeps_anchor_fixed() {
        let view = ViewTransform {
            zoom: 1.0,
            offset_x: 30.0,
            offset_y: -20.0,
        };
        let anchor = Point::new(400.0, 300.0);
        let before = view.to_canvas(anchor);
        let zoomed = view.zoomed_about(anchor, 2.5);
        let after = zoomed.to_canvas(anchor);
        assert!(approx(before.x, after.x));
        assert!(approx(before.y, after.y));
        assert!(approx(zoomed.zoom, 2.5));
    }

    #[test]
    fn test_zoomed_about_clamps() {
        let zoomed = ViewTransform::default().zoomed_about(Point::ZERO, 100.0);
        assert!(approx(zoomed.zoom, MAX_ZOOM));
    }

    #[test]
    fn test_wheel_zoom_factor() {
        assert!(approx(wheel_zoom_factor(-120.0, 1.1), 1.1));
        assert!(approx(wheel_zoom_factor(120.0, 1.1), 1.0 / 1.1));
        assert!(approx(wheel_zoom_factor(0.0, 1.1), 1.0));
    }

    #[test]
    fn test_threshold() {
        let start = Point::new(0.0, 0.0);
        assert!(!exceeds_threshold(start, Point::new(6.0, 6.0), PAN_THRESHOLD));
        assert!(exceeds_threshold(start, Point::new(6.0, 8.0), PAN_THRESHOLD));
    }

    #[test]
    fn test_pinch_spread_doubles_zoom() {
        let mut pinch = PinchTracker::start(Point::new(100.0, 100.0), Point::new(200.0, 100.0));
        let view = pinch.update(
            Point::new(50.0, 100.0),
            Point::new(250.0, 100.0),
            ViewTransform::default(),
        );
        assert!(approx(view.zoom, 2.0));
        // Midpoint stayed at (150, 100): the canvas point there must not move.
        let canvas = view.to_canvas(Point::new(150.0, 100.0));
        assert!(approx(canvas.x, 150.0));
        assert!(approx(canvas.y, 100.0));
    }

    #[test]
    fn test_pinch_follows_moving_midpoint() {
        let start_view = ViewTransform {
            zoom: 1.5,
            offset_x: 10.0,
            offset_y: 20.0,
        };
        let a = Point::new(100.0, 100.0);
        let b = Point::new(200.0, 200.0);
        let mut pinch = PinchTracker::start(a, b);
        let anchor = start_view.to_canvas(a.midpoint(b));

        let a2 = Point::new(140.0, 90.0);
        let b2 = Point::new(260.0, 210.0);
        let view = pinch.update(a2, b2, start_view);

        let moved = view.to_screen(anchor);
        let mid = a2.midpoint(b2);
        assert!(approx(moved.x, mid.x));
        assert!(approx(moved.y, mid.y));
        assert!(approx(pinch.midpoint().x, mid.x));
    }

    #[test]
    fn test_pinch_coincident_touches_keep_zoom() {
        let p = Point::new(10.0, 10.0);
        let mut pinch = PinchTracker::start(p, p);
        let view = pinch.update(p, Point::new(20.0, 10.0), ViewTransform::default());
        assert!(approx(view.zoom, 1.0));
    }
}
