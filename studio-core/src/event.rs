//! Input events consumed by the gesture controller.
//!
//! All coordinates are screen pixels relative to the editor surface.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Lifecycle stage of a touch sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    /// A finger landed.
    Start,
    /// One or more fingers moved.
    Move,
    /// A finger lifted.
    End,
    /// The platform aborted the sequence.
    Cancel,
}

/// One finger on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Stable id for the lifetime of the finger.
    pub id: u32,
    /// Horizontal screen position.
    pub x: f64,
    /// Vertical screen position.
    pub y: f64,
}

impl TouchPoint {
    /// Screen position.
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Touch input, carrying every finger still down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouchEvent {
    /// Stage of the sequence.
    pub phase: TouchPhase,
    /// Fingers currently down, first landed first.
    pub touches: Vec<TouchPoint>,
    /// Event time in milliseconds.
    pub timestamp_ms: u64,
}

impl TouchEvent {
    /// Build a touch event.
    #[must_use]
    pub fn new(phase: TouchPhase, touches: Vec<TouchPoint>, timestamp_ms: u64) -> Self {
        Self {
            phase,
            touches,
            timestamp_ms,
        }
    }

    /// Position of the first finger, if any.
    #[must_use]
    pub fn primary(&self) -> Option<Point> {
        self.touches.first().map(TouchPoint::position)
    }

    /// The first two fingers, when a pinch is possible.
    #[must_use]
    pub fn pinch_pair(&self) -> Option<(Point, Point)> {
        match self.touches.as_slice() {
            [a, b, ..] => Some((a.position(), b.position())),
            _ => None,
        }
    }
}

/// Phase of a pointer (mouse/pen) event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button released.
    Up,
}

/// Pointer buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    /// Primary (usually left) button.
    #[default]
    Primary,
    /// Middle button / wheel click.
    Middle,
    /// Secondary (usually right) button.
    Secondary,
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct KeyModifiers {
    /// Shift key pressed.
    pub shift: bool,
    /// Control key pressed.
    pub ctrl: bool,
    /// Alt/Option key pressed.
    pub alt: bool,
    /// Meta/Command key pressed.
    pub meta: bool,
}

impl KeyModifiers {
    /// Platform command modifier: Ctrl or Meta.
    #[must_use]
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    /// Only shift held.
    #[must_use]
    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }

    /// Only the command modifier held.
    #[must_use]
    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }
}

/// All input events the editor can receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum InputEvent {
    /// Mouse or pen event.
    Pointer {
        /// Press, move or release.
        phase: PointerPhase,
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
        /// Button involved.
        button: PointerButton,
        /// Active modifier keys.
        modifiers: KeyModifiers,
        /// Timestamp in milliseconds.
        timestamp_ms: u64,
    },

    /// Scroll wheel, used for zooming about the pointer.
    Wheel {
        /// X coordinate of the pointer.
        x: f64,
        /// Y coordinate of the pointer.
        y: f64,
        /// Vertical scroll delta; negative scrolls up.
        delta_y: f64,
        /// Active modifier keys.
        modifiers: KeyModifiers,
    },

    /// Raw touch event.
    Touch(TouchEvent),

    /// Keyboard event.
    Key {
        /// Key name, following the DOM `KeyboardEvent.key` convention.
        key: String,
        /// Whether the key is pressed.
        pressed: bool,
        /// Active modifier keys.
        modifiers: KeyModifiers,
    },
}

impl InputEvent {
    /// Primary-button pointer event without modifiers.
    #[must_use]
    pub fn pointer(phase: PointerPhase, x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self::Pointer {
            phase,
            x,
            y,
            button: PointerButton::Primary,
            modifiers: KeyModifiers::default(),
            timestamp_ms,
        }
    }

    /// Key press.
    #[must_use]
    pub fn key_down(key: impl Into<String>, modifiers: KeyModifiers) -> Self {
        Self::Key {
            key: key.into(),
            pressed: true,
            modifiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(id: u32, x: f64, y: f64) -> TouchPoint {
        TouchPoint { id, x, y }
    }

    #[test]
    fn test_pinch_pair_needs_two_fingers() {
        let one = TouchEvent::new(TouchPhase::Start, vec![touch(0, 1.0, 2.0)], 0);
        assert_eq!(one.primary(), Some(Point::new(1.0, 2.0)));
        assert!(one.pinch_pair().is_none());

        let two = TouchEvent::new(
            TouchPhase::Move,
            vec![touch(0, 0.0, 0.0), touch(1, 10.0, 0.0), touch(2, 5.0, 5.0)],
            16,
        );
        assert_eq!(
            two.pinch_pair(),
            Some((Point::new(0.0, 0.0), Point::new(10.0, 0.0)))
        );
    }

    #[test]
    fn test_event_json_shape() {
        let event = InputEvent::key_down("z", KeyModifiers::ctrl());
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "Key");
        assert_eq!(json["data"]["key"], "z");
        assert!(KeyModifiers::ctrl().command());
    }
}
