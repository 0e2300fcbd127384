//! Viewport and gesture controller.
//!
//! Turns raw [`InputEvent`]s into store commands: picking, dragging, marquee
//! selection, panning, wheel and pinch zoom, tool placement and keyboard
//! shortcuts.
//!
//! ```text
//!            down                 move past threshold
//!   Idle ──────────▶ Pressed ─────────────────────────▶ Dragging (hit selected)
//!     ▲                 │                               Marquee  (mouse on empty)
//!     │      up (tap)   │                               Panning  (touch on empty)
//!     └─────────────────┘
//!   two fingers at any point ─▶ Pinching
//! ```
//!
//! Pointer moves are throttled to the configured frame interval. Moves that
//! arrive too early are coalesced, and the latest one is applied when the
//! gesture ends. A drag is bracketed by `begin_transform`/`commit_transform`,
//! so it produces exactly one history entry.

use crate::element::ElementId;
use crate::event::{InputEvent, KeyModifiers, PointerButton, PointerPhase, TouchEvent, TouchPhase};
use crate::geometry::{exceeds_threshold, wheel_zoom_factor, PinchTracker, Point, Rect};
use crate::store::{ElementStore, Tool};

/// Keyboard command that was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    /// Delete / Backspace.
    Delete,
    /// Cmd+Z.
    Undo,
    /// Cmd+Shift+Z or Cmd+Y.
    Redo,
    /// Cmd+C.
    Copy,
    /// Cmd+X.
    Cut,
    /// Cmd+V.
    Paste,
    /// Cmd+D.
    Duplicate,
    /// Cmd+A.
    SelectAll,
    /// Escape.
    Escape,
    /// Arrow keys.
    Nudge,
}

/// What an input event did.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing happened.
    Ignored,
    /// The event was absorbed by throttling and will be applied later.
    Deferred,
    /// The selection was updated by a click or tap.
    Selected,
    /// A placement tool added an element.
    Placed(ElementId),
    /// Selected elements moved during a drag.
    Dragged,
    /// The viewport was panned.
    Panned,
    /// The viewport was zoomed.
    Zoomed,
    /// The marquee grew or shrank; the rectangle is in canvas units.
    Marquee(Rect),
    /// A marquee selection finished, selecting this many elements.
    MarqueeSelected(usize),
    /// A drag finished; `true` if it recorded a history entry.
    DragCommitted(bool),
    /// A keyboard shortcut ran.
    Shortcut(Shortcut),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    start: Point,
    anchor_origin: Point,
    applied: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Pressed {
        start: Point,
        hit: Option<ElementId>,
        additive: bool,
        touch: bool,
    },
    Dragging(Drag),
    Panning {
        last: Point,
    },
    Marquee {
        start: Point,
        current: Point,
        additive: bool,
    },
    Pinching(PinchTracker),
}

/// Stateful interpreter of pointer, touch, wheel and key input.
#[derive(Debug, Clone)]
pub struct GestureController {
    gesture: Gesture,
    last_applied_ms: Option<u64>,
    pending: Option<Point>,
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureController {
    /// Create an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gesture: Gesture::Idle,
            last_applied_ms: None,
            pending: None,
        }
    }

    /// Whether no gesture is in progress.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    /// Current marquee rectangle in canvas units, for drawing.
    #[must_use]
    pub fn marquee(&self) -> Option<Rect> {
        match self.gesture {
            Gesture::Marquee { start, current, .. } => Some(Rect::from_corners(start, current)),
            _ => None,
        }
    }

    /// Feed one input event.
    pub fn handle(&mut self, store: &mut ElementStore, event: &InputEvent) -> Outcome {
        match event {
            InputEvent::Pointer {
                phase,
                x,
                y,
                button,
                modifiers,
                timestamp_ms,
            } => {
                let at = Point::new(*x, *y);
                match phase {
                    PointerPhase::Down => self.pointer_down(store, at, *button, *modifiers, false),
                    PointerPhase::Move => self.pointer_move(store, at, *timestamp_ms),
                    PointerPhase::Up => self.pointer_up(store, at),
                }
            }
            InputEvent::Wheel { x, y, delta_y, .. } => Self::wheel(store, Point::new(*x, *y), *delta_y),
            InputEvent::Touch(touch) => self.touch(store, touch),
            InputEvent::Key {
                key,
                pressed,
                modifiers,
            } => {
                if *pressed {
                    self.key(store, key, *modifiers)
                } else {
                    Outcome::Ignored
                }
            }
        }
    }

    fn reset(&mut self) {
        self.gesture = Gesture::Idle;
        self.last_applied_ms = None;
        self.pending = None;
    }

    fn pointer_down(
        &mut self,
        store: &mut ElementStore,
        at: Point,
        button: PointerButton,
        modifiers: KeyModifiers,
        touch: bool,
    ) -> Outcome {
        if self.gesture != Gesture::Idle {
            return Outcome::Ignored;
        }
        self.reset();

        if button == PointerButton::Middle || *store.tool() == Tool::Pan {
            self.gesture = Gesture::Panning { last: at };
            return Outcome::Ignored;
        }
        if button != PointerButton::Primary {
            return Outcome::Ignored;
        }

        let canvas = store.viewport().screen_to_canvas(at);
        if store.tool().element_kind().is_some() {
            return match store.place(canvas) {
                Ok(Some(id)) => Outcome::Placed(id),
                Ok(None) => Outcome::Ignored,
                Err(e) => {
                    tracing::warn!(error = %e, "placing element failed");
                    Outcome::Ignored
                }
            };
        }

        let hit = store.hit_test(canvas);
        let additive = modifiers.shift;
        let mut outcome = Outcome::Ignored;
        if let Some(id) = hit {
            if additive {
                store.toggle_selection(id);
            } else if !store.is_selected(id) {
                store.select(&[id]);
            }
            outcome = Outcome::Selected;
        }
        self.gesture = Gesture::Pressed {
            start: at,
            hit,
            additive,
            touch,
        };
        outcome
    }

    fn throttled(&mut self, store: &ElementStore, at: Point, timestamp_ms: u64) -> bool {
        let interval = store.config().pointer_frame_interval_ms;
        if let Some(last) = self.last_applied_ms {
            if timestamp_ms.saturating_sub(last) < interval {
                self.pending = Some(at);
                return true;
            }
        }
        self.last_applied_ms = Some(timestamp_ms);
        self.pending = None;
        false
    }

    fn pointer_move(&mut self, store: &mut ElementStore, at: Point, timestamp_ms: u64) -> Outcome {
        if self.gesture == Gesture::Idle {
            return Outcome::Ignored;
        }
        if self.throttled(store, at, timestamp_ms) {
            return Outcome::Deferred;
        }
        self.apply_move(store, at)
    }

    fn apply_move(&mut self, store: &mut ElementStore, at: Point) -> Outcome {
        match self.gesture {
            Gesture::Idle | Gesture::Pinching(_) => Outcome::Ignored,
            Gesture::Pressed {
                start,
                hit,
                additive,
                touch,
            } => {
                if !exceeds_threshold(start, at, store.config().pan_threshold) {
                    return Outcome::Ignored;
                }
                let start_canvas = store.viewport().screen_to_canvas(start);
                match hit.filter(|id| store.is_selected(*id)).and_then(|id| store.get(id)) {
                    Some(anchor) => {
                        self.gesture = Gesture::Dragging(Drag {
                            start: start_canvas,
                            anchor_origin: Point::new(anchor.x, anchor.y),
                            applied: Point::ZERO,
                        });
                        store.begin_transform();
                    }
                    None if touch => self.gesture = Gesture::Panning { last: start },
                    None => {
                        self.gesture = Gesture::Marquee {
                            start: start_canvas,
                            current: start_canvas,
                            additive,
                        };
                    }
                }
                self.apply_move(store, at)
            }
            Gesture::Dragging(mut drag) => {
                let canvas = store.viewport().screen_to_canvas(at);
                let wanted = store.viewport().snap_point(Point::new(
                    drag.anchor_origin.x + canvas.x - drag.start.x,
                    drag.anchor_origin.y + canvas.y - drag.start.y,
                ));
                let dx = wanted.x - drag.anchor_origin.x - drag.applied.x;
                let dy = wanted.y - drag.anchor_origin.y - drag.applied.y;
                let ids = store.selection().to_vec();
                if store.translate(&ids, dx, dy) {
                    drag.applied = drag.applied.offset(dx, dy);
                    self.gesture = Gesture::Dragging(drag);
                    Outcome::Dragged
                } else {
                    Outcome::Ignored
                }
            }
            Gesture::Panning { last } => {
                self.gesture = Gesture::Panning { last: at };
                store.update_viewport(|vp| vp.pan_by(at.x - last.x, at.y - last.y));
                Outcome::Panned
            }
            Gesture::Marquee { start, additive, .. } => {
                let current = store.viewport().screen_to_canvas(at);
                self.gesture = Gesture::Marquee {
                    start,
                    current,
                    additive,
                };
                Outcome::Marquee(Rect::from_corners(start, current))
            }
        }
    }

    fn pointer_up(&mut self, store: &mut ElementStore, at: Point) -> Outcome {
        if let Some(pending) = self.pending.take() {
            self.apply_move(store, pending);
        }
        if !matches!(self.gesture, Gesture::Pressed { .. } | Gesture::Pinching(_)) {
            self.apply_move(store, at);
        }

        let outcome = match self.gesture {
            Gesture::Idle | Gesture::Pinching(_) => Outcome::Ignored,
            Gesture::Pressed { hit, additive, .. } => {
                if hit.is_none() && !additive && !store.selection().is_empty() {
                    store.clear_selection();
                    Outcome::Selected
                } else {
                    Outcome::Ignored
                }
            }
            Gesture::Dragging(_) => Outcome::DragCommitted(store.commit_transform()),
            Gesture::Panning { .. } => Outcome::Panned,
            Gesture::Marquee {
                start,
                current,
                additive,
            } => Outcome::MarqueeSelected(store.select_in_rect(Rect::from_corners(start, current), additive)),
        };
        self.reset();
        outcome
    }

    fn wheel(store: &mut ElementStore, at: Point, delta_y: f64) -> Outcome {
        let factor = wheel_zoom_factor(delta_y, store.config().wheel_zoom_step);
        if (factor - 1.0).abs() < f64::EPSILON {
            return Outcome::Ignored;
        }
        match store.update_viewport(|vp| vp.zoom_by(at, factor)) {
            Ok(_) => Outcome::Zoomed,
            Err(e) => {
                tracing::debug!(error = %e, "wheel zoom rejected");
                Outcome::Ignored
            }
        }
    }

    fn touch(&mut self, store: &mut ElementStore, event: &TouchEvent) -> Outcome {
        if let Some((a, b)) = event.pinch_pair() {
            if matches!(event.phase, TouchPhase::Start | TouchPhase::Move) {
                return self.pinch(store, a, b);
            }
        }

        match event.phase {
            TouchPhase::Start => match event.primary() {
                Some(at) => self.pointer_down(
                    store,
                    at,
                    PointerButton::Primary,
                    KeyModifiers::default(),
                    true,
                ),
                None => Outcome::Ignored,
            },
            TouchPhase::Move => match event.primary() {
                Some(at) if !matches!(self.gesture, Gesture::Pinching(_)) => {
                    self.pointer_move(store, at, event.timestamp_ms)
                }
                _ => Outcome::Ignored,
            },
            TouchPhase::End => {
                if matches!(self.gesture, Gesture::Pinching(_)) {
                    self.reset();
                    return Outcome::Zoomed;
                }
                let at = event
                    .primary()
                    .or(self.pending)
                    .unwrap_or_else(|| self.last_position(store));
                self.pointer_up(store, at)
            }
            TouchPhase::Cancel => {
                store.cancel_transform();
                self.reset();
                Outcome::Ignored
            }
        }
    }

    fn last_position(&self, store: &ElementStore) -> Point {
        match self.gesture {
            Gesture::Pressed { start, .. } => start,
            Gesture::Panning { last } => last,
            Gesture::Marquee { current, .. } => store.viewport().canvas_to_screen(current),
            Gesture::Dragging(drag) => store.viewport().canvas_to_screen(Point::new(
                drag.start.x + drag.applied.x,
                drag.start.y + drag.applied.y,
            )),
            Gesture::Idle | Gesture::Pinching(_) => Point::ZERO,
        }
    }

    fn pinch(&mut self, store: &mut ElementStore, a: Point, b: Point) -> Outcome {
        if let Gesture::Pinching(tracker) = &mut self.gesture {
            let view = tracker.update(a, b, store.viewport().view());
            store.update_viewport(|vp| vp.set_view(view));
            return Outcome::Zoomed;
        }
        if matches!(self.gesture, Gesture::Dragging(_)) {
            store.commit_transform();
        }
        self.reset();
        self.gesture = Gesture::Pinching(PinchTracker::start(a, b));
        Outcome::Ignored
    }

    fn key(&mut self, store: &mut ElementStore, key: &str, modifiers: KeyModifiers) -> Outcome {
        let command = modifiers.command();
        let shortcut = match key.to_ascii_lowercase().as_str() {
            "delete" | "backspace" => {
                store.delete_selected();
                Shortcut::Delete
            }
            "z" if command && modifiers.shift => {
                store.redo();
                Shortcut::Redo
            }
            "y" if command => {
                store.redo();
                Shortcut::Redo
            }
            "z" if command => {
                store.undo();
                Shortcut::Undo
            }
            "c" if command => {
                store.copy(None);
                Shortcut::Copy
            }
            "x" if command => {
                store.cut(None);
                Shortcut::Cut
            }
            "v" if command => {
                store.paste();
                Shortcut::Paste
            }
            "d" if command => {
                let ids = store.selection().to_vec();
                store.duplicate(&ids);
                Shortcut::Duplicate
            }
            "a" if command => {
                store.select_all();
                Shortcut::SelectAll
            }
            "escape" => {
                if store.is_transforming() {
                    store.cancel_transform();
                    self.reset();
                } else {
                    store.clear_selection();
                    store.set_tool(Tool::Select);
                }
                Shortcut::Escape
            }
            "arrowleft" | "arrowright" | "arrowup" | "arrowdown" => {
                let step = if modifiers.shift {
                    store.config().nudge_step_large
                } else {
                    store.config().nudge_step
                };
                let (dx, dy) = match key.to_ascii_lowercase().as_str() {
                    "arrowleft" => (-step, 0.0),
                    "arrowright" => (step, 0.0),
                    "arrowup" => (0.0, -step),
                    _ => (0.0, step),
                };
                let ids = store.selection().to_vec();
                store.nudge(&ids, dx, dy);
                Shortcut::Nudge
            }
            _ => return Outcome::Ignored,
        };
        Outcome::Shortcut(shortcut)
    }
}
