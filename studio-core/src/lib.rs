//! # Saorsa Studio Core
//!
//! Canvas editing engine for layered compositions: elements, selection,
//! undo history, viewport math, device frames and input gestures.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     studio-core                      │
//! ├──────────────────────────────────────────────────────┤
//! │  GestureController   │  ElementStore                 │
//! │  - Pointer / touch   │  - Elements & z-order         │
//! │  - Wheel & pinch     │  - Selection & clipboard      │
//! │  - Shortcuts         │  - Two-phase transforms       │
//! ├──────────────────────────────────────────────────────┤
//! │  HistoryManager      │  Geometry / Viewport / Device │
//! │  - Bounded snapshots │  - Screen <-> canvas          │
//! │  - Linear undo/redo  │  - Zoom, pan, grid snap       │
//! │                      │  - Frame content areas        │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Input flows from the controller through geometry into store commands;
//! finished commands record a history snapshot and notify subscribers.
//!
//! ```
//! use studio_core::{CanvasElement, ElementKind, ElementStore, Rect};
//!
//! let mut store = ElementStore::default();
//! let id = store
//!     .add(CanvasElement::new(ElementKind::text("Hello")).with_bounds(Rect::new(0.0, 0.0, 100.0, 20.0)))
//!     .expect("valid element");
//! assert_eq!(store.selection(), &[id]);
//!
//! store.undo();
//! assert!(store.is_empty());
//! assert!(!store.can_undo());
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod controller;
pub mod device;
pub mod document;
pub mod element;
pub mod error;
pub mod event;
pub mod geometry;
pub mod history;
pub mod store;
pub mod viewport;

pub use config::EditorConfig;
pub use controller::{GestureController, Outcome, Shortcut};
pub use device::{
    builtin_devices, content_rect, frame_scale, optimal_frame_size, DeviceCategory, DeviceLookup,
    DeviceSpec, FrameSize, Orientation,
};
pub use document::{CanvasDocument, SceneDocument, CURRENT_VERSION};
pub use element::{
    BackgroundFill, CanvasElement, ElementId, ElementKind, ElementPatch, FontStyle, FramePatch, FrameProps,
    Gradient, GradientStop, GradientType, ImageFilters, ImageFit, ImagePatch, ImageProps,
    PayloadPatch, ShapeKind, ShapePatch, ShapeProps, TextAlign, TextPatch, TextProps, MIN_ELEMENT_SIZE,
};
pub use error::{CanvasError, CanvasResult};
pub use event::{
    InputEvent, KeyModifiers, PointerButton, PointerPhase, TouchEvent, TouchPhase, TouchPoint,
};
pub use geometry::{
    canvas_to_screen, clamp_zoom, screen_to_canvas, snap_to_grid, PinchTracker, Point, Rect,
    ViewTransform, MAX_ZOOM, MIN_ZOOM,
};
pub use history::{HistoryManager, HistorySnapshot, DEFAULT_MAX_HISTORY};
pub use store::{ElementStore, StoreEvent, SubscriptionId, Tool};
pub use viewport::{CanvasViewport, GridSettings};

/// Studio core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
