//! Immutable scene snapshots handed to the export pipeline.
//!
//! An [`ExportScene`] is a deep copy of the store's elements taken when the
//! export is requested, so edits made while a job is queued or rendering are
//! never observed.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use studio_core::{
    content_rect, frame_scale, CanvasElement, DeviceLookup, ElementId, ElementKind, ElementStore,
    Rect, SceneDocument,
};

use crate::error::{ExportError, ExportResult};
use crate::options::ExportOptions;

/// A frozen copy of a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportScene {
    canvas: Rect,
    region: Rect,
    background_color: String,
    elements: Vec<CanvasElement>,
    selection: Vec<ElementId>,
}

/// Device screen placement of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    /// Screen rectangle on the canvas.
    pub rect: Rect,
    /// Screen corner radius on the canvas.
    pub radius: f64,
}

/// One step of painting a scene, bottom to top.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintItem<'a> {
    /// The effective background element, painted over the whole canvas.
    Backdrop(&'a CanvasElement),
    /// An ordinary element.
    Element(&'a CanvasElement),
    /// A device frame with its linked content fitted to the screen.
    Frame {
        /// The frame element.
        frame: &'a CanvasElement,
        /// Screen placement, or `None` when the device is not in the catalogue.
        screen: Option<Screen>,
        /// Linked content, moved into the screen rectangle.
        content: Option<CanvasElement>,
    },
}

impl ExportScene {
    /// Scene of the given canvas size with elements in any order.
    #[must_use]
    pub fn new(width: f64, height: f64, mut elements: Vec<CanvasElement>) -> Self {
        elements.sort_by_key(|el| el.z_index);
        let canvas = Rect::new(0.0, 0.0, width, height);
        Self {
            canvas,
            region: canvas,
            background_color: "#ffffff".to_string(),
            elements,
            selection: Vec::new(),
        }
    }

    /// Snapshot a live store, including its selection.
    #[must_use]
    pub fn from_store(store: &ElementStore) -> Self {
        let viewport = store.viewport();
        let elements = store.ordered_elements().into_iter().cloned().collect();
        Self {
            background_color: viewport.background_color.clone(),
            selection: store.selection().to_vec(),
            ..Self::new(viewport.width(), viewport.height(), elements)
        }
    }

    /// Snapshot a saved document. Documents carry no selection.
    #[must_use]
    pub fn from_document(document: &SceneDocument) -> Self {
        Self {
            background_color: document.canvas.background_color.clone(),
            ..Self::new(
                document.canvas.width,
                document.canvas.height,
                document.elements.clone(),
            )
        }
    }

    /// Replace the fallback backdrop color.
    #[must_use]
    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = color.into();
        self
    }

    /// Replace the selection used by selected-only exports.
    #[must_use]
    pub fn with_selection(mut self, ids: &[ElementId]) -> Self {
        self.selection = ids.to_vec();
        self
    }

    /// The full canvas rectangle.
    #[must_use]
    pub fn canvas(&self) -> Rect {
        self.canvas
    }

    /// The canvas region that is exported, before padding.
    #[must_use]
    pub fn region(&self) -> Rect {
        self.region
    }

    /// Fallback backdrop color.
    #[must_use]
    pub fn background_color(&self) -> &str {
        &self.background_color
    }

    /// Elements in paint order.
    #[must_use]
    pub fn elements(&self) -> &[CanvasElement] {
        &self.elements
    }

    /// Selected element ids at capture time.
    #[must_use]
    pub fn selection(&self) -> &[ElementId] {
        &self.selection
    }

    /// The scene a given export should render.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Validation`] for a selected-only export with
    /// nothing selected.
    pub fn for_options(&self, options: &ExportOptions) -> ExportResult<Cow<'_, Self>> {
        if options.selected_only {
            self.selected_only().map(Cow::Owned)
        } else {
            Ok(Cow::Borrowed(self))
        }
    }

    /// Narrow to the selected elements, cropped to their combined bounds.
    ///
    /// Content linked to a selected frame comes along with it.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Validation`] if no selected element exists.
    pub fn selected_only(&self) -> ExportResult<Self> {
        let mut keep: HashSet<ElementId> = self.selection.iter().copied().collect();
        for el in &self.elements {
            if let ElementKind::Frame(props) = &el.kind {
                if keep.contains(&el.id) {
                    keep.extend(props.content_id);
                }
            }
        }

        let elements: Vec<CanvasElement> = self
            .elements
            .iter()
            .filter(|el| keep.contains(&el.id))
            .cloned()
            .collect();
        let region = elements
            .iter()
            .map(CanvasElement::bounds)
            .reduce(|acc, b| acc.union(&b))
            .ok_or_else(|| ExportError::validation("selectedOnly", "no elements are selected"))?;

        Ok(Self {
            canvas: self.canvas,
            region,
            background_color: self.background_color.clone(),
            elements,
            selection: self.selection.clone(),
        })
    }

    /// Resolve paint order against a device catalogue.
    ///
    /// Hidden elements are skipped. Only the topmost background is painted,
    /// first, as the backdrop. Content linked to a known frame is painted
    /// right after that frame, fitted into its screen.
    pub fn paint_list<D: DeviceLookup + ?Sized>(&self, devices: &D) -> Vec<PaintItem<'_>> {
        let backgrounds: Vec<&CanvasElement> = self
            .elements
            .iter()
            .filter(|el| el.visible && el.kind.is_background())
            .collect();
        if backgrounds.len() > 1 {
            tracing::warn!(
                count = backgrounds.len(),
                "multiple background elements; the topmost one is used"
            );
        }

        let by_id: HashMap<ElementId, &CanvasElement> =
            self.elements.iter().map(|el| (el.id, el)).collect();
        let mut screens: HashMap<ElementId, Screen> = HashMap::new();
        let mut linked: HashMap<ElementId, ElementId> = HashMap::new();
        for frame in self.elements.iter().filter(|el| el.visible) {
            let ElementKind::Frame(props) = &frame.kind else {
                continue;
            };
            let Some(device) = devices.device(&props.device_id) else {
                tracing::warn!(
                    element = %frame.id,
                    device = %props.device_id,
                    "unknown device; frame drawn as placeholder"
                );
                continue;
            };
            let bounds = frame.bounds();
            let rect = content_rect(device, bounds);
            let scale = frame_scale(device, bounds.width, bounds.height);
            screens.insert(
                frame.id,
                Screen {
                    rect,
                    radius: device.screen_radius * scale,
                },
            );
            let content = props
                .content_id
                .filter(|id| *id != frame.id)
                .and_then(|id| by_id.get(&id))
                .filter(|el| !matches!(el.kind, ElementKind::Frame(_) | ElementKind::Background(_)));
            if let Some(content) = content {
                linked.insert(content.id, frame.id);
            }
        }

        let mut items = Vec::with_capacity(self.elements.len());
        if let Some(backdrop) = backgrounds.last() {
            items.push(PaintItem::Backdrop(backdrop));
        }
        for el in self.elements.iter().filter(|el| el.visible) {
            if el.kind.is_background() || linked.contains_key(&el.id) {
                continue;
            }
            if !matches!(el.kind, ElementKind::Frame(_)) {
                items.push(PaintItem::Element(el));
                continue;
            }
            let screen = screens.get(&el.id).copied();
            let content = screen.and_then(|screen| {
                let (content_id, _) = linked.iter().find(|(_, frame)| **frame == el.id)?;
                let mut fitted = by_id.get(content_id).map(|c| (*c).clone())?;
                fitted.x = screen.rect.x;
                fitted.y = screen.rect.y;
                fitted.width = screen.rect.width;
                fitted.height = screen.rect.height;
                fitted.scale_x = 1.0;
                fitted.scale_y = 1.0;
                fitted.rotation = 0.0;
                Some(fitted)
            });
            items.push(PaintItem::Frame {
                frame: el,
                screen,
                content,
            });
        }
        items
    }
}
