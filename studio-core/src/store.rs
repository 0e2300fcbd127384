//! The element store: the single owner of an editing session's state.
//!
//! [`ElementStore`] holds the element list, selection, clipboard, active tool,
//! viewport and undo history. Every change goes through a command method;
//! listeners registered with [`ElementStore::subscribe`] are told what changed
//! so a view can re-render.
//!
//! History is recorded by the commands that represent a finished user action
//! (`add`, `delete`, `duplicate`, z-order changes, `cut`, `paste`, `nudge`,
//! template and frame linking, `commit_transform`). [`ElementStore::update`]
//! never records; interactive edits are bracketed by
//! [`ElementStore::begin_transform`] and [`ElementStore::commit_transform`] so a
//! whole drag becomes one undo step.

use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::EditorConfig;
use crate::device::{content_rect, DeviceLookup};
use crate::document::SceneDocument;
use crate::element::{
    BackgroundFill, CanvasElement, ElementId, ElementKind, ElementPatch, FramePatch, PayloadPatch,
    ShapeKind,
};
use crate::geometry::{Point, Rect};
use crate::history::HistoryManager;
use crate::viewport::CanvasViewport;
use crate::{CanvasError, CanvasResult};

/// Current time in milliseconds since the Unix epoch.
pub(crate) fn current_timestamp_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        // Timestamp will not exceed u64 max for millennia
        #[allow(clippy::cast_possible_truncation)]
        {
            d.as_millis() as u64
        }
    })
}

/// The active editing tool.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "tool", content = "option", rename_all = "lowercase")]
pub enum Tool {
    /// Pick, drag and marquee-select.
    #[default]
    Select,
    /// Drag pans the viewport.
    Pan,
    /// Click places a text element.
    Text,
    /// Click places a shape of the given kind.
    Shape(ShapeKind),
    /// Click places an empty image element.
    Image,
    /// Click places a device frame for the given catalogue id.
    Frame(String),
}

impl Tool {
    /// Element kind placed by this tool, if it is a placement tool.
    #[must_use]
    pub fn element_kind(&self) -> Option<ElementKind> {
        match self {
            Self::Select | Self::Pan => None,
            Self::Text => Some(ElementKind::text("Text")),
            Self::Shape(shape) => Some(ElementKind::shape(*shape)),
            Self::Image => Some(ElementKind::image("")),
            Self::Frame(device) => Some(ElementKind::frame(device.clone())),
        }
    }
}

/// What changed in the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// Elements were added, removed or modified.
    ElementsChanged,
    /// The selection set changed.
    SelectionChanged,
    /// Zoom, pan, canvas size or grid settings changed.
    ViewportChanged,
    /// The undo/redo availability may have changed.
    HistoryChanged {
        /// Whether undo is possible.
        can_undo: bool,
        /// Whether redo is possible.
        can_redo: bool,
    },
    /// The active tool changed.
    ToolChanged(Tool),
}

/// Handle returned by [`ElementStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreEvent) + Send>;

/// Explicit state container for one editing session.
pub struct ElementStore {
    /// Elements in insertion order; paint order is derived from `z_index`.
    elements: Vec<CanvasElement>,
    selection: Vec<ElementId>,
    clipboard: Vec<CanvasElement>,
    tool: Tool,
    viewport: CanvasViewport,
    history: HistoryManager,
    config: EditorConfig,
    /// Elements as they were when the open transform began.
    transform_origin: Option<Vec<CanvasElement>>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for ElementStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementStore")
            .field("elements", &self.elements.len())
            .field("selection", &self.selection)
            .field("clipboard", &self.clipboard.len())
            .field("tool", &self.tool)
            .field("viewport", &self.viewport)
            .field("history", &self.history.len())
            .field("transforming", &self.transform_origin.is_some())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for ElementStore {
    fn default() -> Self {
        let config = EditorConfig::default();
        Self::build(config, CanvasViewport::default())
    }
}

impl ElementStore {
    /// Create an empty session with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: EditorConfig) -> CanvasResult<Self> {
        config.validate()?;
        Ok(Self::build(config, CanvasViewport::default()))
    }

    /// Create an empty session with a specific viewport.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] if the configuration is invalid.
    pub fn with_viewport(config: EditorConfig, viewport: CanvasViewport) -> CanvasResult<Self> {
        config.validate()?;
        Ok(Self::build(config, viewport))
    }

    fn build(config: EditorConfig, viewport: CanvasViewport) -> Self {
        Self {
            elements: Vec::new(),
            selection: Vec::new(),
            clipboard: Vec::new(),
            tool: Tool::Select,
            viewport,
            history: HistoryManager::new(&[], config.max_history_size),
            config,
            transform_origin: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    /// Register a listener called after every change.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: &StoreEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    fn emit_history(&mut self) {
        let event = StoreEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        };
        self.emit(&event);
    }

    /// Record the live element list as a new history state.
    fn record(&mut self) {
        self.history.snapshot(&self.elements);
        self.emit_history();
    }

    /// Fold unrecorded edits (`update`, `translate`, an open transform) into
    /// the current history state. Called by recording commands before they
    /// mutate, so undoing them lands on the live scene they started from.
    /// Closes any open transform.
    fn checkpoint(&mut self) {
        self.transform_origin = None;
        if self.history.current().elements() != self.elements.as_slice() {
            tracing::debug!("unrecorded edits folded into history");
            self.history.amend_current(&self.elements);
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    /// Elements in insertion order.
    #[must_use]
    pub fn elements(&self) -> &[CanvasElement] {
        &self.elements
    }

    /// Elements in paint order: ascending `z_index`, ties by insertion order.
    #[must_use]
    pub fn ordered_elements(&self) -> Vec<&CanvasElement> {
        let mut ordered: Vec<&CanvasElement> = self.elements.iter().collect();
        ordered.sort_by_key(|el| el.z_index);
        ordered
    }

    /// Look up an element.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&CanvasElement> {
        self.elements.iter().find(|el| el.id == id)
    }

    /// Whether an element exists.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the canvas has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Selected ids in selection order.
    #[must_use]
    pub fn selection(&self) -> &[ElementId] {
        &self.selection
    }

    /// Whether an element is selected.
    #[must_use]
    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selection.contains(&id)
    }

    /// Selected elements in paint order.
    #[must_use]
    pub fn selected_elements(&self) -> Vec<&CanvasElement> {
        self.ordered_elements()
            .into_iter()
            .filter(|el| self.selection.contains(&el.id))
            .collect()
    }

    /// Clipboard contents.
    #[must_use]
    pub fn clipboard(&self) -> &[CanvasElement] {
        &self.clipboard
    }

    /// Active tool.
    #[must_use]
    pub fn tool(&self) -> &Tool {
        &self.tool
    }

    /// The viewport.
    #[must_use]
    pub fn viewport(&self) -> &CanvasViewport {
        &self.viewport
    }

    /// The undo history.
    #[must_use]
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Editor configuration.
    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The effective canvas backdrop: the last background element in paint order.
    #[must_use]
    pub fn background(&self) -> Option<&CanvasElement> {
        let mut backgrounds = self
            .ordered_elements()
            .into_iter()
            .filter(|el| el.kind.is_background())
            .collect::<Vec<_>>();
        if backgrounds.len() > 1 {
            tracing::warn!(
                count = backgrounds.len(),
                "multiple background elements; the topmost one is used"
            );
        }
        backgrounds.pop()
    }

    /// Topmost interactive, non-background element under a canvas point.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Option<ElementId> {
        self.ordered_elements()
            .into_iter()
            .rev()
            .find(|el| el.is_interactive() && !el.kind.is_background() && el.contains_point(point))
            .map(|el| el.id)
    }

    // ------------------------------------------------------------------
    // Element CRUD
    // ------------------------------------------------------------------

    /// Add an element. A fresh id is assigned, its `z_index` becomes the
    /// current element count and it becomes the sole selection.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] if the element violates a range
    /// constraint; the store is unchanged.
    pub fn add(&mut self, mut element: CanvasElement) -> CanvasResult<ElementId> {
        element.normalize(self.config.min_element_size)?;
        self.checkpoint();
        element.id = ElementId::new();
        element.z_index = z_from_count(self.elements.len());
        let id = element.id;
        let is_background = element.kind.is_background();

        tracing::debug!(%id, kind = element.kind.type_name(), "element added");
        self.elements.push(element);
        if is_background {
            self.warn_on_multiple_backgrounds();
        }
        self.selection = vec![id];
        self.record();
        self.emit(&StoreEvent::ElementsChanged);
        self.emit(&StoreEvent::SelectionChanged);
        Ok(id)
    }

    /// Merge a partial update into an element. Does not record history.
    ///
    /// Returns `Ok(false)` if the element does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] if the patch is invalid or links a
    /// frame to itself or to a missing element; the element is unchanged.
    pub fn update(&mut self, id: ElementId, patch: &ElementPatch) -> CanvasResult<bool> {
        if let Some(PayloadPatch::Frame(FramePatch {
            content_id: Some(Some(content)),
            ..
        })) = &patch.payload
        {
            if *content == id {
                return Err(CanvasError::validation("contentId", "a frame cannot contain itself"));
            }
            if !self.contains(*content) {
                return Err(CanvasError::validation(
                    "contentId",
                    format!("no element with id {content}"),
                ));
            }
        }
        let min_size = self.config.min_element_size;
        let Some(element) = self.elements.iter_mut().find(|el| el.id == id) else {
            return Ok(false);
        };
        element.apply_patch(patch, min_size)?;
        self.emit(&StoreEvent::ElementsChanged);
        Ok(true)
    }

    /// Remove elements, pruning them from the selection and clipboard.
    ///
    /// Frames linked to a removed element are unlinked. Returns the number of
    /// elements removed; nothing is recorded if none existed.
    pub fn delete(&mut self, ids: &[ElementId]) -> usize {
        let doomed: HashSet<ElementId> = ids.iter().copied().collect();
        if !self.elements.iter().any(|el| doomed.contains(&el.id)) {
            return 0;
        }
        self.checkpoint();
        let before = self.elements.len();
        self.elements.retain(|el| !doomed.contains(&el.id));
        let removed = before - self.elements.len();

        for element in &mut self.elements {
            if let ElementKind::Frame(frame) = &mut element.kind {
                if frame.content_id.is_some_and(|c| doomed.contains(&c)) {
                    frame.content_id = None;
                }
            }
        }
        self.clipboard.retain(|el| !doomed.contains(&el.id));
        let selection_before = self.selection.len();
        self.selection.retain(|id| !doomed.contains(id));

        tracing::debug!(removed, "elements deleted");
        self.record();
        self.emit(&StoreEvent::ElementsChanged);
        if self.selection.len() != selection_before {
            self.emit(&StoreEvent::SelectionChanged);
        }
        removed
    }

    /// Delete the current selection.
    pub fn delete_selected(&mut self) -> usize {
        let ids = self.selection.clone();
        self.delete(&ids)
    }

    /// Clone elements with fresh ids, offset by the duplicate offset and
    /// stacked above everything else. The copies become the selection.
    pub fn duplicate(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let sources: Vec<CanvasElement> = self
            .ordered_elements()
            .into_iter()
            .filter(|el| ids.contains(&el.id))
            .cloned()
            .collect();
        self.insert_copies(&sources)
    }

    fn insert_copies(&mut self, sources: &[CanvasElement]) -> Vec<ElementId> {
        if sources.is_empty() {
            return Vec::new();
        }
        self.checkpoint();
        let copies = fresh_copies(sources, self.config.duplicate_offset, Some(self.trailing_z()));
        let new_ids: Vec<ElementId> = copies.iter().map(|el| el.id).collect();
        self.elements.extend(copies);
        self.selection.clone_from(&new_ids);

        tracing::debug!(count = new_ids.len(), "elements inserted as copies");
        self.record();
        self.emit(&StoreEvent::ElementsChanged);
        self.emit(&StoreEvent::SelectionChanged);
        new_ids
    }

    fn trailing_z(&self) -> i64 {
        self.elements
            .iter()
            .map(|el| el.z_index)
            .max()
            .map_or(0, |z| z + 1)
    }

    // ------------------------------------------------------------------
    // Z-order
    // ------------------------------------------------------------------

    /// Move elements above everything else, keeping their relative order.
    pub fn bring_to_front(&mut self, ids: &[ElementId]) -> bool {
        let targets = self.targets_in_paint_order(ids);
        if targets.is_empty() {
            return false;
        }
        self.checkpoint();
        let mut changed = false;
        for id in targets {
            let top = self.elements.iter().map(|el| el.z_index).max().unwrap_or(0);
            changed |= self.set_z(id, top + 1);
        }
        self.finish_reorder(changed)
    }

    /// Move elements below everything else, keeping their relative order.
    /// The resulting `z_index` may be negative.
    pub fn send_to_back(&mut self, ids: &[ElementId]) -> bool {
        let targets = self.targets_in_paint_order(ids);
        if targets.is_empty() {
            return false;
        }
        self.checkpoint();
        let mut changed = false;
        for id in targets.into_iter().rev() {
            let bottom = self.elements.iter().map(|el| el.z_index).min().unwrap_or(0);
            changed |= self.set_z(id, bottom - 1);
        }
        self.finish_reorder(changed)
    }

    /// Raise each element's `z_index` by one.
    pub fn bring_forward(&mut self, ids: &[ElementId]) -> bool {
        if !self.elements.iter().any(|el| ids.contains(&el.id)) {
            return false;
        }
        self.checkpoint();
        let mut changed = false;
        for element in self.elements.iter_mut().filter(|el| ids.contains(&el.id)) {
            element.z_index += 1;
            changed = true;
        }
        self.finish_reorder(changed)
    }

    /// Lower each element's `z_index` by one, never going below zero.
    pub fn send_backward(&mut self, ids: &[ElementId]) -> bool {
        if !self
            .elements
            .iter()
            .any(|el| el.z_index > 0 && ids.contains(&el.id))
        {
            return false;
        }
        self.checkpoint();
        let mut changed = false;
        for element in self.elements.iter_mut().filter(|el| ids.contains(&el.id)) {
            if element.z_index > 0 {
                element.z_index -= 1;
                changed = true;
            }
        }
        self.finish_reorder(changed)
    }

    fn targets_in_paint_order(&self, ids: &[ElementId]) -> Vec<ElementId> {
        self.ordered_elements()
            .into_iter()
            .filter(|el| ids.contains(&el.id))
            .map(|el| el.id)
            .collect()
    }

    fn set_z(&mut self, id: ElementId, z: i64) -> bool {
        match self.elements.iter_mut().find(|el| el.id == id) {
            Some(element) if element.z_index != z => {
                element.z_index = z;
                true
            }
            _ => false,
        }
    }

    fn finish_reorder(&mut self, changed: bool) -> bool {
        if changed {
            self.record();
            self.emit(&StoreEvent::ElementsChanged);
        }
        changed
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Replace the selection. Ids that do not exist are ignored.
    pub fn select(&mut self, ids: &[ElementId]) {
        let mut next = Vec::with_capacity(ids.len());
        for id in ids {
            if self.contains(*id) && !next.contains(id) {
                next.push(*id);
            }
        }
        self.set_selection(next);
    }

    /// Add elements to the selection. Ids that do not exist are ignored.
    pub fn add_to_selection(&mut self, ids: &[ElementId]) {
        let mut next = self.selection.clone();
        for id in ids {
            if self.contains(*id) && !next.contains(id) {
                next.push(*id);
            }
        }
        self.set_selection(next);
    }

    /// Flip one element's selection state.
    pub fn toggle_selection(&mut self, id: ElementId) {
        if self.is_selected(id) {
            let next = self.selection.iter().copied().filter(|s| *s != id).collect();
            self.set_selection(next);
        } else {
            self.add_to_selection(&[id]);
        }
    }

    /// Select every unlocked element.
    pub fn select_all(&mut self) {
        let next = self
            .ordered_elements()
            .into_iter()
            .filter(|el| !el.locked)
            .map(|el| el.id)
            .collect();
        self.set_selection(next);
    }

    /// Empty the selection.
    pub fn clear_selection(&mut self) {
        self.set_selection(Vec::new());
    }

    /// Select interactive elements whose bounds lie entirely inside `rect`.
    ///
    /// Partial overlap does not select. With `additive` the hits are added to
    /// the current selection instead of replacing it. Returns the hit count.
    pub fn select_in_rect(&mut self, rect: Rect, additive: bool) -> usize {
        let hits: Vec<ElementId> = self
            .ordered_elements()
            .into_iter()
            .filter(|el| el.is_interactive() && rect.contains_rect(&el.bounds()))
            .map(|el| el.id)
            .collect();
        let count = hits.len();
        if additive {
            self.add_to_selection(&hits);
        } else {
            self.set_selection(hits);
        }
        count
    }

    fn set_selection(&mut self, next: Vec<ElementId>) {
        if next != self.selection {
            self.selection = next;
            self.emit(&StoreEvent::SelectionChanged);
        }
    }

    fn resolve_targets(&self, ids: Option<&[ElementId]>) -> Vec<ElementId> {
        ids.map_or_else(|| self.selection.clone(), <[ElementId]>::to_vec)
    }

    // ------------------------------------------------------------------
    // Clipboard
    // ------------------------------------------------------------------

    /// Copy elements (the selection when `ids` is `None`) to the clipboard.
    /// Returns the number copied; an empty result leaves the clipboard alone.
    pub fn copy(&mut self, ids: Option<&[ElementId]>) -> usize {
        let targets = self.resolve_targets(ids);
        let copied: Vec<CanvasElement> = self
            .ordered_elements()
            .into_iter()
            .filter(|el| targets.contains(&el.id))
            .cloned()
            .collect();
        if copied.is_empty() {
            return 0;
        }
        let count = copied.len();
        self.clipboard = copied;
        count
    }

    /// Copy then delete. The clipboard keeps the cut elements.
    pub fn cut(&mut self, ids: Option<&[ElementId]>) -> usize {
        let targets = self.resolve_targets(ids);
        if self.copy(Some(targets.as_slice())) == 0 {
            return 0;
        }
        let kept = self.clipboard.clone();
        let removed = self.delete(&targets);
        self.clipboard = kept;
        removed
    }

    /// Insert copies of the clipboard, offset from where they were copied and
    /// stacked on top. The pasted set becomes the selection.
    pub fn paste(&mut self) -> Vec<ElementId> {
        let sources = self.clipboard.clone();
        self.insert_copies(&sources)
    }

    // ------------------------------------------------------------------
    // Tools and movement
    // ------------------------------------------------------------------

    /// Switch the active tool.
    pub fn set_tool(&mut self, tool: Tool) {
        if tool != self.tool {
            self.tool = tool.clone();
            self.emit(&StoreEvent::ToolChanged(tool));
        }
    }

    /// Place an element with the active placement tool at a canvas point
    /// (snapped when grid snapping is on), then return to [`Tool::Select`].
    ///
    /// Returns `Ok(None)` when the active tool does not place elements.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] if the element cannot be added.
    pub fn place(&mut self, at: Point) -> CanvasResult<Option<ElementId>> {
        let Some(kind) = self.tool.element_kind() else {
            return Ok(None);
        };
        let origin = self.viewport.snap_point(at);
        let id = self.add(CanvasElement::new(kind).at(origin.x, origin.y))?;
        self.set_tool(Tool::Select);
        Ok(Some(id))
    }

    /// Move unlocked elements by a delta without recording history.
    pub fn translate(&mut self, ids: &[ElementId], dx: f64, dy: f64) -> bool {
        if !(dx.is_finite() && dy.is_finite()) || (dx == 0.0 && dy == 0.0) {
            return false;
        }
        let mut moved = false;
        for element in self
            .elements
            .iter_mut()
            .filter(|el| !el.locked && ids.contains(&el.id))
        {
            element.x += dx;
            element.y += dy;
            moved = true;
        }
        if moved {
            self.emit(&StoreEvent::ElementsChanged);
        }
        moved
    }

    /// Move unlocked elements by a delta as one undo step.
    pub fn nudge(&mut self, ids: &[ElementId], dx: f64, dy: f64) -> bool {
        let movable = self.elements.iter().any(|el| !el.locked && ids.contains(&el.id));
        if !movable || !(dx.is_finite() && dy.is_finite()) || (dx == 0.0 && dy == 0.0) {
            return false;
        }
        self.checkpoint();
        let moved = self.translate(ids, dx, dy);
        if moved {
            self.record();
        }
        moved
    }

    // ------------------------------------------------------------------
    // Two-phase transforms
    // ------------------------------------------------------------------

    /// Start an interactive transform. Calling it again while one is open
    /// keeps the original starting point.
    pub fn begin_transform(&mut self) {
        if self.transform_origin.is_none() {
            self.transform_origin = Some(self.elements.clone());
        }
    }

    /// Whether a transform is open.
    #[must_use]
    pub fn is_transforming(&self) -> bool {
        self.transform_origin.is_some()
    }

    /// Close the open transform, recording one history state if anything
    /// changed since [`ElementStore::begin_transform`].
    pub fn commit_transform(&mut self) -> bool {
        let Some(origin) = self.transform_origin.take() else {
            return false;
        };
        if origin == self.elements {
            return false;
        }
        if self.history.current().elements() != origin.as_slice() {
            self.history.amend_current(&origin);
        }
        tracing::debug!("transform committed");
        self.record();
        true
    }

    /// Abandon the open transform, restoring the elements it started from.
    pub fn cancel_transform(&mut self) -> bool {
        let Some(origin) = self.transform_origin.take() else {
            return false;
        };
        if origin == self.elements {
            return false;
        }
        self.elements = origin;
        self.prune_selection();
        self.emit(&StoreEvent::ElementsChanged);
        true
    }

    // ------------------------------------------------------------------
    // Undo / redo
    // ------------------------------------------------------------------

    /// Whether undo is possible.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether redo is possible.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restore the previous history state and clear the selection.
    ///
    /// Unrecorded edits are folded into the state being left, so a following
    /// redo brings them back.
    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        self.checkpoint();
        match self.history.undo() {
            Some(elements) => {
                self.restore(elements);
                true
            }
            None => false,
        }
    }

    /// Restore the next history state and clear the selection.
    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        self.checkpoint();
        match self.history.redo() {
            Some(elements) => {
                self.restore(elements);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, elements: Vec<CanvasElement>) {
        self.transform_origin = None;
        self.elements = elements;
        self.emit(&StoreEvent::ElementsChanged);
        self.set_selection(Vec::new());
        self.emit_history();
    }

    fn prune_selection(&mut self) {
        let next = self
            .selection
            .iter()
            .copied()
            .filter(|id| self.contains(*id))
            .collect();
        self.set_selection(next);
    }

    // ------------------------------------------------------------------
    // Templates and frames
    // ------------------------------------------------------------------

    /// Replace the scene with fresh-id copies of a template's elements,
    /// keeping their z order. Recorded as one undo step.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] if a template element is invalid;
    /// the scene is unchanged.
    pub fn apply_template(&mut self, template: &[CanvasElement]) -> CanvasResult<Vec<ElementId>> {
        let mut checked = template.to_vec();
        for element in &mut checked {
            element.normalize(self.config.min_element_size)?;
        }
        let elements = fresh_copies(&checked, Point::ZERO, None);
        let ids = elements.iter().map(|el| el.id).collect();

        tracing::debug!(count = elements.len(), "template applied");
        self.checkpoint();
        self.elements = elements;
        self.warn_on_multiple_backgrounds();
        self.set_selection(Vec::new());
        self.record();
        self.emit(&StoreEvent::ElementsChanged);
        Ok(ids)
    }

    /// Link a content element to a frame and fit it into the frame's
    /// content area. Recorded as one undo step.
    ///
    /// Returns `Ok(false)` if either element does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] if `frame_id` is not a frame or is
    /// the content itself, and [`CanvasError::UnknownDevice`] if the frame's
    /// device is not in `devices`.
    pub fn link_frame_content<D>(
        &mut self,
        frame_id: ElementId,
        content_id: ElementId,
        devices: &D,
    ) -> CanvasResult<bool>
    where
        D: DeviceLookup + ?Sized,
    {
        if frame_id == content_id {
            return Err(CanvasError::validation("contentId", "a frame cannot contain itself"));
        }
        let (Some(frame), true) = (self.get(frame_id), self.contains(content_id)) else {
            return Ok(false);
        };
        let ElementKind::Frame(props) = &frame.kind else {
            return Err(CanvasError::validation(
                "frame",
                format!("expected a frame element, found {}", frame.kind.type_name()),
            ));
        };
        let device = devices.require(&props.device_id)?;
        let area = content_rect(device, frame.bounds());
        let min_size = self.config.min_element_size;
        self.checkpoint();

        for element in &mut self.elements {
            if element.id == frame_id {
                if let ElementKind::Frame(props) = &mut element.kind {
                    props.content_id = Some(content_id);
                }
            } else if element.id == content_id {
                element.x = area.x;
                element.y = area.y;
                element.width = (area.width / element.scale_x.abs()).max(min_size);
                element.height = (area.height / element.scale_y.abs()).max(min_size);
                element.rotation = 0.0;
            }
        }

        tracing::debug!(frame = %frame_id, content = %content_id, device = %device.id, "frame content linked");
        self.record();
        self.emit(&StoreEvent::ElementsChanged);
        Ok(true)
    }

    fn warn_on_multiple_backgrounds(&self) {
        let count = self.elements.iter().filter(|el| el.kind.is_background()).count();
        if count > 1 {
            tracing::warn!(count, "multiple background elements; the topmost one is used");
        }
    }

    // ------------------------------------------------------------------
    // Viewport
    // ------------------------------------------------------------------

    /// Change the viewport through a closure, notifying listeners if it changed.
    ///
    /// ```
    /// use studio_core::{ElementStore, Point};
    ///
    /// let mut store = ElementStore::default();
    /// store.update_viewport(|vp| vp.pan_by(10.0, 0.0));
    /// assert_eq!(store.viewport().offset(), Point::new(10.0, 0.0));
    /// ```
    pub fn update_viewport<R>(&mut self, change: impl FnOnce(&mut CanvasViewport) -> R) -> R {
        let before = self.viewport.clone();
        let result = change(&mut self.viewport);
        if self.viewport != before {
            self.emit(&StoreEvent::ViewportChanged);
        }
        result
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Snapshot the scene in its persistence format.
    #[must_use]
    pub fn to_document(&self) -> SceneDocument {
        SceneDocument::capture(&self.viewport, &self.elements)
    }

    /// Replace the session with a document's contents.
    ///
    /// Zoom and pan are kept. The history restarts with the document as its
    /// baseline; the selection and clipboard are cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas settings or any element are invalid, or
    /// if two elements share an id. The session is unchanged on error.
    pub fn load_document(&mut self, document: &SceneDocument) -> CanvasResult<()> {
        let mut viewport = self.viewport.clone();
        document.canvas.apply_to(&mut viewport)?;

        let mut seen = HashSet::with_capacity(document.elements.len());
        let mut elements = document.elements.clone();
        for element in &mut elements {
            if !seen.insert(element.id) {
                return Err(CanvasError::validation(
                    "id",
                    format!("duplicate element id {}", element.id),
                ));
            }
            element.normalize(self.config.min_element_size)?;
        }

        tracing::debug!(count = elements.len(), version = document.version, "document loaded");
        self.transform_origin = None;
        self.elements = elements;
        self.clipboard.clear();
        self.history.reset(&self.elements);
        self.warn_on_multiple_backgrounds();
        self.emit(&StoreEvent::ElementsChanged);
        self.set_selection(Vec::new());
        self.update_viewport(|vp| *vp = viewport);
        self.emit_history();
        Ok(())
    }

    /// Background fill painted behind the scene: the effective background
    /// element's fill, or the viewport's fallback color.
    #[must_use]
    pub fn backdrop(&self) -> BackgroundFill {
        match self.background().map(|el| &el.kind) {
            Some(ElementKind::Background(fill)) => fill.clone(),
            _ => BackgroundFill::Color {
                color: self.viewport.background_color.clone(),
            },
        }
    }
}

fn z_from_count(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// Copies with fresh ids, shifted by `offset`. With `first_z` the copies are
/// renumbered upward from it in order; frame links inside the set follow the
/// copies.
fn fresh_copies(sources: &[CanvasElement], offset: Point, first_z: Option<i64>) -> Vec<CanvasElement> {
    let mut remap = HashMap::with_capacity(sources.len());
    let mut copies: Vec<CanvasElement> = sources
        .iter()
        .map(|src| {
            let mut copy = src.clone();
            copy.id = ElementId::new();
            copy.x += offset.x;
            copy.y += offset.y;
            remap.insert(src.id, copy.id);
            copy
        })
        .collect();

    let mut next_z = first_z;
    for copy in &mut copies {
        if let Some(z) = next_z.as_mut() {
            copy.z_index = *z;
            *z += 1;
        }
        if let ElementKind::Frame(frame) = &mut copy.kind {
            if let Some(linked) = frame.content_id.and_then(|c| remap.get(&c)) {
                frame.content_id = Some(*linked);
            }
        }
    }
    copies
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::device::builtin_devices;
    use crate::element::{FrameProps, TextPatch, PayloadPatch};

    fn text_at(x: f64, y: f64, w: f64, h: f64) -> CanvasElement {
        CanvasElement::new(ElementKind::text("Hello")).with_bounds(Rect::new(x, y, w, h))
    }

    fn store_with(n: usize) -> (ElementStore, Vec<ElementId>) {
        let mut store = ElementStore::default();
        let ids = (0..n)
            .map(|i| {
                let offset = 10.0 * f64::from(u32::try_from(i).expect("small"));
                store.add(text_at(offset, offset, 50.0, 20.0)).expect("add")
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn test_add_assigns_z_and_selects() {
        let (store, ids) = store_with(3);
        let z: Vec<i64> = ids.iter().map(|id| store.get(*id).expect("exists").z_index).collect();
        assert_eq!(z, vec![0, 1, 2]);
        assert_eq!(store.selection(), &[ids[2]]);
        assert_eq!(store.history().len(), 3);
    }

    #[test]
    fn test_add_then_undo_restores_empty_canvas() {
        let mut store = ElementStore::default();
        let id = store.add(text_at(0.0, 0.0, 100.0, 20.0)).expect("add");
        assert_eq!(store.len(), 1);
        assert_eq!(store.selection(), &[id]);
        assert_eq!(store.history().len(), 1);

        assert!(store.undo());
        assert_eq!(store.len(), 0);
        assert_eq!(store.history().current_index(), 0);
        assert!(!store.can_undo());
        assert!(store.selection().is_empty());
    }

    #[test]
    fn test_add_rejects_invalid_without_change() {
        let mut store = ElementStore::default();
        let err = store
            .add(text_at(0.0, 0.0, 10.0, 10.0).with_opacity(2.0))
            .expect_err("invalid");
        assert_eq!(err.field(), Some("opacity"));
        assert!(store.is_empty());
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_update_missing_is_noop() {
        let mut store = ElementStore::default();
        let changed = store
            .update(ElementId::new(), &ElementPatch::position(1.0, 1.0))
            .expect("update");
        assert!(!changed);
    }

    #[test]
    fn test_update_does_not_record_history() {
        let (mut store, ids) = store_with(1);
        let patch = ElementPatch::payload(PayloadPatch::Text(TextPatch {
            content: Some("Bye".to_string()),
            ..TextPatch::default()
        }));
        assert!(store.update(ids[0], &patch).expect("update"));
        assert_eq!(store.history().len(), 1);
        let ElementKind::Text(text) = &store.get(ids[0]).expect("exists").kind else {
            panic!("kind changed");
        };
        assert_eq!(text.content, "Bye");
    }

    #[test]
    fn test_delete_prunes_selection_and_clipboard() {
        let (mut store, ids) = store_with(2);
        store.select(&ids);
        assert_eq!(store.copy(None), 2);
        assert_eq!(store.delete(&[ids[0], ElementId::new()]), 1);
        assert_eq!(store.selection(), &[ids[1]]);
        assert_eq!(store.clipboard().len(), 1);
        assert_eq!(store.history().len(), 3);
    }

    #[test]
    fn test_delete_missing_records_nothing() {
        let (mut store, _) = store_with(1);
        assert_eq!(store.delete(&[ElementId::new()]), 0);
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_duplicate_offsets_and_stacks() {
        let (mut store, ids) = store_with(2);
        let copies = store.duplicate(&ids);
        assert_eq!(copies.len(), 2);
        assert_eq!(store.selection(), copies.as_slice());
        for (src, copy) in ids.iter().zip(&copies) {
            let src = store.get(*src).expect("source");
            let copy = store.get(*copy).expect("copy");
            assert!((copy.x - src.x - 20.0).abs() < f64::EPSILON);
            assert!((copy.y - src.y - 20.0).abs() < f64::EPSILON);
            assert!(copy.z_index > 1);
        }
        let first = store.get(copies[0]).expect("copy").z_index;
        let second = store.get(copies[1]).expect("copy").z_index;
        assert!(first < second);
    }

    #[test]
    fn test_z_order_operations() {
        let (mut store, ids) = store_with(3);
        assert!(store.bring_to_front(&[ids[0]]));
        assert_eq!(store.get(ids[0]).expect("el").z_index, 3);

        assert!(store.send_to_back(&[ids[2]]));
        assert_eq!(store.get(ids[2]).expect("el").z_index, 0);

        // Already at zero: backward is clamped and records nothing.
        let len = store.history().len();
        assert!(!store.send_backward(&[ids[2]]));
        assert_eq!(store.history().len(), len);

        assert!(store.bring_forward(&[ids[1]]));
        assert_eq!(store.get(ids[1]).expect("el").z_index, 2);

        let order: Vec<ElementId> = store.ordered_elements().iter().map(|el| el.id).collect();
        assert_eq!(order, vec![ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn test_ordered_elements_breaks_ties_by_insertion() {
        let (mut store, ids) = store_with(3);
        store.send_backward(&[ids[1]]);
        // ids[0] and ids[1] both at z 0; ids[0] was inserted first.
        let order: Vec<ElementId> = store.ordered_elements().iter().map(|el| el.id).collect();
        assert_eq!(order, vec![ids[0], ids[1], ids[2]]);
    }

    #[test]
    fn test_select_ignores_unknown_ids() {
        let (mut store, ids) = store_with(1);
        store.select(&[ElementId::new(), ids[0], ids[0]]);
        assert_eq!(store.selection(), &[ids[0]]);
    }

    #[test]
    fn test_toggle_and_select_all() {
        let (mut store, ids) = store_with(3);
        let lock = ElementPatch {
            locked: Some(true),
            ..ElementPatch::default()
        };
        store.update(ids[1], &lock).expect("lock");
        store.select_all();
        assert_eq!(store.selection(), &[ids[0], ids[2]]);
        store.toggle_selection(ids[0]);
        assert_eq!(store.selection(), &[ids[2]]);
        store.toggle_selection(ids[0]);
        assert_eq!(store.selection(), &[ids[2], ids[0]]);
    }

    #[test]
    fn test_select_in_rect_requires_full_containment() {
        let mut store = ElementStore::default();
        let partial = store.add(text_at(50.0, 50.0, 80.0, 80.0)).expect("add");
        let inside = store.add(text_at(10.0, 10.0, 50.0, 50.0)).expect("add");
        assert_eq!(store.select_in_rect(Rect::new(0.0, 0.0, 100.0, 100.0), false), 1);
        assert_eq!(store.selection(), &[inside]);
        assert!(!store.is_selected(partial));
    }

    #[test]
    fn test_cut_keeps_clipboard_and_paste_offsets() {
        let (mut store, ids) = store_with(1);
        assert_eq!(store.cut(Some(ids.as_slice())), 1);
        assert!(store.is_empty());
        assert_eq!(store.clipboard().len(), 1);

        let pasted = store.paste();
        assert_eq!(pasted.len(), 1);
        let el = store.get(pasted[0]).expect("pasted");
        assert_ne!(el.id, ids[0]);
        assert!((el.x - 20.0).abs() < f64::EPSILON);
        assert_eq!(store.selection(), pasted.as_slice());
    }

    #[test]
    fn test_copy_does_not_record_history() {
        let (mut store, ids) = store_with(1);
        store.copy(Some(ids.as_slice()));
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_paste_empty_clipboard_is_noop() {
        let mut store = ElementStore::default();
        assert!(store.paste().is_empty());
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_transform_commit_records_once() {
        let (mut store, ids) = store_with(1);
        store.begin_transform();
        for _ in 0..10 {
            store.translate(&ids, 1.0, 2.0);
        }
        assert!(store.commit_transform());
        assert_eq!(store.history().len(), 2);
        let el = store.get(ids[0]).expect("el");
        assert!((el.x - 10.0).abs() < f64::EPSILON);

        assert!(store.undo());
        let el = store.get(ids[0]).expect("el");
        assert!(el.x.abs() < f64::EPSILON);
    }

    #[test]
    fn test_transform_without_change_records_nothing() {
        let (mut store, _) = store_with(1);
        store.begin_transform();
        assert!(!store.commit_transform());
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_cancel_transform_restores() {
        let (mut store, ids) = store_with(1);
        store.begin_transform();
        store.translate(&ids, 50.0, 0.0);
        assert!(store.cancel_transform());
        assert!(store.get(ids[0]).expect("el").x.abs() < f64::EPSILON);
        assert!(!store.is_transforming());
    }

    #[test]
    fn test_undo_after_bare_update_keeps_the_edit() {
        let mut store = ElementStore::default();
        let a = store.add(text_at(0.0, 0.0, 50.0, 20.0)).expect("add a");
        assert!(store.update(a, &ElementPatch::position(300.0, 300.0)).expect("update"));
        let before = store.elements().to_vec();

        store.add(text_at(0.0, 0.0, 10.0, 10.0)).expect("add b");
        assert!(store.undo());
        assert_eq!(store.elements(), before.as_slice());

        assert!(store.undo());
        assert!(store.is_empty());
        assert!(store.redo());
        assert_eq!(store.elements(), before.as_slice());
    }

    #[test]
    fn test_redo_restores_translate_made_before_undo() {
        let (mut store, ids) = store_with(2);
        assert!(store.undo());
        assert!(store.translate(&ids[..1], 40.0, 0.0));
        let moved = store.elements().to_vec();

        assert!(store.undo());
        assert!(store.redo());
        assert_eq!(store.elements(), moved.as_slice());
    }

    #[test]
    fn test_commit_after_bare_update_undoes_to_live_start() {
        let (mut store, ids) = store_with(1);
        store
            .update(ids[0], &ElementPatch::size(80.0, 80.0))
            .expect("update");
        let before = store.elements().to_vec();

        store.begin_transform();
        store.translate(&ids, 5.0, 5.0);
        assert!(store.commit_transform());
        assert!(store.undo());
        assert_eq!(store.elements(), before.as_slice());
    }

    #[test]
    fn test_delete_during_transform_records_once() {
        let (mut store, ids) = store_with(2);
        store.begin_transform();
        store.translate(&ids[..1], 25.0, 0.0);
        let dragged = store.elements().to_vec();

        assert_eq!(store.delete(&ids[1..]), 1);
        assert!(!store.is_transforming());
        assert!(!store.commit_transform());
        assert_eq!(store.history().len(), 3);

        assert!(store.undo());
        assert_eq!(store.elements(), dragged.as_slice());
    }

    #[test]
    fn test_locked_elements_do_not_move() {
        let mut store = ElementStore::default();
        let id = store.add(text_at(0.0, 0.0, 10.0, 10.0).with_locked(true)).expect("add");
        assert!(!store.nudge(&[id], 5.0, 5.0));
    }

    #[test]
    fn test_place_returns_to_select() {
        let mut store = ElementStore::default();
        store.set_tool(Tool::Shape(ShapeKind::Circle));
        let id = store.place(Point::new(40.0, 60.0)).expect("place").expect("placed");
        assert_eq!(store.tool(), &Tool::Select);
        let el = store.get(id).expect("el");
        assert!(matches!(el.kind, ElementKind::Shape(_)));
        assert!((el.x - 40.0).abs() < f64::EPSILON);
        assert!(store.place(Point::ZERO).expect("place").is_none());
    }

    #[test]
    fn test_hit_test_prefers_topmost_and_skips_background() {
        let mut store = ElementStore::default();
        store.add(CanvasElement::new(ElementKind::solid_background("#000"))).expect("add");
        let lower = store.add(text_at(0.0, 0.0, 100.0, 100.0)).expect("add");
        let upper = store.add(text_at(50.0, 50.0, 100.0, 100.0)).expect("add");
        assert_eq!(store.hit_test(Point::new(75.0, 75.0)), Some(upper));
        assert_eq!(store.hit_test(Point::new(10.0, 10.0)), Some(lower));
        assert_eq!(store.hit_test(Point::new(900.0, 900.0)), None);
    }

    #[test]
    fn test_last_background_wins() {
        let mut store = ElementStore::default();
        store.add(CanvasElement::new(ElementKind::solid_background("#111111"))).expect("add");
        let top = store
            .add(CanvasElement::new(ElementKind::solid_background("#222222")))
            .expect("add");
        assert_eq!(store.background().map(|el| el.id), Some(top));
        assert_eq!(
            store.backdrop(),
            BackgroundFill::Color {
                color: "#222222".to_string()
            }
        );
    }

    #[test]
    fn test_backdrop_falls_back_to_viewport_color() {
        let store = ElementStore::default();
        assert_eq!(
            store.backdrop(),
            BackgroundFill::Color {
                color: "#ffffff".to_string()
            }
        );
    }

    #[test]
    fn test_link_frame_content_fits_content_area() {
        let devices = builtin_devices();
        let device = devices.get("iphone-15-pro").expect("device").clone();
        let mut store = ElementStore::default();
        let frame = store
            .add(
                CanvasElement::new(ElementKind::frame(device.id.clone()))
                    .with_bounds(Rect::new(100.0, 100.0, device.frame_width / 4.0, device.frame_height / 4.0)),
            )
            .expect("add frame");
        let content = store.add(text_at(0.0, 0.0, 10.0, 10.0)).expect("add content");

        assert!(store.link_frame_content(frame, content, &devices).expect("link"));
        let el = store.get(content).expect("content");
        assert!((el.x - device.content_area.x.mul_add(0.25, 100.0)).abs() < 1e-9);
        assert!((el.width - device.content_area.width * 0.25).abs() < 1e-9);
        let ElementKind::Frame(FrameProps { content_id, .. }) = &store.get(frame).expect("frame").kind else {
            panic!("not a frame");
        };
        assert_eq!(*content_id, Some(content));

        // Deleting the content unlinks the frame.
        store.delete(&[content]);
        let ElementKind::Frame(props) = &store.get(frame).expect("frame").kind else {
            panic!("not a frame");
        };
        assert!(props.content_id.is_none());
    }

    #[test]
    fn test_link_frame_content_errors() {
        let devices = builtin_devices();
        let (mut store, ids) = store_with(2);
        let err = store
            .link_frame_content(ids[0], ids[1], &devices)
            .expect_err("not a frame");
        assert_eq!(err.field(), Some("frame"));

        let frame = store.add(CanvasElement::new(ElementKind::frame("nokia-3310"))).expect("add");
        assert!(matches!(
            store.link_frame_content(frame, ids[0], &devices),
            Err(CanvasError::UnknownDevice(_))
        ));
        assert!(!store
            .link_frame_content(frame, ElementId::new(), &devices)
            .expect("missing content"));
    }

    #[test]
    fn test_update_rejects_bad_frame_content_link() {
        let (mut store, ids) = store_with(1);
        let frame = store.add(CanvasElement::new(ElementKind::frame("pixel-8"))).expect("add");
        let link = |content| {
            ElementPatch::payload(PayloadPatch::Frame(FramePatch {
                content_id: Some(Some(content)),
                ..FramePatch::default()
            }))
        };

        let err = store.update(frame, &link(frame)).expect_err("self link");
        assert_eq!(err.field(), Some("contentId"));
        let err = store.update(frame, &link(ElementId::new())).expect_err("missing");
        assert_eq!(err.field(), Some("contentId"));

        assert!(store.update(frame, &link(ids[0])).expect("link"));
        let unlink: ElementPatch =
            serde_json::from_str(r#"{"payload": {"type": "frame", "data": {"contentId": null}}}"#)
                .expect("parse");
        assert!(store.update(frame, &unlink).expect("unlink"));
        let ElementKind::Frame(props) = &store.get(frame).expect("frame").kind else {
            panic!("expected a frame");
        };
        assert_eq!(props.content_id, None);
    }

    #[test]
    fn test_apply_template_uses_fresh_ids() {
        let template = vec![
            CanvasElement::new(ElementKind::solid_background("#fafafa")),
            text_at(10.0, 10.0, 100.0, 40.0),
        ];
        let (mut store, _) = store_with(2);
        let ids = store.apply_template(&template).expect("apply");
        assert_eq!(store.len(), 2);
        assert!(ids.iter().all(|id| template.iter().all(|t| t.id != *id)));
        assert!(store.selection().is_empty());
        assert!(store.undo());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_listeners_receive_events() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let mut store = ElementStore::default();
        let sub = store.subscribe(move |event| {
            sink.lock().expect("lock").push(event.clone());
        });

        store.add(text_at(0.0, 0.0, 10.0, 10.0)).expect("add");
        store.update_viewport(|vp| vp.pan_by(5.0, 5.0));
        store.set_tool(Tool::Pan);
        {
            let seen = events.lock().expect("lock");
            assert!(seen.contains(&StoreEvent::ElementsChanged));
            assert!(seen.contains(&StoreEvent::SelectionChanged));
            assert!(seen.contains(&StoreEvent::ViewportChanged));
            assert!(seen.contains(&StoreEvent::ToolChanged(Tool::Pan)));
            assert!(seen.contains(&StoreEvent::HistoryChanged {
                can_undo: true,
                can_redo: false
            }));
        }

        assert!(store.unsubscribe(sub));
        let count = events.lock().expect("lock").len();
        store.clear_selection();
        assert_eq!(events.lock().expect("lock").len(), count);
    }

    #[test]
    fn test_unchanged_viewport_emits_nothing() {
        let events = Arc::new(Mutex::new(0_usize));
        let sink = Arc::clone(&events);
        let mut store = ElementStore::default();
        store.subscribe(move |_| *sink.lock().expect("lock") += 1);
        store.update_viewport(|vp| vp.pan_by(0.0, 0.0));
        assert_eq!(*events.lock().expect("lock"), 0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = EditorConfig {
            max_history_size: 0,
            ..EditorConfig::default()
        };
        assert!(ElementStore::new(config).is_err());
    }
}
