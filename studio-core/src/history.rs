//! Linear undo/redo history of full-scene snapshots.
//!
//! The history is a sequence of states `0..=len` with a cursor. State 0 is the
//! baseline (the scene as it was when editing started or a document was
//! loaded); every recorded mutation appends one state after it. `len()` counts
//! recorded mutations, so a fresh history has length 0 and cannot undo.
//!
//! ```text
//!  baseline   s1   s2   s3
//!     [0] ── [1] ─ [2] ─ [3]
//!                   ^ current_index = 2: undo -> 1, redo -> 3
//! ```
//!
//! Recording after an undo discards everything past the cursor. When the
//! number of recorded states exceeds the bound, the oldest one becomes the new
//! baseline.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::element::CanvasElement;
use crate::store::current_timestamp_ms;

/// Default bound on recorded states.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// An immutable copy of the full element list.
///
/// Elements are plain data, so cloning the list is a deep copy. The list is
/// shared behind an [`Arc`] so handing a snapshot out never copies it again.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    elements: Arc<[CanvasElement]>,
    /// Capture time in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl HistorySnapshot {
    /// Capture a snapshot of `elements`.
    #[must_use]
    pub fn capture(elements: &[CanvasElement]) -> Self {
        Self {
            elements: Arc::from(elements),
            timestamp: current_timestamp_ms(),
        }
    }

    /// The captured elements.
    #[must_use]
    pub fn elements(&self) -> &[CanvasElement] {
        &self.elements
    }

    /// Owned copy of the captured elements, for restoring into a live scene.
    #[must_use]
    pub fn to_vec(&self) -> Vec<CanvasElement> {
        self.elements.to_vec()
    }
}

/// Undo/redo manager.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    states: VecDeque<HistorySnapshot>,
    current: usize,
    max_size: usize,
}

impl HistoryManager {
    /// Create a history whose baseline is `initial`.
    ///
    /// A `max_size` of 0 is treated as 1.
    #[must_use]
    pub fn new(initial: &[CanvasElement], max_size: usize) -> Self {
        let mut states = VecDeque::with_capacity(max_size.min(64) + 1);
        states.push_back(HistorySnapshot::capture(initial));
        Self {
            states,
            current: 0,
            max_size: max_size.max(1),
        }
    }

    /// Drop all recorded states and start over from `baseline`.
    pub fn reset(&mut self, baseline: &[CanvasElement]) {
        self.states.clear();
        self.states.push_back(HistorySnapshot::capture(baseline));
        self.current = 0;
    }

    /// Record the state after a mutation.
    pub fn snapshot(&mut self, elements: &[CanvasElement]) {
        self.states.truncate(self.current + 1);
        self.states.push_back(HistorySnapshot::capture(elements));
        self.current += 1;

        while self.states.len() - 1 > self.max_size {
            self.states.pop_front();
            self.current -= 1;
        }
        self.check_invariant();
        tracing::debug!(
            index = self.current,
            len = self.len(),
            "history snapshot recorded"
        );
    }

    /// Replace the snapshot at the cursor with `elements`.
    ///
    /// Used to fold unrecorded edits into the current state so the next
    /// recorded state undoes to the scene as it really was. The redo branch
    /// is kept.
    pub fn amend_current(&mut self, elements: &[CanvasElement]) {
        self.states[self.current] = HistorySnapshot::capture(elements);
        tracing::trace!(index = self.current, "history state amended");
    }

    /// Step back one state and return the elements to restore.
    pub fn undo(&mut self) -> Option<Vec<CanvasElement>> {
        if !self.can_undo() {
            return None;
        }
        self.current -= 1;
        self.check_invariant();
        Some(self.states[self.current].to_vec())
    }

    /// Step forward one state and return the elements to restore.
    pub fn redo(&mut self) -> Option<Vec<CanvasElement>> {
        if !self.can_redo() {
            return None;
        }
        self.current += 1;
        self.check_invariant();
        Some(self.states[self.current].to_vec())
    }

    /// Whether there is a state to step back to.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    /// Whether there is an undone state to step forward to.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.states.len()
    }

    /// Number of recorded states, excluding the baseline.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len() - 1
    }

    /// Whether nothing has been recorded since the baseline.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cursor position; 0 means the baseline is current.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Bound on recorded states.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// The snapshot at the cursor.
    #[must_use]
    pub fn current(&self) -> &HistorySnapshot {
        &self.states[self.current]
    }

    fn check_invariant(&self) {
        debug_assert!(
            self.current < self.states.len(),
            "history cursor {} out of bounds for {} states",
            self.current,
            self.states.len()
        );
        debug_assert!(self.states.len() - 1 <= self.max_size);
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(&[], DEFAULT_MAX_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind;

    fn scene(n: usize) -> Vec<CanvasElement> {
        (0..n)
            .map(|i| CanvasElement::new(ElementKind::text(format!("el {i}"))))
            .collect()
    }

    #[test]
    fn test_fresh_history_cannot_move() {
        let mut history = HistoryManager::default();
        assert!(history.is_empty());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_undo_redo_walks_states() {
        let s1 = scene(1);
        let s2 = scene(2);
        let mut history = HistoryManager::default();
        history.snapshot(&s1);
        history.snapshot(&s2);
        assert_eq!(history.len(), 2);
        assert_eq!(history.current_index(), 2);

        assert_eq!(history.undo().expect("undo"), s1);
        assert_eq!(history.undo().expect("undo"), Vec::new());
        assert!(!history.can_undo());

        assert_eq!(history.redo().expect("redo"), s1);
        assert_eq!(history.redo().expect("redo"), s2);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_snapshot_after_undo_discards_redo_branch() {
        let mut history = HistoryManager::default();
        history.snapshot(&scene(1));
        history.snapshot(&scene(2));
        history.undo();
        assert!(history.can_redo());

        let s3 = scene(3);
        history.snapshot(&s3);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert_eq!(history.current().elements(), s3.as_slice());
    }

    #[test]
    fn test_bounded_history_evicts_oldest() {
        let mut history = HistoryManager::new(&[], 3);
        let scenes: Vec<_> = (1..=5).map(scene).collect();
        for s in &scenes {
            history.snapshot(s);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.current_index(), 3);
        assert_eq!(history.current().elements(), scenes[4].as_slice());

        // Oldest reachable state is now the promoted baseline (scene 2).
        for _ in 0..3 {
            history.undo();
        }
        assert!(!history.can_undo());
        assert_eq!(history.current().elements(), scenes[1].as_slice());
    }

    #[test]
    fn test_reset_replaces_baseline() {
        let mut history = HistoryManager::default();
        history.snapshot(&scene(1));
        let baseline = scene(4);
        history.reset(&baseline);
        assert!(history.is_empty());
        assert_eq!(history.current().elements(), baseline.as_slice());
    }

    #[test]
    fn test_amend_current_rewrites_cursor_state() {
        let mut history = HistoryManager::default();
        history.snapshot(&scene(1));
        history.snapshot(&scene(2));
        history.undo();

        let edited = scene(3);
        history.amend_current(&edited);
        assert_eq!(history.len(), 2);
        assert_eq!(history.current().elements(), edited.as_slice());
        assert!(history.can_redo());

        history.redo();
        assert_eq!(history.undo().expect("undo"), edited);
    }

    #[test]
    fn test_zero_max_size_is_treated_as_one() {
        let mut history = HistoryManager::new(&[], 0);
        history.snapshot(&scene(1));
        history.snapshot(&scene(2));
        assert_eq!(history.max_size(), 1);
        assert_eq!(history.len(), 1);
    }
}
