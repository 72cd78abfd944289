//! Selection state machine.
//!
//! Each bubble is either selected or not. Transitions happen only here, so
//! the controller's record of selected ids and the bubbles' flags never
//! disagree, and every transition reaches the delegate exactly once.

use tracing::trace;

use crate::{bubble::Bubble, delegate::Notifier, types::BubbleId};

#[derive(Clone, Debug, Default)]
pub struct SelectionController {
    pub allows_multiple_selection: bool,
    /// Selected ids, oldest first.
    selected: Vec<BubbleId>,
}

impl SelectionController {
    pub fn new(allows_multiple_selection: bool) -> Self {
        Self {
            allows_multiple_selection,
            selected: Vec::new(),
        }
    }

    pub fn selected(&self) -> &[BubbleId] {
        &self.selected
    }

    pub fn is_selected(&self, id: BubbleId) -> bool {
        self.selected.contains(&id)
    }

    /// Handles a committed tap: deselects a selected bubble, selects any other.
    pub fn toggle(&mut self, bubbles: &mut [Bubble], id: BubbleId, notifier: &mut Notifier) -> bool {
        if self.is_selected(id) {
            self.deselect(bubbles, id, notifier)
        } else {
            self.select(bubbles, id, notifier)
        }
    }

    /// Selects `id`. In single-select mode the previous selection is
    /// deselected, and notified, first.
    ///
    /// Returns `false` without side effects when `id` is unknown, leaving,
    /// or already selected.
    pub fn select(&mut self, bubbles: &mut [Bubble], id: BubbleId, notifier: &mut Notifier) -> bool {
        match bubbles.iter().find(|b| b.id() == id) {
            Some(b) if !b.is_removing() && !b.is_selected() => {}
            _ => return false,
        }

        if !self.allows_multiple_selection {
            let previous = std::mem::take(&mut self.selected);
            for other in previous {
                if let Some(b) = bubbles.iter_mut().find(|b| b.id() == other)
                    && b.set_selected(false)
                {
                    notifier.deselected(b);
                }
            }
        }

        let Some(bubble) = bubbles.iter_mut().find(|b| b.id() == id) else {
            return false;
        };
        bubble.set_selected(true);
        self.selected.push(id);
        trace!(id, selected = self.selected.len(), "selection grew");
        notifier.selected(bubble);
        true
    }

    /// Deselects `id`. Returns `false` when it was not selected.
    pub fn deselect(&mut self, bubbles: &mut [Bubble], id: BubbleId, notifier: &mut Notifier) -> bool {
        let Some(bubble) = bubbles.iter_mut().find(|b| b.id() == id) else {
            self.forget(id);
            return false;
        };
        if !bubble.set_selected(false) {
            return false;
        }
        self.forget(id);
        notifier.deselected(bubble);
        true
    }

    /// Drops any record of `id`. Called when its bubble goes away.
    pub fn forget(&mut self, id: BubbleId) {
        self.selected.retain(|&s| s != id);
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}
