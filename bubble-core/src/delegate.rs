//! Notifications from the scene to its host.

use std::{cell::RefCell, rc::Rc};

use tracing::debug;

use crate::{bubble::Bubble, types::BubbleId};

/// Receives selection and removal transitions as they happen.
///
/// Calls are made synchronously from inside the scene operation that caused
/// them.
pub trait SceneDelegate {
    fn did_select(&mut self, bubble: &Bubble);
    fn did_deselect(&mut self, bubble: &Bubble);
    fn did_remove(&mut self, _bubble: &Bubble) {}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneEvent {
    Selected { id: BubbleId, name: String },
    Deselected { id: BubbleId, name: String },
    Removed { id: BubbleId, name: String },
}

impl SceneEvent {
    pub fn name(&self) -> &str {
        match self {
            SceneEvent::Selected { name, .. }
            | SceneEvent::Deselected { name, .. }
            | SceneEvent::Removed { name, .. } => name,
        }
    }
}

/// A delegate that records every event. Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct EventLog(Rc<RefCell<Vec<SceneEvent>>>);

impl EventLog {
    /// Drains and returns the recorded events.
    pub fn take(&self) -> Vec<SceneEvent> {
        std::mem::take(&mut *self.0.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    fn push(&self, event: SceneEvent) {
        self.0.borrow_mut().push(event);
    }
}

impl SceneDelegate for EventLog {
    fn did_select(&mut self, bubble: &Bubble) {
        self.push(SceneEvent::Selected {
            id: bubble.id(),
            name: bubble.name().to_owned(),
        });
    }

    fn did_deselect(&mut self, bubble: &Bubble) {
        self.push(SceneEvent::Deselected {
            id: bubble.id(),
            name: bubble.name().to_owned(),
        });
    }

    fn did_remove(&mut self, bubble: &Bubble) {
        self.push(SceneEvent::Removed {
            id: bubble.id(),
            name: bubble.name().to_owned(),
        });
    }
}

/// Optional delegate slot owned by the scene.
#[derive(Default)]
pub struct Notifier {
    delegate: Option<Box<dyn SceneDelegate>>,
}

impl Notifier {
    pub fn set(&mut self, delegate: Option<Box<dyn SceneDelegate>>) {
        self.delegate = delegate;
    }

    pub fn selected(&mut self, bubble: &Bubble) {
        debug!(id = bubble.id(), name = bubble.name(), "selected");
        if let Some(d) = self.delegate.as_mut() {
            d.did_select(bubble);
        }
    }

    pub fn deselected(&mut self, bubble: &Bubble) {
        debug!(id = bubble.id(), name = bubble.name(), "deselected");
        if let Some(d) = self.delegate.as_mut() {
            d.did_deselect(bubble);
        }
    }

    pub fn removed(&mut self, bubble: &Bubble) {
        debug!(id = bubble.id(), name = bubble.name(), "removed");
        if let Some(d) = self.delegate.as_mut() {
            d.did_remove(bubble);
        }
    }
}
