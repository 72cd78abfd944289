//! Pointer and pinch handling on top of a [`Scene`].
//!
//! The host feeds press and pinch events in world coordinates. A press that
//! moves becomes a drag that stirs every bubble; a press released in place
//! becomes a tap, or a removal when it was held long enough.

use glam::Vec2;
use tracing::trace;

use crate::{scene::Scene, types::BubbleId};

/// View transform over the scene. Larger scales show more of the world.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec2,
    pub scale: f32,
}

impl Camera {
    /// A camera looking at the center of a canvas of `size`.
    pub fn centered(size: Vec2) -> Self {
        Self {
            position: size * 0.5,
            scale: 1.0,
        }
    }

    /// Converts a world point to an offset from the view center.
    pub fn world_to_view(&self, p: Vec2) -> Vec2 {
        (p - self.position) / self.scale
    }

    /// Inverse of [`Camera::world_to_view`].
    pub fn view_to_world(&self, v: Vec2) -> Vec2 {
        v * self.scale + self.position
    }
}

/// What a completed press did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PressOutcome {
    /// Released over empty space.
    Nothing,
    /// The press moved and was treated as a drag.
    Dragged,
    /// The bubble's selection was toggled.
    Toggled(BubbleId),
    /// The bubble was held long enough and is being removed.
    Removed(BubbleId),
}

#[derive(Clone, Copy, Debug)]
struct PinchSession {
    start_scale: f32,
}

/// Gesture state for one pointer and one pinch at a time.
#[derive(Clone, Debug)]
pub struct InteractionController {
    camera: Camera,
    last_pointer: Option<Vec2>,
    press_started: Option<f64>,
    dragging: bool,
    pinch: Option<PinchSession>,
}

impl InteractionController {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            last_pointer: None,
            press_started: None,
            dragging: false,
            pinch: None,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    /// Starts a press at `location`; `time` is in seconds.
    ///
    /// The press time is only recorded while long-press removal is enabled.
    pub fn press_begin(&mut self, scene: &Scene, location: Vec2, time: f64) {
        self.last_pointer = Some(location);
        self.press_started = scene.config().remove_on_long_press.then_some(time);
    }

    /// Moves the pointer. Any real displacement turns the press into a drag:
    /// the global field switches off and every bubble gets a push along the
    /// motion, stronger the farther it is from the pointer.
    pub fn press_move(&mut self, scene: &mut Scene, location: Vec2) {
        let previous = self.last_pointer.replace(location).unwrap_or(location);
        let delta = location - previous;
        if delta == Vec2::ZERO {
            return;
        }
        self.dragging = true;
        scene.set_field_enabled(false);
        stir(scene, location, delta);
    }

    /// Ends the press at `location`, recentering the global field there.
    ///
    /// The field comes back on unless a pinch is still holding it off.
    pub fn press_end(&mut self, scene: &mut Scene, location: Vec2, time: f64) -> PressOutcome {
        let started = self.press_started.take();
        self.last_pointer = None;
        scene.move_field_to(location);
        if !self.is_pinching() {
            scene.set_field_enabled(true);
        }

        if std::mem::take(&mut self.dragging) {
            return PressOutcome::Dragged;
        }
        let Some(id) = scene.bubble_at(location) else {
            return PressOutcome::Nothing;
        };

        let selected = scene.get(id).is_some_and(|b| b.is_selected());
        if scene.config().remove_on_long_press
            && !selected
            && let Some(started) = started
            && time - started >= scene.config().long_press_duration
        {
            scene.remove(id, true);
            return PressOutcome::Removed(id);
        }

        scene.tap(id);
        PressOutcome::Toggled(id)
    }

    /// Abandons the press without tapping anything.
    pub fn press_cancel(&mut self, scene: &mut Scene) {
        self.dragging = false;
        self.press_started = None;
        self.last_pointer = None;
        if !self.is_pinching() {
            scene.set_field_enabled(true);
        }
    }

    pub fn pinch_begin(&mut self, scene: &mut Scene) {
        scene.set_field_enabled(false);
        self.pinch = Some(PinchSession {
            start_scale: self.camera.scale,
        });
    }

    /// Applies the gesture's cumulative scale factor since it began.
    pub fn pinch_change(&mut self, gesture_scale: f32) {
        let Some(session) = self.pinch else {
            return;
        };
        if gesture_scale > 0.0 {
            self.camera.scale = session.start_scale / gesture_scale;
        }
    }

    pub fn pinch_end(&mut self, scene: &mut Scene, gesture_scale: f32) {
        self.pinch_change(gesture_scale);
        self.pinch = None;
        scene.set_field_enabled(true);
    }
}

fn stir(scene: &mut Scene, location: Vec2, delta: Vec2) {
    let scale = scene.config().physics.drag_scale;
    for body in scene.bodies_mut() {
        let distance = body.position.distance(location);
        body.apply_force(delta * (2.0 * distance.sqrt()) * scale);
    }
    trace!(?location, ?delta, "stirred bubbles");
}
