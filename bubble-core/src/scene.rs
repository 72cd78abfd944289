//! The layout engine: owns every bubble, the global field and the world.
//!
//! Per frame the host calls [`Scene::tick`], which, in order:
//! 1. runs scheduled actions that have come due (the reset sweep),
//! 2. advances bubble animations and destroys bubbles whose exit finished,
//! 3. steps the physics unless the world speed is zero.

use glam::Vec2;
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::{
    animation::Scheduler,
    bubble::{Bubble, Preset, RemovalKind},
    color::{self, Color},
    config::SceneConfig,
    delegate::{Notifier, SceneDelegate},
    field::{Category, Field, Region},
    physics::{self, Body, Boundary},
    selection::SelectionController,
    types::BubbleId,
};

/// Delay between consecutive removals of a reset sweep, in seconds.
pub const RESET_STAGGER: f64 = 0.002;
/// How far above the top edge selected bubbles are thrown on reset.
pub const THROW_OVERSHOOT: f32 = 40.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SceneAction {
    /// Remove a bubble as part of a reset: selected bubbles are thrown off
    /// the top first, the rest vanish at once.
    Sweep(BubbleId),
}

#[derive(Debug)]
struct ResetSequence {
    saved_speed: f32,
    pending: Vec<BubbleId>,
}

pub struct Scene {
    config: SceneConfig,
    bubbles: Vec<Bubble>,
    next_id: BubbleId,
    field: Field,
    boundary: Boundary,
    physics_speed: f32,
    selection: SelectionController,
    notifier: Notifier,
    scheduler: Scheduler<SceneAction>,
    reset: Option<ResetSequence>,
    rng: StdRng,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut scene = Self {
            config,
            bubbles: Vec::new(),
            next_id: 0,
            field: Field::radial_gravity(Category::BIG_FIELD),
            boundary: Boundary {
                min: Vec2::ZERO,
                max: config.size,
            },
            physics_speed: 1.0,
            selection: SelectionController::new(config.allows_multiple_selection),
            notifier: Notifier::default(),
            scheduler: Scheduler::default(),
            reset: None,
            rng,
        };
        scene.configure();
        scene
    }

    pub fn set_delegate(&mut self, delegate: impl SceneDelegate + 'static) {
        self.notifier.set(Some(Box::new(delegate)));
    }

    pub fn clear_delegate(&mut self) {
        self.notifier.set(None);
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn size(&self) -> Vec2 {
        self.config.size
    }

    /// Changes the canvas size and reconfigures the field and boundary.
    pub fn resize(&mut self, size: Vec2) {
        if self.config.size != size {
            self.config.size = size;
            self.configure();
        }
    }

    pub fn set_allows_multiple_selection(&mut self, allows: bool) {
        self.config.allows_multiple_selection = allows;
        self.selection.allows_multiple_selection = allows;
    }

    pub fn set_remove_on_long_press(&mut self, enabled: bool) {
        self.config.remove_on_long_press = enabled;
    }

    fn configure(&mut self) {
        let size = self.config.size;
        let strength = size.x.max(size.y);
        let radius = strength.sqrt() * 100.0;

        self.field.region = Region::Disc { radius };
        self.field.minimum_radius = radius;
        self.field.strength = strength;
        self.field.position = size * 0.5;

        let half_width = radius * 0.5;
        self.boundary = Boundary {
            min: Vec2::new(size.x * 0.5 - half_width, 0.0),
            max: Vec2::new(size.x * 0.5 + half_width, size.y),
        };
        debug!(?size, strength, radius, "scene configured");
    }

    /// The radial gravity field pulling parents toward its position.
    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn set_field_enabled(&mut self, enabled: bool) {
        self.field.enabled = enabled;
    }

    pub fn move_field_to(&mut self, position: Vec2) {
        self.field.position = position;
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn physics_speed(&self) -> f32 {
        self.physics_speed
    }

    pub fn set_physics_speed(&mut self, speed: f32) {
        self.physics_speed = speed.max(0.0);
    }

    /// Number of top-level bubbles, including ones playing their exit.
    pub fn len(&self) -> usize {
        self.bubbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bubbles.is_empty()
    }

    /// Bubbles in insertion order.
    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    pub fn get(&self, id: BubbleId) -> Option<&Bubble> {
        self.bubbles.iter().find(|b| b.id() == id)
    }

    pub fn get_mut(&mut self, id: BubbleId) -> Option<&mut Bubble> {
        self.bubbles.iter_mut().find(|b| b.id() == id)
    }

    pub fn find(&self, name: &str) -> Option<&Bubble> {
        self.bubbles.iter().find(|b| b.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Bodies of bubbles still taking part in the simulation.
    pub fn bodies_mut(&mut self) -> impl Iterator<Item = &mut Body> {
        self.bubbles
            .iter_mut()
            .filter(|b| !b.is_removing())
            .map(|b| &mut b.body)
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Adds a top-level bubble named `name`.
    ///
    /// A name already in the scene rejects the add and returns `None`. The
    /// first bubble is centered; later ones enter at the left edge when the
    /// bubble count is even and the right edge when odd, at a random height
    /// that keeps the whole circle on screen.
    pub fn add(&mut self, name: impl Into<String>, color: Color, radius: f32) -> Option<BubbleId> {
        let name = name.into();
        if self.contains(&name) {
            debug!(name, "add rejected: name in use");
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;

        let position = self.spawn_position(radius);
        let mut bubble = Bubble::new(id, name, color, radius, &self.config);
        bubble.body.position = position;
        debug!(id, name = bubble.name(), ?position, "bubble added");
        self.bubbles.push(bubble);
        Some(id)
    }

    /// Adds a bubble with a random demo name, fill and selection color.
    pub fn add_random(&mut self) -> Option<BubbleId> {
        let name = color::random_name(&mut self.rng);
        let fill = color::random_color(&mut self.rng);
        let selected = color::random_color(&mut self.rng);
        let id = self.add(name, fill, self.config.default_radius)?;
        if let Some(b) = self.get_mut(id) {
            b.selected_color = Some(selected);
        }
        Some(id)
    }

    fn spawn_position(&mut self, radius: f32) -> Vec2 {
        let size = self.config.size;
        if self.bubbles.is_empty() {
            return size * 0.5;
        }
        let x = if self.bubbles.len() % 2 == 0 { 0.0 } else { size.x };
        let (lo, hi) = (radius, size.y - radius);
        let y = if lo < hi {
            self.rng.random_range(lo..=hi)
        } else {
            size.y * 0.5
        };
        Vec2::new(x, y)
    }

    /// Attaches a child to the bubble named `parent`. Unknown names are a no-op.
    pub fn add_child(&mut self, parent: &str, preset: Preset) -> Option<usize> {
        self.attach(parent, preset, None)
    }

    /// Like [`Scene::add_child`], recording `tag` on the child.
    pub fn add_tagged_child(&mut self, parent: &str, preset: Preset, tag: &str) -> Option<usize> {
        self.attach(parent, preset, Some(tag.to_owned()))
    }

    fn attach(&mut self, parent: &str, preset: Preset, tag: Option<String>) -> Option<usize> {
        let Some(bubble) = self
            .bubbles
            .iter_mut()
            .find(|b| b.name() == parent && !b.is_removing())
        else {
            debug!(parent, "child dropped: no such bubble");
            return None;
        };
        Some(bubble.add_child(preset, tag, &mut self.rng, &self.config))
    }

    /// Attaches a child to the last bubble in sweep order.
    pub fn add_child_to_last(&mut self, preset: Preset) -> Option<usize> {
        let name = self.last_in_order()?.name().to_owned();
        self.add_child(&name, preset)
    }

    /// Fades the bubble named `name` toward `alpha`. Unknown names are a no-op.
    pub fn update_alpha(&mut self, name: &str, alpha: f32) -> bool {
        match self
            .bubbles
            .iter_mut()
            .find(|b| b.name() == name && !b.is_removing())
        {
            Some(bubble) => {
                bubble.fade_alpha_to(alpha);
                true
            }
            None => false,
        }
    }

    /// Plays the exit animation of `id` and destroys it afterwards.
    ///
    /// With `notify`, the delegate's `did_remove` fires when the bubble is
    /// destroyed, however that happens.
    pub fn remove(&mut self, id: BubbleId, notify: bool) -> bool {
        let Some(bubble) = self.bubbles.iter_mut().find(|b| b.id() == id) else {
            return false;
        };
        if !bubble.begin_removal(RemovalKind::Fade, notify, Vec2::ZERO) {
            return false;
        }
        self.selection.forget(id);
        debug!(id, notify, "removal started");
        true
    }

    /// Calls back a bubble named `name` that is fading out.
    ///
    /// Bubbles thrown or queued by a running reset stay on their way out.
    pub fn revive(&mut self, name: &str) -> bool {
        let reset = self.reset.as_ref();
        let Some(bubble) = self.bubbles.iter_mut().find(|b| {
            b.name() == name && !reset.is_some_and(|seq| seq.pending.contains(&b.id()))
        }) else {
            return false;
        };
        if !bubble.cancel_removal() {
            return false;
        }
        debug!(id = bubble.id(), name, "removal cancelled");
        true
    }

    /// Removes the bubble named `name`, if present.
    pub fn remove_named(&mut self, name: &str) -> bool {
        match self.find(name).filter(|b| !b.is_removing()).map(Bubble::id) {
            Some(id) => self.remove(id, false),
            None => false,
        }
    }

    /// Removes the last bubble in sweep order.
    pub fn remove_last(&mut self) -> bool {
        match self.last_in_order().map(Bubble::id) {
            Some(id) => self.remove(id, false),
            None => false,
        }
    }

    fn last_in_order(&self) -> Option<&Bubble> {
        self.sorted_bubbles().into_iter().rev().find(|b| !b.is_removing())
    }

    /// Bubbles in sweep order: selected ones first, nearest to the field
    /// center first; unselected ones after, in insertion order.
    pub fn sorted_bubbles(&self) -> Vec<&Bubble> {
        let center = self.field.position;
        let mut order: Vec<&Bubble> = self.bubbles.iter().collect();
        order.sort_by(|a, b| match (a.is_selected(), b.is_selected()) {
            (true, true) => {
                let da = a.body.position.distance(center);
                let db = b.body.position.distance(center);
                da.total_cmp(&db)
            }
            (true, false) => std::cmp::Ordering::Less,
            (false, true) => std::cmp::Ordering::Greater,
            (false, false) => std::cmp::Ordering::Equal,
        });
        order
    }

    /// The topmost bubble whose circle contains `point`.
    pub fn bubble_at(&self, point: Vec2) -> Option<BubbleId> {
        self.bubbles
            .iter()
            .rev()
            .find(|b| !b.is_removing() && b.contains_point(point))
            .map(Bubble::id)
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn selected_bubbles(&self) -> impl Iterator<Item = &Bubble> {
        self.selection
            .selected()
            .iter()
            .filter_map(|&id| self.get(id))
    }

    /// A committed tap on `id`: toggles its selection.
    pub fn tap(&mut self, id: BubbleId) -> bool {
        self.selection
            .toggle(&mut self.bubbles, id, &mut self.notifier)
    }

    pub fn select(&mut self, id: BubbleId) -> bool {
        self.selection
            .select(&mut self.bubbles, id, &mut self.notifier)
    }

    pub fn deselect(&mut self, id: BubbleId) -> bool {
        self.selection
            .deselect(&mut self.bubbles, id, &mut self.notifier)
    }

    /// Sweeps every bubble off the scene.
    ///
    /// Removal `i` in sweep order is scheduled `i * RESET_STAGGER` after the
    /// call. The world speed is held at zero until the last bubble of the
    /// sweep is destroyed and then restored once. A reset requested while
    /// one is running is ignored.
    pub fn reset(&mut self) -> bool {
        if self.reset.is_some() {
            debug!("reset ignored: already running");
            return false;
        }
        let order: Vec<BubbleId> = self.sorted_bubbles().iter().map(|b| b.id()).collect();
        for (index, &id) in order.iter().enumerate() {
            self.scheduler
                .schedule_after(index as f64 * RESET_STAGGER, SceneAction::Sweep(id));
        }
        debug!(bubbles = order.len(), saved_speed = self.physics_speed, "reset started");
        self.reset = Some(ResetSequence {
            saved_speed: self.physics_speed,
            pending: order,
        });
        self.physics_speed = 0.0;
        self.finish_reset_if_done();
        true
    }

    pub fn is_resetting(&self) -> bool {
        self.reset.is_some()
    }

    /// Pending sweep removals as `(due time, bubble)` on the scene clock.
    pub fn scheduled_sweeps(&self) -> impl Iterator<Item = (f64, BubbleId)> + '_ {
        self.scheduler.pending().map(|s| match s.action {
            SceneAction::Sweep(id) => (s.at, id),
        })
    }

    /// Seconds elapsed on the scene clock.
    pub fn clock(&self) -> f64 {
        self.scheduler.now()
    }

    fn run(&mut self, action: SceneAction) {
        match action {
            SceneAction::Sweep(id) => {
                let Some(bubble) = self.bubbles.iter_mut().find(|b| b.id() == id) else {
                    return;
                };
                if bubble.is_selected() {
                    let size = self.config.size;
                    let target = Vec2::new(size.x * 0.5, size.y + THROW_OVERSHOOT);
                    bubble.begin_removal(RemovalKind::Throw, false, target);
                    self.selection.forget(id);
                } else {
                    self.destroy(id);
                }
            }
        }
    }

    /// Drops `id` from the scene, settling every reference to it.
    fn destroy(&mut self, id: BubbleId) {
        let Some(idx) = self.bubbles.iter().position(|b| b.id() == id) else {
            return;
        };
        let bubble = self.bubbles.remove(idx);
        self.selection.forget(id);
        if let Some(seq) = self.reset.as_mut() {
            seq.pending.retain(|&p| p != id);
        }
        if bubble.removal().is_some_and(|r| r.notify) {
            self.notifier.removed(&bubble);
        }
        debug!(id, name = bubble.name(), "bubble destroyed");
    }

    fn finish_reset_if_done(&mut self) {
        if let Some(seq) = &self.reset
            && seq.pending.is_empty()
        {
            self.physics_speed = seq.saved_speed;
            self.reset = None;
            debug!(speed = self.physics_speed, "reset finished");
        }
    }

    /// Advances the scene by one frame of `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        for action in self.scheduler.advance(dt as f64) {
            self.run(action);
        }

        for bubble in &mut self.bubbles {
            bubble.advance(dt);
        }
        let finished: Vec<BubbleId> = self
            .bubbles
            .iter()
            .filter(|b| b.removal_finished())
            .map(Bubble::id)
            .collect();
        for id in finished {
            self.destroy(id);
        }
        self.finish_reset_if_done();

        if self.physics_speed > 0.0 {
            self.step_physics(dt * self.physics_speed);
        } else {
            for bubble in &mut self.bubbles {
                bubble.body.clear_force();
            }
        }
    }

    fn step_physics(&mut self, dt: f32) {
        let p = self.config.physics;
        let mut bodies: Vec<&mut Body> = self
            .bubbles
            .iter_mut()
            .filter(|b| !b.is_removing())
            .map(|b| &mut b.body)
            .collect();
        physics::field_phase(&self.field, bodies.iter_mut().map(|b| &mut **b), p.force_scale);
        physics::collision_phase(&mut bodies, p.collision_iterations);
        physics::integrate_phase(bodies.iter_mut().map(|b| &mut **b), dt);
        for body in bodies {
            self.boundary.contain(body);
        }

        for bubble in &mut self.bubbles {
            bubble.step_children(dt, p.force_scale, p.collision_iterations);
        }
    }
}
