//! Parent and child bubble records.
//!
//! A [`Bubble`] is a top-level circle in the scene. It owns its
//! [`ChildBubble`]s, which live in the parent's local space and are held
//! together by the parent's private spring field. The parent's radius is
//! derived from how many children it has (see [`tier_radius`]).

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    animation::{Animator, Tween},
    color::{self, Color},
    config::SceneConfig,
    field::Field,
    physics::{self, Body},
    types::BubbleId,
};

/// Radius of every child bubble.
pub const CHILD_RADIUS: f32 = 40.0;

/// Offsets, in parent-local space, for the second and later children.
pub const PLACEMENT_SLOTS: [Vec2; 4] = [
    Vec2::new(-100.0, 0.0),
    Vec2::new(0.0, 100.0),
    Vec2::new(100.0, 0.0),
    Vec2::new(0.0, -100.0),
];

pub const DEFAULT_SELECTED_SCALE: f32 = 4.0 / 3.0;
/// Duration of the fade run by [`Bubble::fade_alpha_to`].
pub const ALPHA_FADE_DURATION: f32 = 0.4;
/// Duration of a child's fade-in after it is attached.
pub const CHILD_APPEAR_DURATION: f32 = 0.6;

/// Activity category of a child bubble.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Sport,
    Read,
    Water,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Sport, Preset::Read, Preset::Water];

    pub fn title(self) -> &'static str {
        match self {
            Preset::Sport => "Sport",
            Preset::Read => "Read book",
            Preset::Water => "Drink water",
        }
    }

    /// Asset key of the preset's icon.
    pub fn icon(self) -> &'static str {
        match self {
            Preset::Sport => "sport",
            Preset::Read => "read",
            Preset::Water => "water",
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Radius tier of a parent with `children` children.
///
/// A childless bubble keeps `initial`, the radius it was created with.
pub fn tier_radius(children: usize, initial: f32) -> f32 {
    match children {
        0 => initial,
        1 => 80.0,
        2..=6 => 150.0,
        _ => 200.0,
    }
}

/// How a bubble animates when its selection flag flips.
///
/// Swapping the strategy replaces the whole selection look of a bubble;
/// [`SelectionStyle::STATIC`] keeps image-backed bubbles still.
#[derive(Clone, Copy, Debug)]
pub struct SelectionStyle {
    pub on_select: fn(&mut Bubble),
    pub on_deselect: fn(&mut Bubble),
}

impl SelectionStyle {
    /// Scale toward `selected_scale` and cross-fade colors when configured.
    pub const ANIMATED: SelectionStyle = SelectionStyle {
        on_select: animate_select,
        on_deselect: animate_deselect,
    };

    pub const STATIC: SelectionStyle = SelectionStyle {
        on_select: keep_still,
        on_deselect: keep_still,
    };
}

impl Default for SelectionStyle {
    fn default() -> Self {
        Self::ANIMATED
    }
}

fn keep_still(_: &mut Bubble) {}

fn animate_select(bubble: &mut Bubble) {
    bubble.original_color = bubble.fill;
    let duration = bubble.animation_duration;
    bubble.animator.run(
        Tween::Scale {
            from: bubble.scale,
            to: bubble.selected_scale,
        },
        duration,
    );
    if let Some(to) = bubble.selected_label_color {
        bubble.animator.run(
            Tween::LabelColor {
                from: bubble.label_color,
                to,
            },
            duration,
        );
    }
    if let Some(to) = bubble.selected_color {
        bubble.animator.run(
            Tween::Fill {
                from: bubble.original_color,
                to,
            },
            duration,
        );
    }
}

fn animate_deselect(bubble: &mut Bubble) {
    let duration = bubble.animation_duration;
    bubble.animator.run(
        Tween::Scale {
            from: bubble.scale,
            to: bubble.deselected_scale,
        },
        duration,
    );
    if bubble.selected_color.is_some() {
        bubble.animator.run(
            Tween::Fill {
                from: bubble.fill,
                to: bubble.original_color,
            },
            duration,
        );
    }
    if bubble.selected_label_color.is_some() {
        bubble.animator.run(
            Tween::LabelColor {
                from: bubble.label_color,
                to: bubble.base_label_color,
            },
            duration,
        );
    }
}

/// How a bubble leaves the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RemovalKind {
    /// Fade out and shrink to nothing.
    Fade,
    /// Fly off the top of the canvas while shrinking.
    Throw,
}

/// A removal in progress. The bubble is destroyed once its tweens finish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Removal {
    pub kind: RemovalKind,
    /// Whether destruction owes the delegate a `did_remove` call.
    pub notify: bool,
}

/// A leaf bubble owned by a [`Bubble`].
#[derive(Clone, Debug)]
pub struct ChildBubble {
    pub preset: Preset,
    /// Key of the dataset record this child was attached for, if any.
    pub tag: Option<String>,
    pub color: Color,
    alpha: f32,
    /// Body in the parent's local space.
    pub body: Body,
    animator: Animator,
}

impl ChildBubble {
    fn new(
        preset: Preset,
        tag: Option<String>,
        color: Color,
        position: Vec2,
        cfg: &SceneConfig,
    ) -> Self {
        let mut animator = Animator::default();
        animator.run(Tween::Alpha { from: 0.0, to: 1.0 }, CHILD_APPEAR_DURATION);
        Self {
            preset,
            tag,
            color,
            alpha: 0.0,
            body: Body::child(
                position,
                CHILD_RADIUS * cfg.child_margin_scale,
                cfg.physics.child_damping,
            ),
            animator,
        }
    }

    pub fn label(&self) -> &'static str {
        self.preset.title()
    }

    pub fn radius(&self) -> f32 {
        CHILD_RADIUS
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Pinned children anchor their siblings and never move.
    pub fn is_pinned(&self) -> bool {
        !self.body.dynamic
    }

    fn advance(&mut self, dt: f32) {
        let alpha = &mut self.alpha;
        self.animator.advance(dt, |tween, t| {
            if let Tween::Alpha { from, to } = *tween {
                *alpha = Tween::sample_f32(from, to, t).clamp(0.0, 1.0);
            }
        });
    }
}

/// A top-level bubble.
#[derive(Clone, Debug)]
pub struct Bubble {
    id: BubbleId,
    name: String,
    pub label: String,
    pub body: Body,
    radius: f32,
    margin_scale: f32,
    field: Option<Field>,
    selected: bool,

    pub selected_color: Option<Color>,
    pub selected_label_color: Option<Color>,
    pub selected_scale: f32,
    pub deselected_scale: f32,
    pub animation_duration: f32,
    pub style: SelectionStyle,

    base_color: Color,
    original_color: Color,
    base_label_color: Color,
    fill: Color,
    label_color: Color,
    scale: f32,
    alpha: f32,
    target_alpha: f32,

    children: Vec<ChildBubble>,
    placement_cursor: usize,
    animator: Animator,
    removal: Option<Removal>,
}

impl Bubble {
    /// Creates a transparent bubble that fades in to full opacity.
    pub fn new(
        id: BubbleId,
        name: impl Into<String>,
        color: Color,
        radius: f32,
        cfg: &SceneConfig,
    ) -> Self {
        let name = name.into();
        let mut animator = Animator::default();
        animator.run(Tween::Alpha { from: 0.0, to: 1.0 }, ALPHA_FADE_DURATION);
        let mut bubble = Self {
            id,
            label: name.clone(),
            name,
            body: Body::parent(Vec2::ZERO, radius, cfg.physics.bubble_damping),
            radius,
            margin_scale: cfg.margin_scale,
            field: None,
            selected: false,
            selected_color: None,
            selected_label_color: None,
            selected_scale: DEFAULT_SELECTED_SCALE,
            deselected_scale: 1.0,
            animation_duration: cfg.animation_duration,
            style: SelectionStyle::default(),
            base_color: color,
            original_color: color,
            base_label_color: Color::WHITE,
            fill: color,
            label_color: Color::WHITE,
            scale: 1.0,
            alpha: 0.0,
            target_alpha: 1.0,
            children: Vec::new(),
            placement_cursor: 0,
            animator,
            removal: None,
        };
        bubble.set_radius(radius, cfg);
        bubble
    }

    pub fn id(&self) -> BubbleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// The private spring field holding this bubble's children together.
    pub fn field(&self) -> Option<&Field> {
        self.field.as_ref()
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn base_color(&self) -> Color {
        self.base_color
    }

    pub fn fill(&self) -> Color {
        self.fill
    }

    pub fn label_color(&self) -> Color {
        self.label_color
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Alpha the bubble is fading toward.
    pub fn target_alpha(&self) -> f32 {
        self.target_alpha
    }

    pub fn children(&self) -> &[ChildBubble] {
        &self.children
    }

    pub fn placement_cursor(&self) -> usize {
        self.placement_cursor
    }

    pub fn removal(&self) -> Option<Removal> {
        self.removal
    }

    pub fn is_removing(&self) -> bool {
        self.removal.is_some()
    }

    /// Whether `point` lies inside the bubble's visual circle.
    pub fn contains_point(&self, point: Vec2) -> bool {
        let r = self.radius * self.scale;
        self.body.position.distance_squared(point) <= r * r
    }

    /// Flips the selection flag and runs the style's animation.
    ///
    /// Writing the current value again is a no-op and returns `false`.
    pub(crate) fn set_selected(&mut self, selected: bool) -> bool {
        if self.selected == selected {
            return false;
        }
        self.selected = selected;
        let hook = if selected {
            self.style.on_select
        } else {
            self.style.on_deselect
        };
        hook(self);
        true
    }

    /// Fades toward `alpha`, clamped to `[0, 1]`.
    pub fn fade_alpha_to(&mut self, alpha: f32) {
        let alpha = alpha.clamp(0.0, 1.0);
        self.target_alpha = alpha;
        self.animator.run(
            Tween::Alpha {
                from: self.alpha,
                to: alpha,
            },
            ALPHA_FADE_DURATION,
        );
    }

    /// Attaches a child and re-derives the radius tier and field region.
    ///
    /// The first child sits pinned at the local origin. Later children cycle
    /// through [`PLACEMENT_SLOTS`]; overlaps are left to the simulation.
    pub fn add_child(
        &mut self,
        preset: Preset,
        tag: Option<String>,
        rng: &mut impl Rng,
        cfg: &SceneConfig,
    ) -> usize {
        let color = color::random_color(rng);
        let child = if self.children.is_empty() {
            let mut anchor = ChildBubble::new(preset, tag, color, Vec2::ZERO, cfg);
            anchor.body.dynamic = false;
            anchor
        } else {
            let slot = PLACEMENT_SLOTS[self.placement_cursor];
            self.placement_cursor = (self.placement_cursor + 1) % PLACEMENT_SLOTS.len();
            ChildBubble::new(preset, tag, color, slot, cfg)
        };
        self.children.push(child);

        let radius = tier_radius(self.children.len(), self.radius);
        self.set_radius(radius, cfg);
        trace!(bubble = %self.name, children = self.children.len(), radius, "child attached");
        self.children.len() - 1
    }

    fn set_radius(&mut self, radius: f32, cfg: &SceneConfig) {
        self.radius = radius;
        self.sync_body_radius();
        self.field = Field::bubble_region(
            radius,
            cfg.physics.spring_margin,
            cfg.physics.spring_strength,
        );
    }

    fn sync_body_radius(&mut self) {
        self.body.radius = self.radius * self.margin_scale * self.scale;
    }

    /// Starts the exit animation. Returns `false` if one is already running.
    pub(crate) fn begin_removal(
        &mut self,
        kind: RemovalKind,
        notify: bool,
        throw_to: Vec2,
    ) -> bool {
        if self.removal.is_some() {
            return false;
        }
        self.removal = Some(Removal { kind, notify });
        // Leaving bubbles drop out of the selection without a deselect look.
        self.selected = false;
        self.animator.clear();
        match kind {
            RemovalKind::Fade => {
                let duration = self.animation_duration;
                self.animator.run(
                    Tween::Alpha {
                        from: self.alpha,
                        to: 0.0,
                    },
                    duration,
                );
                self.animator.run(
                    Tween::Scale {
                        from: self.scale,
                        to: 0.0,
                    },
                    duration,
                );
            }
            RemovalKind::Throw => {
                let pos = self.body.position;
                self.animator.run(
                    Tween::MoveX {
                        from: pos.x,
                        to: throw_to.x,
                    },
                    0.2,
                );
                self.animator.run(
                    Tween::MoveY {
                        from: pos.y,
                        to: throw_to.y,
                    },
                    0.4,
                );
                self.animator.run(
                    Tween::Scale {
                        from: self.scale,
                        to: 0.3,
                    },
                    0.4,
                );
            }
        }
        true
    }

    /// Stops a fade removal and animates back to the resting look.
    ///
    /// Throws are not cancellable. Any `did_remove` the removal owed is
    /// dropped along with it.
    pub(crate) fn cancel_removal(&mut self) -> bool {
        if !matches!(self.removal, Some(Removal { kind: RemovalKind::Fade, .. })) {
            return false;
        }
        self.removal = None;
        self.animator.clear();
        self.animator.run(
            Tween::Scale {
                from: self.scale,
                to: self.deselected_scale,
            },
            self.animation_duration,
        );
        self.animator.run(
            Tween::Alpha {
                from: self.alpha,
                to: self.target_alpha,
            },
            ALPHA_FADE_DURATION,
        );
        true
    }

    /// Whether a removal has played out and the bubble can be destroyed.
    pub fn removal_finished(&self) -> bool {
        self.removal.is_some() && self.animator.is_idle()
    }

    /// Advances this bubble's and its children's tweens.
    pub fn advance(&mut self, dt: f32) {
        let mut animator = std::mem::take(&mut self.animator);
        animator.advance(dt, |tween, t| self.apply(tween, t));
        self.animator = animator;
        self.sync_body_radius();
        for child in &mut self.children {
            child.advance(dt);
        }
    }

    fn apply(&mut self, tween: &Tween, t: f32) {
        match *tween {
            Tween::Scale { from, to } => self.scale = Tween::sample_f32(from, to, t).max(0.0),
            Tween::Alpha { from, to } => {
                self.alpha = Tween::sample_f32(from, to, t).clamp(0.0, 1.0);
            }
            Tween::Fill { from, to } => self.fill = Tween::sample_color(from, to, t),
            Tween::LabelColor { from, to } => {
                self.label_color = Tween::sample_color(from, to, t);
            }
            Tween::MoveX { from, to } => self.body.position.x = Tween::sample_f32(from, to, t),
            Tween::MoveY { from, to } => self.body.position.y = Tween::sample_f32(from, to, t),
        }
    }

    /// Runs one physics step for the children in local space.
    pub fn step_children(&mut self, dt: f32, force_scale: f32, collision_iterations: usize) {
        if self.children.is_empty() {
            return;
        }
        if let Some(field) = &self.field {
            let bodies = self.children.iter_mut().map(|c| &mut c.body);
            physics::field_phase(field, bodies, force_scale);
        }
        let mut bodies: Vec<&mut Body> = self.children.iter_mut().map(|c| &mut c.body).collect();
        physics::collision_phase(&mut bodies, collision_iterations);
        physics::integrate_phase(bodies, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn bubble(radius: f32) -> Bubble {
        Bubble::new(1, "goal", color::BLUE, radius, &SceneConfig::default())
    }

    #[test]
    fn tier_radius_follows_breakpoints() {
        assert_eq!(tier_radius(0, 50.0), 50.0);
        assert_eq!(tier_radius(1, 50.0), 80.0);
        for n in 2..=6 {
            assert_eq!(tier_radius(n, 50.0), 150.0);
        }
        for n in 7..=10 {
            assert_eq!(tier_radius(n, 50.0), 200.0);
        }
        assert_eq!(tier_radius(11, 50.0), 200.0);
        assert_eq!(tier_radius(500, 50.0), 200.0);

        let mut last = 0.0;
        for n in 1..=20 {
            let r = tier_radius(n, 50.0);
            assert!(r >= last);
            last = r;
        }
    }

    #[test]
    fn first_child_is_pinned_at_origin_and_rest_cycle_slots() {
        let cfg = SceneConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut b = bubble(50.0);

        for _ in 0..7 {
            b.add_child(Preset::Read, None, &mut rng, &cfg);
        }

        let positions: Vec<Vec2> = b.children().iter().map(|c| c.body.position).collect();
        assert_eq!(positions[0], Vec2::ZERO);
        assert!(b.children()[0].is_pinned());
        assert_eq!(&positions[1..5], &PLACEMENT_SLOTS);
        assert_eq!(positions[5], Vec2::new(-100.0, 0.0));
        assert_eq!(positions[6], Vec2::new(0.0, 100.0));
        assert!(b.children()[1..].iter().all(|c| !c.is_pinned()));
        assert_eq!(b.placement_cursor(), 2);
    }

    #[test]
    fn adding_children_rederives_radius_body_and_field() {
        let cfg = SceneConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut b = bubble(50.0);
        assert_eq!(b.radius(), 50.0);

        b.add_child(Preset::Sport, None, &mut rng, &cfg);
        assert_eq!(b.radius(), 80.0);
        assert!((b.body.radius - 80.0 * 1.1).abs() < 1e-4);
        assert_eq!(
            b.field().map(|f| f.region),
            Some(crate::field::Region::Disc { radius: 80.0 })
        );

        for _ in 0..6 {
            b.add_child(Preset::Water, None, &mut rng, &cfg);
        }
        assert_eq!(b.children().len(), 7);
        assert_eq!(b.radius(), 200.0);
        for child in b.children() {
            assert_eq!(child.radius(), CHILD_RADIUS);
            assert!(color::PALETTE.contains(&child.color));
        }
    }

    #[test]
    fn selection_is_idempotent_and_animates_scale() {
        let mut b = bubble(50.0);
        b.selected_color = Some(color::RED);

        assert!(b.set_selected(true));
        assert!(!b.set_selected(true));
        b.advance(1.0);
        assert!((b.scale() - DEFAULT_SELECTED_SCALE).abs() < 1e-6);
        assert_eq!(b.fill(), color::RED);

        assert!(b.set_selected(false));
        b.advance(1.0);
        assert_eq!(b.scale(), 1.0);
        assert_eq!(b.fill(), color::BLUE);
    }

    #[test]
    fn select_cycles_return_to_the_base_color() {
        let mut b = Bubble::new(1, "goal", color::TEAL_BLUE, 50.0, &SceneConfig::default());
        b.selected_color = Some(color::PURPLE);
        b.selected_label_color = Some(color::YELLOW);

        for _ in 0..10 {
            b.set_selected(true);
            b.advance(1.0);
            assert_eq!(b.fill(), color::PURPLE);
            b.set_selected(false);
            b.advance(1.0);
        }

        assert_eq!(b.fill(), color::TEAL_BLUE);
        assert_eq!(b.label_color(), Color::WHITE);
        assert_eq!(b.scale(), 1.0);
    }

    #[test]
    fn removal_clears_the_selected_flag_without_restyling() {
        let mut b = bubble(50.0);
        b.selected_color = Some(color::RED);
        b.set_selected(true);
        b.advance(1.0);

        b.begin_removal(RemovalKind::Fade, false, Vec2::ZERO);

        assert!(!b.is_selected());
        assert_eq!(b.fill(), color::RED);
        assert!(!b.set_selected(false));
    }

    #[test]
    fn cancelled_fade_restores_scale_and_alpha() {
        let mut b = bubble(50.0);
        b.advance(1.0);
        b.begin_removal(RemovalKind::Fade, true, Vec2::ZERO);
        b.advance(0.05);
        assert!(b.alpha() < 1.0 && b.scale() < 1.0);

        assert!(b.cancel_removal());
        assert!(!b.cancel_removal());
        b.advance(1.0);

        assert!(!b.is_removing());
        assert!(!b.removal_finished());
        assert_eq!(b.alpha(), 1.0);
        assert_eq!(b.scale(), 1.0);
    }

    #[test]
    fn throws_cannot_be_cancelled() {
        let mut b = bubble(50.0);
        b.begin_removal(RemovalKind::Throw, false, Vec2::new(0.0, 640.0));
        assert!(!b.cancel_removal());
        assert!(b.is_removing());
    }

    #[test]
    fn static_style_keeps_visuals_still() {
        let mut b = bubble(50.0);
        b.style = SelectionStyle::STATIC;
        b.selected_color = Some(color::RED);

        assert!(b.set_selected(true));
        b.advance(1.0);
        assert!(b.is_selected());
        assert_eq!(b.scale(), 1.0);
        assert_eq!(b.fill(), color::BLUE);
    }

    #[test]
    fn alpha_fades_to_clamped_target() {
        let mut b = bubble(50.0);
        b.advance(1.0);
        assert_eq!(b.alpha(), 1.0);

        b.fade_alpha_to(-3.0);
        assert_eq!(b.target_alpha(), 0.0);
        b.advance(ALPHA_FADE_DURATION / 2.0);
        assert!((b.alpha() - 0.5).abs() < 1e-5);
        b.advance(ALPHA_FADE_DURATION);
        assert_eq!(b.alpha(), 0.0);
    }

    #[test]
    fn fade_removal_finishes_after_animation_duration() {
        let mut b = bubble(50.0);
        assert!(b.begin_removal(RemovalKind::Fade, true, Vec2::ZERO));
        assert!(!b.begin_removal(RemovalKind::Throw, false, Vec2::ZERO));
        assert!(!b.removal_finished());

        b.advance(b.animation_duration);
        assert!(b.removal_finished());
        assert_eq!(b.scale(), 0.0);
        assert_eq!(b.removal().map(|r| r.notify), Some(true));
    }

    #[test]
    fn throw_moves_to_target_and_shrinks() {
        let mut b = bubble(50.0);
        b.body.position = Vec2::new(10.0, 20.0);
        b.begin_removal(RemovalKind::Throw, false, Vec2::new(400.0, 640.0));

        b.advance(0.2);
        assert_eq!(b.body.position.x, 400.0);
        assert!(!b.removal_finished());

        b.advance(0.2);
        assert_eq!(b.body.position, Vec2::new(400.0, 640.0));
        assert!((b.scale() - 0.3).abs() < 1e-6);
        assert!(b.removal_finished());
    }

    #[test]
    fn children_fade_in_and_are_pulled_together() {
        let cfg = SceneConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut b = bubble(50.0);
        b.add_child(Preset::Sport, None, &mut rng, &cfg);
        b.add_child(Preset::Read, None, &mut rng, &cfg);
        b.children[1].body.position = Vec2::new(-150.0, 0.0);

        b.advance(CHILD_APPEAR_DURATION);
        assert!(b.children().iter().all(|c| c.alpha() == 1.0));

        b.step_children(1.0 / 60.0, cfg.physics.force_scale, 1);
        assert_eq!(b.children()[0].body.position, Vec2::ZERO);
        assert!(b.children()[1].body.position.x > -150.0);
    }

    #[test]
    fn contains_point_uses_scaled_radius() {
        let mut b = bubble(50.0);
        b.body.position = Vec2::new(100.0, 100.0);
        assert!(b.contains_point(Vec2::new(140.0, 100.0)));
        assert!(!b.contains_point(Vec2::new(160.0, 100.0)));
    }
}
