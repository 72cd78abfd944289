//! Physics stepping phases for bubble bodies.
//!
//! The scene runs one step per frame, after it has queued drag forces and
//! configured its fields:
//! 1. [`field_phase`] — every enabled field pushes on the bodies it affects,
//!    accumulating forces.
//! 2. [`collision_phase`] — overlapping bodies of compatible categories are
//!    pushed apart.
//! 3. [`integrate_phase`] — accumulated forces become velocity, velocity is
//!    damped and becomes displacement, and forces are cleared.
//!
//! A [`Boundary`] then keeps parent bodies inside the world.

use glam::Vec2;

use crate::field::{Category, Field};

/// A circular rigid body without rotation.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    force: Vec2,
    /// Collision radius, already including any margin scale.
    pub radius: f32,
    pub category: Category,
    pub collision_mask: Category,
    pub field_mask: Category,
    pub linear_damping: f32,
    /// Static bodies ignore forces and are never displaced by collisions.
    pub dynamic: bool,
}

impl Body {
    /// A body for a top-level bubble.
    pub fn parent(position: Vec2, radius: f32, linear_damping: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            radius,
            category: Category::BIG_CIRCLE,
            collision_mask: Category::BIG_CIRCLE,
            field_mask: Category::BIG_FIELD,
            linear_damping,
            dynamic: true,
        }
    }

    /// A body for a child bubble, positioned in its parent's local space.
    pub fn child(position: Vec2, radius: f32, linear_damping: f32) -> Self {
        Self {
            category: Category::SMALL_CIRCLE,
            collision_mask: Category::SMALL_CIRCLE,
            field_mask: Category::SMALL_FIELD,
            ..Self::parent(position, radius, linear_damping)
        }
    }

    #[inline]
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    #[inline]
    pub fn clear_force(&mut self) {
        self.force = Vec2::ZERO;
    }

    /// Force accumulated since the last integration.
    #[inline]
    pub fn force(&self) -> Vec2 {
        self.force
    }

    fn collides_with(&self, other: &Body) -> bool {
        self.category.intersects(other.collision_mask)
            || other.category.intersects(self.collision_mask)
    }
}

/// Axis-aligned rectangle that parent bodies are kept inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Boundary {
    pub min: Vec2,
    pub max: Vec2,
}

impl Boundary {
    /// Moves `body` back inside the rectangle and stops its outward motion.
    ///
    /// On an axis narrower than the body, the body is centered on that axis.
    pub fn contain(&self, body: &mut Body) {
        for axis in 0..2 {
            let lo = self.min[axis] + body.radius;
            let hi = self.max[axis] - body.radius;
            if lo > hi {
                body.position[axis] = (self.min[axis] + self.max[axis]) * 0.5;
                body.velocity[axis] = 0.0;
            } else if body.position[axis] < lo {
                body.position[axis] = lo;
                body.velocity[axis] = body.velocity[axis].max(0.0);
            } else if body.position[axis] > hi {
                body.position[axis] = hi;
                body.velocity[axis] = body.velocity[axis].min(0.0);
            }
        }
    }
}

/// Accumulates the force of `field` onto every body it affects.
///
/// ### Parameters
/// - `field` - The field to apply; disabled fields contribute nothing.
/// - `bodies` - Bodies expressed in the same space as `field.position`.
/// - `scale` - Multiplier converting field output into acceleration.
pub fn field_phase<'a>(field: &Field, bodies: impl IntoIterator<Item = &'a mut Body>, scale: f32) {
    if !field.enabled {
        return;
    }
    for body in bodies {
        if !body.dynamic {
            continue;
        }
        let force = field.force_at(body.field_mask, body.position);
        body.apply_force(force * scale);
    }
}

/// Pushes overlapping bodies apart.
///
/// For every pair whose categories meet each other's collision mask, the
/// overlap is split between the dynamic bodies of the pair and the closing
/// component of their relative velocity is removed. Static bodies absorb
/// nothing, so a static anchor pushes its neighbours the full distance.
///
/// ### Parameters
/// - `bodies` - Bodies that may collide with each other.
/// - `iterations` - Number of relaxation passes; more passes settle dense
///   clusters faster.
pub fn collision_phase(bodies: &mut [&mut Body], iterations: usize) {
    let n = bodies.len();
    for _ in 0..iterations {
        for j in 1..n {
            let (left, right) = bodies.split_at_mut(j);
            let b = &mut *right[0];
            for a in left.iter_mut() {
                separate(a, b);
            }
        }
    }
}

fn separate(a: &mut Body, b: &mut Body) {
    if !a.collides_with(b) {
        return;
    }
    let (share_a, share_b) = match (a.dynamic, b.dynamic) {
        (true, true) => (0.5, 0.5),
        (true, false) => (1.0, 0.0),
        (false, true) => (0.0, 1.0),
        (false, false) => return,
    };

    let delta = b.position - a.position;
    let dist = delta.length();
    let min_dist = a.radius + b.radius;
    if dist >= min_dist {
        return;
    }

    // Coincident centers separate along +x.
    let normal = if dist > f32::EPSILON {
        delta / dist
    } else {
        Vec2::X
    };
    let overlap = min_dist - dist;
    a.position -= normal * overlap * share_a;
    b.position += normal * overlap * share_b;

    let closing = (b.velocity - a.velocity).dot(normal);
    if closing < 0.0 {
        a.velocity += normal * closing * share_a;
        b.velocity -= normal * closing * share_b;
    }
}

/// Turns accumulated forces into motion and clears them.
///
/// ### Parameters
/// - `bodies` - Bodies to advance.
/// - `dt` - Step length in seconds, already scaled by the world speed.
pub fn integrate_phase<'a>(bodies: impl IntoIterator<Item = &'a mut Body>, dt: f32) {
    for body in bodies {
        if body.dynamic {
            body.velocity += body.force * dt;
            body.velocity /= 1.0 + body.linear_damping * dt;
            body.position += body.velocity * dt;
        } else {
            body.velocity = Vec2::ZERO;
        }
        body.force = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_phase_skips_static_and_masked_bodies() {
        let mut field = Field::spring(Category::BIG_FIELD);
        field.strength = 1.0;

        let mut moving = Body::parent(Vec2::new(10.0, 0.0), 5.0, 0.0);
        let mut pinned = Body::parent(Vec2::new(10.0, 0.0), 5.0, 0.0);
        pinned.dynamic = false;
        let mut child = Body::child(Vec2::new(10.0, 0.0), 5.0, 0.0);

        field_phase(&field, [&mut moving, &mut pinned, &mut child], 2.0);

        assert_eq!(moving.force(), Vec2::new(-20.0, 0.0));
        assert_eq!(pinned.force(), Vec2::ZERO);
        assert_eq!(child.force(), Vec2::ZERO);
    }

    #[test]
    fn collision_phase_separates_same_class_only() {
        let mut a = Body::parent(Vec2::new(0.0, 0.0), 10.0, 0.0);
        let mut b = Body::parent(Vec2::new(10.0, 0.0), 10.0, 0.0);
        let mut c = Body::child(Vec2::new(5.0, 0.0), 10.0, 0.0);

        collision_phase(&mut [&mut a, &mut b, &mut c], 1);

        assert!((b.position.x - a.position.x - 20.0).abs() < 1e-4);
        assert_eq!(a.position.x, -5.0);
        assert_eq!(b.position.x, 15.0);
        // The child overlaps both parents but belongs to another class.
        assert_eq!(c.position, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn static_anchor_pushes_neighbour_full_distance() {
        let mut anchor = Body::child(Vec2::ZERO, 10.0, 0.0);
        anchor.dynamic = false;
        let mut other = Body::child(Vec2::new(0.0, 5.0), 10.0, 0.0);

        collision_phase(&mut [&mut anchor, &mut other], 1);

        assert_eq!(anchor.position, Vec2::ZERO);
        assert!((other.position.y - 20.0).abs() < 1e-4);
    }

    #[test]
    fn integrate_applies_force_damping_and_clears() {
        let mut body = Body::parent(Vec2::ZERO, 1.0, 1.0);
        body.apply_force(Vec2::new(2.0, 0.0));

        integrate_phase([&mut body], 1.0);

        // v = (0 + 2) / (1 + 1) = 1, p = 1
        assert_eq!(body.velocity, Vec2::new(1.0, 0.0));
        assert_eq!(body.position, Vec2::new(1.0, 0.0));
        assert_eq!(body.force(), Vec2::ZERO);
    }

    #[test]
    fn boundary_clamps_and_centers_narrow_axes() {
        let boundary = Boundary {
            min: Vec2::new(0.0, 0.0),
            max: Vec2::new(100.0, 10.0),
        };
        let mut body = Body::parent(Vec2::new(150.0, 3.0), 20.0, 0.0);
        body.velocity = Vec2::new(4.0, 4.0);

        boundary.contain(&mut body);

        assert_eq!(body.position, Vec2::new(80.0, 5.0));
        assert_eq!(body.velocity, Vec2::new(0.0, 0.0));
    }
}
