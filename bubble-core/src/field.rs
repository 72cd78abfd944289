//! Force field primitives: collision categories, regions and fields.
//!
//! A [`Field`] contributes a force to every body whose field mask meets the
//! field's category and whose position lies inside the field's [`Region`].
//! Parents and children use disjoint categories so each size class only
//! feels, and collides with, its own kind.

use std::ops::BitOr;

use glam::Vec2;
use tracing::warn;

/// Bitmask selecting which bodies and fields interact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Category(pub u32);

impl Category {
    pub const NONE: Category = Category(0);
    pub const BIG_CIRCLE: Category = Category(2);
    pub const SMALL_CIRCLE: Category = Category(4);
    pub const BIG_FIELD: Category = Category(8);
    pub const SMALL_FIELD: Category = Category(16);

    #[inline]
    pub fn intersects(self, other: Category) -> bool {
        self.0 & other.0 != 0
    }
}

impl BitOr for Category {
    type Output = Category;

    fn bitor(self, rhs: Category) -> Category {
        Category(self.0 | rhs.0)
    }
}

/// Area in which a field acts, relative to the field's position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Region {
    Infinite,
    Disc { radius: f32 },
}

impl Region {
    pub fn contains(&self, offset: Vec2) -> bool {
        match *self {
            Region::Infinite => true,
            Region::Disc { radius } => offset.length_squared() <= radius * radius,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Pulls toward the center, weakening with distance.
    RadialGravity,
    /// Pulls toward the center proportionally to distance.
    Spring,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Field {
    pub kind: FieldKind,
    pub position: Vec2,
    pub region: Region,
    pub strength: f32,
    /// Distances below this are treated as this, so the pull never spikes.
    pub minimum_radius: f32,
    pub category: Category,
    pub enabled: bool,
}

impl Field {
    pub fn radial_gravity(category: Category) -> Self {
        Self {
            kind: FieldKind::RadialGravity,
            position: Vec2::ZERO,
            region: Region::Infinite,
            strength: 1.0,
            minimum_radius: 0.0,
            category,
            enabled: true,
        }
    }

    pub fn spring(category: Category) -> Self {
        Self {
            kind: FieldKind::Spring,
            ..Self::radial_gravity(category)
        }
    }

    /// Builds the private spring field a parent bubble exerts on its children.
    ///
    /// A non-positive radius is a programmer error: it asserts in debug
    /// builds and yields no field in release builds.
    pub fn bubble_region(radius: f32, margin: f32, strength: f32) -> Option<Self> {
        debug_assert!(radius > 0.0, "unknown radius: {radius}");
        if radius.is_nan() || radius <= 0.0 {
            warn!(radius, "skipping field region for non-positive radius");
            return None;
        }
        Some(Self {
            region: Region::Disc {
                radius: radius + margin,
            },
            strength,
            ..Self::spring(Category::SMALL_FIELD)
        })
    }

    /// Whether a body with `field_mask` at `pos` is subject to this field.
    pub fn affects(&self, field_mask: Category, pos: Vec2) -> bool {
        self.enabled
            && self.category.intersects(field_mask)
            && self.region.contains(pos - self.position)
    }

    /// Force this field exerts on a body with `field_mask` at `pos`.
    pub fn force_at(&self, field_mask: Category, pos: Vec2) -> Vec2 {
        if !self.affects(field_mask, pos) {
            return Vec2::ZERO;
        }
        let to_center = self.position - pos;
        match self.kind {
            FieldKind::RadialGravity => {
                let d = to_center.length().max(self.minimum_radius);
                if d <= 0.0 {
                    return Vec2::ZERO;
                }
                to_center.normalize_or_zero() * (self.strength / d)
            }
            FieldKind::Spring => to_center * self.strength,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_only_meet_their_own_class() {
        let parent = Category::BIG_CIRCLE;
        let child = Category::SMALL_CIRCLE;
        assert!(parent.intersects(Category::BIG_CIRCLE));
        assert!(!parent.intersects(child));
        assert!(!Category::BIG_FIELD.intersects(Category::SMALL_FIELD));
        assert!((parent | child).intersects(child));
    }

    #[test]
    fn gravity_points_at_center_and_weakens_with_distance() {
        let mut field = Field::radial_gravity(Category::BIG_FIELD);
        field.strength = 100.0;

        let near = field.force_at(Category::BIG_FIELD, Vec2::new(10.0, 0.0));
        let far = field.force_at(Category::BIG_FIELD, Vec2::new(50.0, 0.0));

        assert!(near.x < 0.0 && near.y == 0.0);
        assert!((near.x + 10.0).abs() < 1e-5);
        assert!(far.length() < near.length());
    }

    #[test]
    fn minimum_radius_caps_the_pull() {
        let mut field = Field::radial_gravity(Category::BIG_FIELD);
        field.strength = 100.0;
        field.minimum_radius = 50.0;

        let close = field.force_at(Category::BIG_FIELD, Vec2::new(1.0, 0.0));
        let at_min = field.force_at(Category::BIG_FIELD, Vec2::new(50.0, 0.0));

        assert!((close.length() - 2.0).abs() < 1e-5);
        assert!((at_min.length() - 2.0).abs() < 1e-5);
    }

    #[test]
    fn masks_region_and_enable_flag_gate_the_force() {
        let mut field = Field::spring(Category::SMALL_FIELD);
        field.region = Region::Disc { radius: 10.0 };

        let inside = Vec2::new(2.0, 0.0);
        let outside = Vec2::new(20.0, 0.0);

        assert_eq!(
            field.force_at(Category::SMALL_FIELD, inside),
            Vec2::new(-2.0, 0.0)
        );
        assert_eq!(field.force_at(Category::BIG_FIELD, inside), Vec2::ZERO);
        assert_eq!(field.force_at(Category::SMALL_FIELD, outside), Vec2::ZERO);

        field.enabled = false;
        assert_eq!(field.force_at(Category::SMALL_FIELD, inside), Vec2::ZERO);
    }

    #[test]
    fn bubble_region_matches_radius_plus_margin() {
        let field = Field::bubble_region(80.0, 5.0, 0.5).unwrap();
        assert_eq!(field.kind, FieldKind::Spring);
        assert_eq!(field.region, Region::Disc { radius: 85.0 });
        assert_eq!(field.category, Category::SMALL_FIELD);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "unknown radius")]
    fn bubble_region_asserts_on_zero_radius() {
        let _ = Field::bubble_region(0.0, 0.0, 0.5);
    }
}
