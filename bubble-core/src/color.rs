use glam::Vec4;
use rand::Rng;

/// Linear RGBA color with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color(pub Vec4);

impl Color {
    pub const CLEAR: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self(Vec4::new(r, g, b, a))
    }

    /// Builds an opaque color from 8-bit channels.
    pub const fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Interpolates toward `to`. The endpoints are returned exactly.
    pub fn lerp(self, to: Color, t: f32) -> Color {
        if t <= 0.0 {
            self
        } else if t >= 1.0 {
            to
        } else {
            Color(self.0.lerp(to.0, t))
        }
    }

    /// Channels as 8-bit values, for renderers.
    pub fn to_rgba8(self) -> [u8; 4] {
        (self.0.clamp(Vec4::ZERO, Vec4::ONE) * 255.0)
            .round()
            .to_array()
            .map(|c| c as u8)
    }
}

pub const RED: Color = Color::from_rgb8(255, 59, 48);
pub const ORANGE: Color = Color::from_rgb8(255, 149, 0);
pub const YELLOW: Color = Color::from_rgb8(255, 204, 0);
pub const GREEN: Color = Color::from_rgb8(76, 217, 100);
pub const TEAL_BLUE: Color = Color::from_rgb8(90, 200, 250);
pub const BLUE: Color = Color::from_rgb8(0, 122, 255);
pub const PURPLE: Color = Color::from_rgb8(88, 86, 214);
pub const PINK: Color = Color::from_rgb8(255, 45, 85);

/// Fill colors bubbles are created with.
pub const PALETTE: [Color; 8] = [RED, ORANGE, YELLOW, GREEN, TEAL_BLUE, BLUE, PURPLE, PINK];

/// Habit phrases used when the host adds a bubble without a name of its own.
pub const DEMO_NAMES: [&str; 24] = [
    "water plants",
    "put the bin out",
    "eat a healthy meal",
    "eat fruits and veggies",
    "drink water",
    "brush and floss",
    "take vitamins",
    "limit caffeine",
    "check my posture",
    "hit the gym",
    "exercise",
    "go for a walk",
    "go for a run",
    "go for a ride",
    "go for a swim",
    "practice yoga",
    "do stretching",
    "tidy the house",
    "pay bills",
    "track my expenses",
    "make my bed",
    "do the laundry",
    "cook more often",
    "meditate",
];

pub fn random_color(rng: &mut impl Rng) -> Color {
    PALETTE[rng.random_range(0..PALETTE.len())]
}

pub fn random_name(rng: &mut impl Rng) -> &'static str {
    DEMO_NAMES[rng.random_range(0..DEMO_NAMES.len())]
}
