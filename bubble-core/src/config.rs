use glam::Vec2;

/// Tunables for the physics stepping collaborator.
#[derive(Clone, Copy, Debug)]
pub struct PhysicsConfig {
    /// Velocity damping applied to parent bubbles.
    pub bubble_damping: f32,
    /// Velocity damping applied to child bubbles inside a parent.
    pub child_damping: f32,
    /// Multiplier converting field output into acceleration.
    pub force_scale: f32,
    /// Multiplier on the drag stirring force.
    pub drag_scale: f32,
    /// Strength of each parent's private spring field.
    pub spring_strength: f32,
    /// Extra radius added to a parent's spring field region.
    pub spring_margin: f32,
    /// Overlap resolution passes per step.
    pub collision_iterations: usize,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            bubble_damping: 3.0,
            child_damping: 50.0,
            force_scale: 400.0,
            drag_scale: 20.0,
            spring_strength: 0.05,
            spring_margin: 0.0,
            collision_iterations: 4,
        }
    }
}

/// Scene configuration set by the host.
#[derive(Clone, Copy, Debug)]
pub struct SceneConfig {
    /// Canvas size; drives the global field strength and region.
    pub size: Vec2,
    pub allows_multiple_selection: bool,
    pub remove_on_long_press: bool,
    /// Seconds a press must be held to count as a long press.
    pub long_press_duration: f64,
    /// Physics boundary scale over the visual circle of a parent.
    pub margin_scale: f32,
    /// Physics boundary scale over the visual circle of a child.
    pub child_margin_scale: f32,
    /// Duration of selection and removal animations, in seconds.
    pub animation_duration: f32,
    /// Radius of a bubble before it has any children.
    pub default_radius: f32,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
    pub physics: PhysicsConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            size: Vec2::new(800.0, 600.0),
            allows_multiple_selection: true,
            remove_on_long_press: false,
            long_press_duration: 0.35,
            margin_scale: 1.1,
            child_margin_scale: 1.15,
            animation_duration: 0.2,
            default_radius: 50.0,
            seed: None,
            physics: PhysicsConfig::default(),
        }
    }
}

/// Configuration of the cursor-driven time range engine.
#[derive(Clone, Copy, Debug)]
pub struct TimelineConfig {
    /// Days over which a goal fades from transparent to opaque.
    pub max_fade_distance: f32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            max_fade_distance: 10.0,
        }
    }
}
