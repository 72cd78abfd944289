//! Core bubble layout and interaction engine.
//!
//! Main components:
//! - [`field`] — collision categories and radial/spring force fields.
//! - [`physics`] — bodies, world boundary and the per-step phases.
//! - [`bubble`] — parent and child bubbles, radius tiers, child placement.
//! - [`selection`] — the select/deselect state machine.
//! - [`scene`] — the layout engine owning bubbles, fields and the reset sweep.
//! - [`interaction`] — drag, long-press removal and pinch zoom.
//! - [`timeline`] — the day cursor driving goal visibility.
//! - [`animation`] — tweens and the time-ordered action scheduler.
//! - [`delegate`] — host notifications.
//! - [`config`] — scene, physics and timeline configuration.
//! - [`color`] — colors, palette and demo names.
//! - [`error`] — dataset errors.
//! - [`types`] — shared ids.

pub mod animation;
pub mod bubble;
pub mod color;
pub mod config;
pub mod delegate;
pub mod error;
pub mod field;
pub mod interaction;
pub mod physics;
pub mod scene;
pub mod selection;
pub mod timeline;
pub mod types;

pub use bubble::{Bubble, ChildBubble, Preset, SelectionStyle};
pub use config::{PhysicsConfig, SceneConfig, TimelineConfig};
pub use delegate::{EventLog, SceneDelegate, SceneEvent};
pub use error::DatasetError;
pub use interaction::{Camera, InteractionController, PressOutcome};
pub use scene::Scene;
pub use timeline::{CursorUpdate, Dataset, TimeRangeEngine};
pub use types::BubbleId;
