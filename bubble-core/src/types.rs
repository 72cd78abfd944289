/// Identifier for a top-level bubble in a [`crate::scene::Scene`].
///
/// Ids are handed out monotonically by the scene and never reused, so a
/// stale id simply stops resolving once its bubble is destroyed.
pub type BubbleId = u64;
