use crate::engine::animation::AnimationTracker;
use crate::engine::input::TouchSession;
use crate::engine::{DirtyFlags, SurfaceSize};

/// Snapshot of a render context handed to a [`FrameBuilder`].
#[derive(Debug)]
pub struct FrameInput<'a> {
    /// Number of the frame being built (the first frame is 1)
    pub frame_number: u64,
    /// Logical size and scale factor of the surface
    pub size: SurfaceSize,
    /// Does the surface hold input focus
    pub focused: bool,
    /// Touches currently down, ordered by identifier
    pub touches: &'a [TouchSession],
    /// Why this frame was requested
    pub dirty: DirtyFlags,
    /// Animation state, for reading animated values
    pub animations: &'a AnimationTracker,
}

/// Frame construction interface. Calls occur on whatever thread the host uses
/// to drive the context, one at a time.
///
/// Layout, scene construction and GPU submission all live behind this trait;
/// the engine only decides *when* a frame is built.
pub trait FrameBuilder: Send {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Build the frame for the given context snapshot.
    fn build(&mut self, frame: &FrameInput<'_>) -> anyhow::Result<()>;

    /// Called once when the builder is replaced or its context is destroyed.
    fn release(&mut self) {}
}
