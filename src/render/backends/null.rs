use crate::render::backend::{FrameBuilder, FrameInput};
use anyhow::Result;

/// Frame builder that does not draw anything.
///
/// Used for contexts created through the C ABI until an embedder installs a
/// real builder, and in headless tests.
#[derive(Debug, Default)]
pub struct NullFrameBuilder {
    /// Number of frames "built" so far.
    frames: u64,
    /// Physical size of the last frame.
    last_physical: (u32, u32),
}

impl NullFrameBuilder {
    /// Creates a new instance of the null builder.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_physical(&self) -> (u32, u32) {
        self.last_physical
    }
}

impl FrameBuilder for NullFrameBuilder {
    fn name(&self) -> &str {
        "NullFrameBuilder"
    }

    fn build(&mut self, frame: &FrameInput<'_>) -> Result<()> {
        self.frames = self.frames.wrapping_add(1);
        self.last_physical = frame.size.physical();
        log::trace!(
            "{}: frame {} at {:?} ({})",
            self.name(),
            frame.frame_number,
            self.last_physical,
            frame.dirty
        );
        Ok(())
    }
}
