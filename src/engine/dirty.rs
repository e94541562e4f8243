use bitflags::bitflags;
use std::fmt::Display;

bitflags! {
    /// Reasons why the last built frame no longer reflects the context state.
    ///
    /// A context needs a new frame as long as any flag is set. All flags are
    /// cleared together by a successful frame build.
    pub struct DirtyFlags: u8 {
        /// Freshly created context, nothing built yet
        const INITIAL   = 0b0000_0001;
        /// Explicit invalidation from outside the engine (e.g. bridge calls)
        const EXTERNAL  = 0b0000_0010;
        /// Size or scale factor changed
        const SIZE      = 0b0000_0100;
        /// A touch session began, moved or ended
        const INPUT     = 0b0000_1000;
        /// Focus state flipped
        const FOCUS     = 0b0001_0000;
        /// An animation advanced, started or finished
        const ANIMATION = 0b0010_0000;
    }
}

impl Default for DirtyFlags {
    fn default() -> Self {
        DirtyFlags::empty()
    }
}

impl Display for DirtyFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();

        if self.contains(DirtyFlags::INITIAL) {
            parts.push("Initial");
        }
        if self.contains(DirtyFlags::EXTERNAL) {
            parts.push("External");
        }
        if self.contains(DirtyFlags::SIZE) {
            parts.push("Size");
        }
        if self.contains(DirtyFlags::INPUT) {
            parts.push("Input");
        }
        if self.contains(DirtyFlags::FOCUS) {
            parts.push("Focus");
        }
        if self.contains(DirtyFlags::ANIMATION) {
            parts.push("Animation");
        }

        if parts.is_empty() {
            write!(f, "Clean")
        } else {
            write!(f, "{}", parts.join("+"))
        }
    }
}
