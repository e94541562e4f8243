pub mod backend;
pub mod backends;

pub use backend::{FrameBuilder, FrameInput};
