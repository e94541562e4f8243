//! Blinc render-context engine.
//!
//! A host shell (iOS, Android, desktop) owns the window, the display link and
//! the raw input events. It drives one or more render contexts through the C
//! ABI in [`ffi`]: it asks whether a frame is needed, advances animations once
//! per display refresh, builds frames, and forwards size, focus and touch
//! changes. The [`bridge`] carries string-addressed calls between host code
//! and engine code in both directions.
//!
//! Rust embedders can use the typed API directly:
//!
//! ```
//! use blinc_engine::engine;
//!
//! let ctx = engine::create_context(390, 844, 3.0);
//! assert!(engine::with_context(ctx, |c| c.needs_render()).unwrap());
//! engine::with_context(ctx, |c| c.build_frame()).unwrap().unwrap();
//! assert!(!engine::with_context(ctx, |c| c.needs_render()).unwrap());
//! engine::destroy_context(ctx);
//! ```

pub mod bridge;
pub mod config;
pub mod engine;
pub mod errors;
pub mod ffi;
pub mod logging;
pub mod render;

pub use config::EngineConfig;
pub use engine::{ContextHandle, DirtyFlags, RenderContext};
pub use errors::{BridgeError, EngineError};

#[cfg(test)]
lazy_static::lazy_static! {
    static ref TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
}

/// Serializes tests that touch process-wide state (context store, bridge
/// registration, configuration).
#[cfg(test)]
pub(crate) fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
