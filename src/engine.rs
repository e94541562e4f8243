//! Render-context engine.
//!
//! Contexts live in a process-wide [`ContextStore`]. Every operation resolves
//! the handle, releases the store lock, then locks only the addressed context,
//! so engine code running inside one context (a frame builder issuing a bridge
//! call, for instance) never blocks operations on other contexts.
//!
//! Calls against the *same* context must be serialized by the host. A call
//! that finds its context already locked, including a re-entrant call from
//! inside that context's own frame build, fails with
//! [`EngineError::ContextBusy`] instead of deadlocking. The one exception is
//! [`mark_dirty`]: a mark that finds the context busy is recorded and applied
//! by the lock holder before it releases the context.

pub mod animation;
mod context;
mod dirty;
pub mod input;
mod size;
mod store;

pub use context::{ContextSettings, RenderContext};
pub use dirty::DirtyFlags;
pub use size::SurfaceSize;
pub use store::{ContextEntry, ContextHandle, ContextStore, SharedContext};

use crate::config;
use crate::errors::EngineError;
use crate::render::FrameBuilder;
use lazy_static::lazy_static;
use slotmap::Key;
use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};

lazy_static! {
    static ref CONTEXTS: Mutex<ContextStore> = Mutex::new(ContextStore::new());
}

fn store() -> MutexGuard<'static, ContextStore> {
    CONTEXTS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Creates a context using the current engine configuration.
pub fn create_context(width: u32, height: u32, scale_factor: f64) -> ContextHandle {
    let cfg = config::current();
    store().create(width, height, scale_factor, &cfg)
}

/// Destroys a context. Returns false for null, stale or unknown handles.
pub fn destroy_context(handle: ContextHandle) -> bool {
    // The context itself is dropped outside the store lock
    let removed = {
        let mut store = store();
        let held = store.get(handle).ok();
        store.destroy(handle);
        held
    };
    removed.is_some()
}

/// Runs `f` against the context behind `handle`.
///
/// Dirty marks deferred while the context was busy are applied before `f`
/// runs and again after it returns, so a mark issued from inside `f` is not
/// lost when `f` clears the flags.
pub fn with_context<R>(
    handle: ContextHandle,
    f: impl FnOnce(&mut RenderContext) -> R,
) -> Result<R, EngineError> {
    if handle.is_null() {
        return Err(EngineError::InvalidHandle);
    }

    let shared = store().get(handle)?;
    let mut context = match shared.context.try_lock() {
        Ok(guard) => guard,
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        Err(TryLockError::WouldBlock) => return Err(EngineError::ContextBusy),
    };

    shared.apply_pending(&mut context);
    let result = f(&mut context);
    shared.apply_pending(&mut context);
    Ok(result)
}

/// Marks a context dirty. When the context is busy the mark is deferred
/// to the current lock holder instead of failing.
pub fn mark_dirty(handle: ContextHandle) -> Result<(), EngineError> {
    if handle.is_null() {
        return Err(EngineError::InvalidHandle);
    }

    let shared = store().get(handle)?;
    match shared.context.try_lock() {
        Ok(mut context) => context.mark_dirty(),
        Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().mark_dirty(),
        Err(TryLockError::WouldBlock) => {
            log::debug!("mark_dirty: context {:?} busy, deferring", handle);
            shared.defer_dirty();
        }
    }
    Ok(())
}

/// Installs a frame builder on a live context.
pub fn set_frame_builder(handle: ContextHandle, builder: Box<dyn FrameBuilder>) -> Result<(), EngineError> {
    with_context(handle, |ctx| ctx.set_frame_builder(builder))
}

/// Number of live contexts in the process-wide store.
pub fn live_contexts() -> usize {
    store().len()
}
