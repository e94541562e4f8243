//! Arena of render contexts addressed by generational handles.
//!
//! The host never holds a pointer into engine memory. It holds a
//! [`ContextHandle`], a slot map key carried across the C boundary as a
//! 64-bit integer. Destroying a context frees its slot and bumps the slot's
//! version, so a stale or forged handle resolves to "no such context" instead
//! of touching freed memory.

use crate::config::EngineConfig;
use crate::engine::context::{ContextSettings, RenderContext};
use crate::engine::size::{validate_scale, SurfaceSize};
use crate::errors::EngineError;
use slotmap::{new_key_type, SlotMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

new_key_type! {
    /// Opaque handle to a render context. The null key never resolves.
    pub struct ContextHandle;
}

/// One stored context plus state that can be set without taking its lock.
#[derive(Debug)]
pub struct ContextEntry {
    pub context: Mutex<RenderContext>,
    /// Set by `mark_dirty` while the context is locked elsewhere
    pending_dirty: AtomicBool,
}

impl ContextEntry {
    fn new(context: RenderContext) -> Self {
        Self {
            context: Mutex::new(context),
            pending_dirty: AtomicBool::new(false),
        }
    }

    /// Records a dirty mark to be applied by the current lock holder.
    pub fn defer_dirty(&self) {
        self.pending_dirty.store(true, Ordering::SeqCst);
    }

    /// Applies a deferred dirty mark, if any.
    pub fn apply_pending(&self, context: &mut RenderContext) {
        if self.pending_dirty.swap(false, Ordering::SeqCst) {
            context.mark_dirty();
        }
    }
}

/// Shared reference to one context. The store only holds it; callers lock it.
pub type SharedContext = Arc<ContextEntry>;

#[derive(Default)]
pub struct ContextStore {
    contexts: SlotMap<ContextHandle, SharedContext>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context and returns its handle.
    ///
    /// A scale factor that is not positive and finite falls back to 1.0.
    pub fn create(&mut self, width: u32, height: u32, scale_factor: f64, config: &EngineConfig) -> ContextHandle {
        let scale_factor = validate_scale(scale_factor).unwrap_or_else(|e| {
            log::warn!("create: {e}, using 1.0");
            1.0
        });
        let size = SurfaceSize { width, height, scale_factor };
        let settings = ContextSettings {
            animation_step_ms: config.animation_step_ms,
            spring_rest_threshold: config.spring_rest_threshold,
        };
        let context = RenderContext::new(size, settings);

        let handle = self.contexts.insert(Arc::new(ContextEntry::new(context)));
        log::debug!("created context {:?} ({}x{} @{})", handle, width, height, scale_factor);
        handle
    }

    /// Destroys a context. Null, stale and unknown handles are ignored.
    ///
    /// The context's state is released once the last outstanding reference is dropped.
    pub fn destroy(&mut self, handle: ContextHandle) -> bool {
        match self.contexts.remove(handle) {
            Some(_) => {
                log::debug!("destroyed context {:?}", handle);
                true
            }
            None => {
                log::debug!("destroy: ignoring invalid handle {:?}", handle);
                false
            }
        }
    }

    pub fn get(&self, handle: ContextHandle) -> Result<SharedContext, EngineError> {
        self.contexts.get(handle).cloned().ok_or(EngineError::InvalidHandle)
    }

    pub fn contains(&self, handle: ContextHandle) -> bool {
        self.contexts.contains_key(handle)
    }

    /// Number of live contexts
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::{Key, KeyData};

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn create_returns_non_null_dirty_context() {
        let mut store = ContextStore::new();
        let h = store.create(390, 844, 3.0, &config());
        assert!(!h.is_null());
        assert!(store.get(h).unwrap().context.lock().unwrap().needs_render());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn null_handle_is_invalid() {
        let mut store = ContextStore::new();
        assert!(matches!(store.get(ContextHandle::null()), Err(EngineError::InvalidHandle)));
        assert!(!store.destroy(ContextHandle::null()));
        assert!(!store.contains(KeyData::from_ffi(0xdead_beef).into()));
    }

    #[test]
    fn destroy_twice_is_harmless() {
        let mut store = ContextStore::new();
        let h = store.create(10, 10, 1.0, &config());
        let held = store.get(h).unwrap();
        assert!(store.destroy(h));
        assert!(!store.destroy(h));
        // a reference obtained before destroy stays usable until dropped
        assert!(held.context.lock().unwrap().needs_render());
        assert!(store.is_empty());
        assert!(store.get(h).is_err());
    }

    #[test]
    fn stale_handle_does_not_alias_reused_slot() {
        let mut store = ContextStore::new();
        let old = store.create(10, 10, 1.0, &config());
        store.destroy(old);

        let new = store.create(20, 20, 1.0, &config());
        assert_ne!(old, new);
        assert!(store.get(old).is_err());
        assert_eq!(store.get(new).unwrap().context.lock().unwrap().size().width, 20);
    }

    #[test]
    fn many_contexts_stay_live_at_once() {
        let mut store = ContextStore::new();
        let handles: Vec<ContextHandle> = (0..64).map(|i| store.create(i + 1, 1, 1.0, &config())).collect();
        assert_eq!(store.len(), 64);

        for (i, h) in handles.iter().enumerate() {
            assert_eq!(store.get(*h).unwrap().context.lock().unwrap().size().width, i as u32 + 1);
        }
        for h in &handles {
            assert!(store.destroy(*h));
        }
        assert!(store.is_empty());
    }

    #[test]
    fn invalid_scale_falls_back_to_one() {
        let mut store = ContextStore::new();
        let h = store.create(5, 5, 0.0, &config());
        assert_eq!(store.get(h).unwrap().context.lock().unwrap().size().scale_factor, 1.0);
    }

    #[test]
    fn contexts_are_independent() {
        let mut store = ContextStore::new();
        let a = store.create(10, 10, 1.0, &config());
        let b = store.create(10, 10, 1.0, &config());

        store.get(a).unwrap().context.lock().unwrap().build_frame().unwrap();
        assert!(!store.get(a).unwrap().context.lock().unwrap().needs_render());
        assert!(store.get(b).unwrap().context.lock().unwrap().needs_render());
    }

    #[test]
    fn deferred_dirty_is_applied_once() {
        let mut store = ContextStore::new();
        let h = store.create(10, 10, 1.0, &config());
        let entry = store.get(h).unwrap();
        let mut ctx = entry.context.lock().unwrap();
        ctx.build_frame().unwrap();

        entry.defer_dirty();
        entry.apply_pending(&mut ctx);
        assert!(ctx.needs_render());

        ctx.build_frame().unwrap();
        entry.apply_pending(&mut ctx);
        assert!(!ctx.needs_render());
    }
}
