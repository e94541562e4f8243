//! Ownership ledger for strings the engine hands across the boundary.
//!
//! The engine allocates every string it gives to the host through
//! [`StringLedger::alloc`] and records the pointer. The host gives it back
//! exactly once with `blinc_free_string`. Because only recorded pointers are
//! ever reconstructed, releasing a null, foreign or already released pointer
//! is a logged no-op instead of a double free.

use crate::errors::BridgeError;
use lazy_static::lazy_static;
use std::collections::HashSet;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct StringLedger {
    live: Mutex<HashSet<usize>>,
}

impl StringLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self) -> MutexGuard<'_, HashSet<usize>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copies `s` into a NUL-terminated heap string owned by the receiver.
    pub fn alloc(&self, s: &str) -> Result<*mut c_char, BridgeError> {
        let ptr = CString::new(s).map_err(|_| BridgeError::InteriorNul)?.into_raw();
        self.live().insert(ptr as usize);
        Ok(ptr)
    }

    /// Releases a string produced by [`alloc`](Self::alloc). Returns false when
    /// the pointer is null or not currently owned by a receiver.
    pub fn release(&self, ptr: *mut c_char) -> bool {
        if ptr.is_null() {
            return false;
        }
        if !self.live().remove(&(ptr as usize)) {
            log::warn!("release of unknown or already released string {:p} ignored", ptr);
            return false;
        }
        // SAFETY: the pointer came from CString::into_raw in `alloc` and was
        // still recorded, so it has not been reconstructed before.
        drop(unsafe { CString::from_raw(ptr) });
        true
    }

    /// Copies the contents of a live string and releases it.
    pub fn take(&self, ptr: *mut c_char) -> Option<String> {
        if ptr.is_null() || !self.is_live(ptr) {
            return None;
        }
        // SAFETY: live pointers are valid NUL-terminated strings from `alloc`.
        let text = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
        self.release(ptr);
        Some(text)
    }

    pub fn is_live(&self, ptr: *const c_char) -> bool {
        !ptr.is_null() && self.live().contains(&(ptr as usize))
    }

    /// Number of strings not yet released
    pub fn len(&self) -> usize {
        self.live().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

lazy_static! {
    static ref LEDGER: StringLedger = StringLedger::new();
}

/// The process-wide ledger used by the C ABI.
pub fn ledger() -> &'static StringLedger {
    &LEDGER
}
