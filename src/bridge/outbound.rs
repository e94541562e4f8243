use crate::bridge::{owned, BridgeCall};
use crate::errors::BridgeError;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::sync::{PoisonError, RwLock};

/// Host callback for engine → host calls.
///
/// Receives NUL-terminated namespace, name and argument strings that are only
/// valid for the duration of the call. Returns a heap string owned by the
/// engine from then on, or null for "no result".
pub type NativeCallFn =
    unsafe extern "C" fn(ns: *const c_char, name: *const c_char, args: *const c_char) -> *mut c_char;

/// Host function that releases a string returned by [`NativeCallFn`].
pub type NativeFreeFn = unsafe extern "C" fn(ptr: *mut c_char);

/// Single-slot registration of the host callback. Last registration wins.
#[derive(Debug, Default)]
pub struct NativeBridge {
    call_fn: RwLock<Option<NativeCallFn>>,
    free_fn: RwLock<Option<NativeFreeFn>>,
}

impl NativeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_call_fn(&self, call_fn: Option<NativeCallFn>) {
        log::info!("native bridge callback {}", if call_fn.is_some() { "registered" } else { "cleared" });
        *self.call_fn.write().unwrap_or_else(PoisonError::into_inner) = call_fn;
    }

    pub fn set_free_fn(&self, free_fn: Option<NativeFreeFn>) {
        *self.free_fn.write().unwrap_or_else(PoisonError::into_inner) = free_fn;
    }

    fn call_fn(&self) -> Option<NativeCallFn> {
        *self.call_fn.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn free_fn(&self) -> Option<NativeFreeFn> {
        *self.free_fn.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_ready(&self) -> bool {
        self.call_fn().is_some()
    }

    /// Invokes the host callback synchronously.
    ///
    /// The registration lock is not held while the host runs, so the host may
    /// call back into the engine (including re-registering) from its handler.
    pub fn call(&self, call: &BridgeCall) -> Result<Option<String>, BridgeError> {
        call.validate()?;
        let call_fn = self.call_fn().ok_or(BridgeError::NotReady)?;

        let namespace = CString::new(call.namespace.as_str()).map_err(|_| BridgeError::InteriorNul)?;
        let name = CString::new(call.name.as_str()).map_err(|_| BridgeError::InteriorNul)?;
        let args = CString::new(call.args.as_str()).map_err(|_| BridgeError::InteriorNul)?;

        log::trace!("outbound {call} ({} bytes)", call.args.len());
        // SAFETY: all three pointers are valid NUL-terminated strings that
        // outlive the call; the callback contract is documented on NativeCallFn.
        let raw = unsafe { call_fn(namespace.as_ptr(), name.as_ptr(), args.as_ptr()) };
        if raw.is_null() {
            return Ok(None);
        }

        // SAFETY: non-null results are NUL-terminated and stay valid until released below.
        let text = unsafe { CStr::from_ptr(raw) }.to_str().map(str::to_owned);
        self.release_result(raw);

        text.map(Some).map_err(|_| BridgeError::InvalidUtf8)
    }

    // Exactly one release per result, through the path matching its allocator
    fn release_result(&self, raw: *mut c_char) {
        match self.free_fn() {
            // SAFETY: the host registered this function to release its own results.
            Some(free_fn) => unsafe { free_fn(raw) },
            None => {
                if !owned::ledger().release(raw) {
                    log::warn!("host result {:p} was not allocated with blinc_alloc_string, leaking it", raw);
                }
            }
        }
    }
}
