//! Native call bridge.
//!
//! Calls cross the host boundary in both directions, addressed by a
//! `namespace` and a `name`, carrying a serialized argument string and
//! returning a serialized result string or nothing:
//!
//! - **Outbound** (engine → host): the host registers one process-wide
//!   callback with `blinc_set_native_call_fn`. Engine code calls
//!   [`call_native`] or [`call_native_json`]; the call blocks until the host
//!   returns.
//! - **Inbound** (host → engine): engine code registers handlers with
//!   [`register_handler`]; the host invokes them with `blinc_bridge_call`.
//!
//! Payloads are opaque to the bridge. The JSON helpers exist for engine code
//! that wants typed arguments; the host only ever sees text.
//!
//! Every string that crosses the boundary is owned by whoever allocated it
//! until the receiver releases it with the matching release operation, see
//! [`owned`].

mod inbound;
mod outbound;
pub mod owned;

pub use inbound::{Handler, HandlerRegistry};
pub use outbound::{NativeBridge, NativeCallFn, NativeFreeFn};

use crate::errors::BridgeError;
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A single invocation across the native boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeCall {
    pub namespace: String,
    pub name: String,
    /// Serialized arguments, conventionally JSON
    pub args: String,
}

impl BridgeCall {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            args: args.into(),
        }
    }

    /// Serializes `args` as JSON.
    pub fn json<A: Serialize>(namespace: &str, name: &str, args: &A) -> Result<Self, BridgeError> {
        let args = serde_json::to_string(args).map_err(BridgeError::Encode)?;
        Ok(Self::new(namespace, name, args))
    }

    /// Namespace and name must be non-empty and NUL-free.
    pub fn validate(&self) -> Result<(), BridgeError> {
        for ident in [&self.namespace, &self.name] {
            if ident.is_empty() || ident.contains('\0') {
                return Err(BridgeError::InvalidIdentifier(ident.clone()));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for BridgeCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

lazy_static! {
    static ref NATIVE_BRIDGE: NativeBridge = NativeBridge::new();
    static ref HANDLERS: HandlerRegistry = HandlerRegistry::new();
}

/// The process-wide outbound bridge.
pub fn native_bridge() -> &'static NativeBridge {
    &NATIVE_BRIDGE
}

/// The process-wide inbound handler registry.
pub fn handlers() -> &'static HandlerRegistry {
    &HANDLERS
}

/// Replaces the outbound callback. `None` disables outbound calls.
pub fn set_native_call_fn(call_fn: Option<NativeCallFn>) {
    NATIVE_BRIDGE.set_call_fn(call_fn);
}

/// Replaces the function used to release host-allocated results.
pub fn set_native_free_fn(free_fn: Option<NativeFreeFn>) {
    NATIVE_BRIDGE.set_free_fn(free_fn);
}

pub fn native_bridge_is_ready() -> bool {
    NATIVE_BRIDGE.is_ready()
}

/// Calls into the host. Any failure, including a missing callback, yields `None`.
pub fn call_native(namespace: &str, name: &str, args: &str) -> Option<String> {
    let call = BridgeCall::new(namespace, name, args);
    match NATIVE_BRIDGE.call(&call) {
        Ok(result) => result,
        Err(e) => {
            log::debug!("native call {call}: {e}");
            None
        }
    }
}

/// Calls into the host with JSON-encoded arguments and decodes the JSON result.
pub fn call_native_json<A, R>(namespace: &str, name: &str, args: &A) -> Result<R, BridgeError>
where
    A: Serialize,
    R: DeserializeOwned,
{
    let call = BridgeCall::json(namespace, name, args)?;
    let result = NATIVE_BRIDGE.call(&call)?.ok_or_else(|| BridgeError::NoResult {
        namespace: call.namespace.clone(),
        name: call.name.clone(),
    })?;
    serde_json::from_str(&result).map_err(BridgeError::Decode)
}

/// Registers an inbound handler, replacing any handler with the same address.
pub fn register_handler<F>(namespace: &str, name: &str, handler: F) -> Result<bool, BridgeError>
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    HANDLERS.register(namespace, name, handler)
}

/// Registers an inbound handler with JSON-decoded arguments and a JSON-encoded result.
pub fn register_json_handler<A, R, F>(namespace: &str, name: &str, handler: F) -> Result<bool, BridgeError>
where
    A: DeserializeOwned,
    R: Serialize,
    F: Fn(A) -> R + Send + Sync + 'static,
{
    HANDLERS.register_json(namespace, name, handler)
}

pub fn unregister_handler(namespace: &str, name: &str) -> bool {
    HANDLERS.unregister(namespace, name)
}

/// Dispatches an inbound call. Unknown handlers and failures yield `None`.
pub fn dispatch(namespace: &str, name: &str, args: &str) -> Option<String> {
    let call = BridgeCall::new(namespace, name, args);
    match HANDLERS.dispatch(&call) {
        Ok(result) => result,
        Err(e) => {
            log::debug!("inbound call {call}: {e}");
            None
        }
    }
}
