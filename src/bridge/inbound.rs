use crate::bridge::BridgeCall;
use crate::errors::BridgeError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// An inbound handler. Receives the serialized arguments and returns a
/// serialized result, or `None` for "no result".
pub type Handler = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

type HandlerKey = (String, String);

/// Handlers reachable from the host, keyed by namespace and name.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: RwLock<HashMap<HandlerKey, Handler>>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<String> = self.read().keys().map(|(ns, name)| format!("{ns}.{name}")).collect();
        keys.sort();
        f.debug_struct("HandlerRegistry").field("handlers", &keys).finish()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<HandlerKey, Handler>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<HandlerKey, Handler>> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `handler`. Returns true when it replaced an existing one.
    pub fn register<F>(&self, namespace: &str, name: &str, handler: F) -> Result<bool, BridgeError>
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        BridgeCall::new(namespace, name, "").validate()?;

        let replaced = self
            .write()
            .insert((namespace.to_owned(), name.to_owned()), Arc::new(handler))
            .is_some();
        log::debug!("registered handler {namespace}.{name}{}", if replaced { " (replaced)" } else { "" });
        Ok(replaced)
    }

    /// Registers a handler that takes JSON arguments and returns a JSON result.
    ///
    /// Arguments that fail to decode produce no result and are logged.
    pub fn register_json<A, R, F>(&self, namespace: &str, name: &str, handler: F) -> Result<bool, BridgeError>
    where
        A: DeserializeOwned,
        R: Serialize,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let address = format!("{namespace}.{name}");
        self.register(namespace, name, move |args: &str| {
            let args: A = match serde_json::from_str(args) {
                Ok(args) => args,
                Err(e) => {
                    log::warn!("{address}: {}", BridgeError::Decode(e));
                    return None;
                }
            };
            match serde_json::to_string(&handler(args)) {
                Ok(result) => Some(result),
                Err(e) => {
                    log::warn!("{address}: {}", BridgeError::Encode(e));
                    None
                }
            }
        })
    }

    pub fn unregister(&self, namespace: &str, name: &str) -> bool {
        self.write().remove(&(namespace.to_owned(), name.to_owned())).is_some()
    }

    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.read().contains_key(&(namespace.to_owned(), name.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs the handler addressed by `call`.
    ///
    /// The registry lock is released before the handler runs, so handlers may
    /// register or dispatch further calls. A panicking handler produces no
    /// result.
    pub fn dispatch(&self, call: &BridgeCall) -> Result<Option<String>, BridgeError> {
        call.validate()?;

        let handler = self
            .read()
            .get(&(call.namespace.clone(), call.name.clone()))
            .cloned()
            .ok_or_else(|| BridgeError::NoHandler {
                namespace: call.namespace.clone(),
                name: call.name.clone(),
            })?;

        log::trace!("inbound {call} ({} bytes)", call.args.len());
        match catch_unwind(AssertUnwindSafe(|| handler(&call.args))) {
            Ok(result) => Ok(result),
            Err(_) => {
                log::error!("handler {call} panicked");
                Ok(None)
            }
        }
    }
}
