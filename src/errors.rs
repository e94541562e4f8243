use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid context handle")]
    InvalidHandle,

    #[error("Context is in use by another call")]
    ContextBusy,

    #[error("Invalid scale factor: {0}")]
    InvalidScaleFactor(f64),

    #[error("Unknown touch phase: {0}")]
    UnknownTouchPhase(i32),

    #[error("Invalid animation duration: {0}ms")]
    InvalidDuration(f32),

    #[error("Unknown easing code: {0}")]
    UnknownEasing(i32),

    #[error("Invalid spring (stiffness {stiffness}, damping {damping}, mass {mass})")]
    InvalidSpring { stiffness: f32, damping: f32, mass: f32 },

    #[error("Invalid timeline offset: {0}ms")]
    InvalidOffset(f32),

    #[error("Frame builder error: {0}")]
    FrameBuilder(#[source] anyhow::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Native bridge has no registered callback")]
    NotReady,

    #[error("Invalid bridge identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("String contains an interior NUL byte")]
    InteriorNul,

    #[error("Bridge string is not valid UTF-8")]
    InvalidUtf8,

    #[error("No handler registered for {namespace}.{name}")]
    NoHandler { namespace: String, name: String },

    #[error("No result returned for {namespace}.{name}")]
    NoResult { namespace: String, name: String },

    #[error("Payload encoding error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Payload decoding error: {0}")]
    Decode(#[source] serde_json::Error),
}
