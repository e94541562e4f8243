//! Engine configuration.
//!
//! `EngineConfig` controls process-wide behavior of the render-context engine:
//! the animation step a single tick advances, when a spring counts as settled,
//! and the default log level used by [`crate::logging`].
//!
//! `EngineConfig` provides sensible defaults via [`Default`], a fluent
//! [`EngineConfig::builder()`] for customization with validation, and JSON
//! loading via [`EngineConfig::from_json`] so the host shell can configure the
//! engine without sharing a type system.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use blinc_engine::config::EngineConfig;
//! let cfg = EngineConfig::default();
//! assert_eq!(cfg.spring_rest_threshold, 0.01);
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use blinc_engine::config::EngineConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = EngineConfig::builder()
//!     .animation_step_ms(8.333)
//!     .spring_rest_threshold(0.001)
//!     .build()?; // returns Result<EngineConfig, ConfigError>
//! # Ok(()) }
//! ```
//!
//! ## Load from JSON
//! Missing fields fall back to their defaults.
//! ```rust
//! use blinc_engine::config::EngineConfig;
//! let cfg = EngineConfig::from_json(r#"{ "animation_step_ms": 8.0 }"#).unwrap();
//! assert_eq!(cfg.animation_step_ms, 8.0);
//! assert_eq!(cfg.spring_rest_threshold, 0.01);
//! ```

use lazy_static::lazy_static;
use serde::Deserialize;
use std::fmt;
use std::sync::{PoisonError, RwLock};

/// One display refresh at 60Hz.
pub const DEFAULT_ANIMATION_STEP_MS: f32 = 1000.0 / 60.0;

/// Distance and speed below which a spring snaps to its target.
pub const DEFAULT_SPRING_REST_THRESHOLD: f32 = 0.01;

/// Log verbosity selectable by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Maps the wire code used by `blinc_init_logging` (0 = off .. 5 = trace).
    pub fn from_code(code: i32) -> Option<LogLevel> {
        match code {
            0 => Some(LogLevel::Off),
            1 => Some(LogLevel::Error),
            2 => Some(LogLevel::Warn),
            3 => Some(LogLevel::Info),
            4 => Some(LogLevel::Debug),
            5 => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn as_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Milliseconds of animation time advanced by one `tick_animations` call
    pub animation_step_ms: f32,
    /// Springs closer than this to their target, and slower than this, are settled
    pub spring_rest_threshold: f32,
    /// Level used when the host initialises logging without an explicit level
    pub log_level: LogLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            animation_step_ms: DEFAULT_ANIMATION_STEP_MS,
            spring_rest_threshold: DEFAULT_SPRING_REST_THRESHOLD,
            log_level: LogLevel::Warn,
        }
    }
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json(json: &str) -> Result<EngineConfig, ConfigError> {
        let cfg: EngineConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        validate(&cfg)?;
        Ok(cfg)
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    inner: EngineConfig,
}

impl EngineConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut EngineConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn animation_step_ms(self, ms: f32) -> Self { self.map(|c| c.animation_step_ms = ms) }
    pub fn spring_rest_threshold(self, t: f32) -> Self { self.map(|c| c.spring_rest_threshold = t) }
    pub fn log_level(self, level: LogLevel) -> Self { self.map(|c| c.log_level = level) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut EngineConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidAnimationStep(f32),
    InvalidRestThreshold(f32),
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidAnimationStep(ms) =>
                write!(f, "animation_step_ms {ms} must be a positive, finite number"),
            ConfigError::InvalidRestThreshold(t) =>
                write!(f, "spring_rest_threshold {t} must be a positive, finite number"),
            ConfigError::Parse(msg) =>
                write!(f, "cannot parse configuration: {msg}"),
        }
    }
}
impl std::error::Error for ConfigError {}

fn validate(c: &EngineConfig) -> Result<(), ConfigError> {
    if !c.animation_step_ms.is_finite() || c.animation_step_ms <= 0.0 {
        return Err(ConfigError::InvalidAnimationStep(c.animation_step_ms));
    }
    if !c.spring_rest_threshold.is_finite() || c.spring_rest_threshold <= 0.0 {
        return Err(ConfigError::InvalidRestThreshold(c.spring_rest_threshold));
    }
    Ok(())
}

// ---------- Process-wide configuration ----------

lazy_static! {
    static ref ACTIVE_CONFIG: RwLock<EngineConfig> = RwLock::new(EngineConfig::default());
}

/// Returns a copy of the configuration new contexts are created with.
pub fn current() -> EngineConfig {
    ACTIVE_CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replaces the process-wide configuration. Existing contexts keep their settings.
pub fn install(config: EngineConfig) {
    log::info!("installing engine configuration: {:?}", config);
    *ACTIVE_CONFIG.write().unwrap_or_else(PoisonError::into_inner) = config;
}
