//! Logical surface size and device scale factor.
//!
//! A [`SurfaceSize`] describes the drawable area of a render context in
//! device-independent units together with the scale factor that maps those
//! units onto physical pixels. Zero width or height is valid and describes a
//! hidden surface.
//!
//! # Examples
//!
//! ```
//! use blinc_engine::engine::SurfaceSize;
//!
//! let size = SurfaceSize::new(390, 844, 3.0).unwrap();
//! assert_eq!(size.physical(), (1170, 2532));
//! ```
//!
//! Scale factors must be positive and finite:
//! ```
//! use blinc_engine::engine::SurfaceSize;
//!
//! assert!(SurfaceSize::new(100, 100, 0.0).is_err());
//! ```

use crate::errors::EngineError;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SurfaceSize {
    /// Width in logical units.
    pub width: u32,

    /// Height in logical units.
    pub height: u32,

    /// Physical pixels per logical unit.
    pub scale_factor: f64,
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            scale_factor: 1.0,
        }
    }
}

/// Returns the scale factor when it is usable.
pub fn validate_scale(scale_factor: f64) -> Result<f64, EngineError> {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        Ok(scale_factor)
    } else {
        Err(EngineError::InvalidScaleFactor(scale_factor))
    }
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32, scale_factor: f64) -> Result<Self, EngineError> {
        Ok(Self {
            width,
            height,
            scale_factor: validate_scale(scale_factor)?,
        })
    }

    /// Size in physical pixels, rounded to the nearest pixel.
    pub fn physical(&self) -> (u32, u32) {
        (
            (self.width as f64 * self.scale_factor).round() as u32,
            (self.height as f64 * self.scale_factor).round() as u32,
        )
    }

    /// Returns `0.0` if `height` is `0` to avoid division by zero.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
