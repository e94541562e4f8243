//! Damped spring physics.
//!
//! A spring pulls its value toward a target with a force proportional to the
//! distance (stiffness), slowed by a force proportional to its velocity
//! (damping). Retargeting keeps the current velocity, so interrupted motion
//! continues smoothly instead of restarting.

use crate::config::DEFAULT_SPRING_REST_THRESHOLD;
use crate::errors::EngineError;

/// Longest single integration step, in seconds
const MAX_SUBSTEP_SECS: f32 = 1.0 / 240.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
}

impl SpringConfig {
    pub fn new(stiffness: f32, damping: f32, mass: f32) -> Self {
        Self { stiffness, damping, mass }
    }

    /// Slow and soft, no visible overshoot
    pub fn gentle() -> Self {
        Self::new(120.0, 14.0, 1.0)
    }

    /// Bouncy, overshoots a few times
    pub fn wobbly() -> Self {
        Self::new(180.0, 12.0, 1.0)
    }

    pub fn stiff() -> Self {
        Self::new(210.0, 20.0, 1.0)
    }

    pub fn snappy() -> Self {
        Self::new(400.0, 30.0, 1.0)
    }

    /// Stiffness and mass must be positive, damping non-negative, all finite.
    pub fn validate(&self) -> Result<(), EngineError> {
        let finite = self.stiffness.is_finite() && self.damping.is_finite() && self.mass.is_finite();
        if !finite || self.stiffness <= 0.0 || self.mass <= 0.0 || self.damping < 0.0 {
            return Err(EngineError::InvalidSpring {
                stiffness: self.stiffness,
                damping: self.damping,
                mass: self.mass,
            });
        }
        Ok(())
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::stiff()
    }
}

#[derive(Clone, Debug)]
pub struct Spring {
    config: SpringConfig,
    value: f32,
    velocity: f32,
    target: f32,
    rest_threshold: f32,
}

impl Spring {
    /// Creates a spring resting at `initial`.
    pub fn new(config: SpringConfig, initial: f32) -> Self {
        Self {
            config,
            value: initial,
            velocity: 0.0,
            target: initial,
            rest_threshold: DEFAULT_SPRING_REST_THRESHOLD,
        }
    }

    pub fn with_rest_threshold(mut self, threshold: f32) -> Self {
        self.rest_threshold = threshold;
        self
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    #[inline]
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn config(&self) -> SpringConfig {
        self.config
    }

    /// Moves the target. The current velocity is kept.
    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    pub fn is_settled(&self) -> bool {
        (self.value - self.target).abs() < self.rest_threshold && self.velocity.abs() < self.rest_threshold
    }

    /// Advances the simulation by `dt_secs`, snapping to the target once settled.
    pub fn step(&mut self, dt_secs: f32) {
        if self.is_settled() {
            self.snap();
            return;
        }
        if !dt_secs.is_finite() || dt_secs <= 0.0 {
            return;
        }

        let substeps = (dt_secs / MAX_SUBSTEP_SECS).ceil().max(1.0) as u32;
        let h = dt_secs / substeps as f32;
        for _ in 0..substeps {
            self.integrate(h);
        }

        if self.is_settled() {
            self.snap();
        }
    }

    fn snap(&mut self) {
        self.value = self.target;
        self.velocity = 0.0;
    }

    fn acceleration(&self, x: f32, v: f32) -> f32 {
        let SpringConfig { stiffness, damping, mass } = self.config;
        (-stiffness * (x - self.target) - damping * v) / mass
    }

    // Classic RK4 over (position, velocity)
    fn integrate(&mut self, h: f32) {
        let (x, v) = (self.value, self.velocity);

        let (k1x, k1v) = (v, self.acceleration(x, v));
        let (k2x, k2v) = {
            let (x2, v2) = (x + k1x * h / 2.0, v + k1v * h / 2.0);
            (v2, self.acceleration(x2, v2))
        };
        let (k3x, k3v) = {
            let (x3, v3) = (x + k2x * h / 2.0, v + k2v * h / 2.0);
            (v3, self.acceleration(x3, v3))
        };
        let (k4x, k4v) = {
            let (x4, v4) = (x + k3x * h, v + k3v * h);
            (v4, self.acceleration(x4, v4))
        };

        self.value = x + h / 6.0 * (k1x + 2.0 * k2x + 2.0 * k3x + k4x);
        self.velocity = v + h / 6.0 * (k1v + 2.0 * k2v + 2.0 * k3v + k4v);
    }
}
