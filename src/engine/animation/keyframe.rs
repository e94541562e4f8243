use crate::engine::animation::{reached_end, Easing};
use crate::errors::EngineError;

/// A single stop on a keyframe track
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    /// Position on the track (0.0 to 1.0)
    pub time: f32,
    /// Value reached at this stop
    pub value: f32,
    /// Curve used while travelling *into* this stop
    pub easing: Easing,
}

impl Keyframe {
    pub fn new(time: f32, value: f32, easing: Easing) -> Self {
        Self { time: time.clamp(0.0, 1.0), value, easing }
    }
}

/// A time-driven animation over a keyframe track.
///
/// Time only moves when the tracker advances it; there is no wall clock.
#[derive(Clone, Debug)]
pub struct Animation {
    keyframes: Vec<Keyframe>,
    duration_ms: f32,
    /// Accumulated in f64 so many small steps do not drift past the end
    elapsed_ms: f64,
}

impl Animation {
    /// Creates a keyframe animation. Keyframes are sorted by time.
    pub fn keyframes(duration_ms: f32, mut keyframes: Vec<Keyframe>) -> Result<Self, EngineError> {
        if !duration_ms.is_finite() || duration_ms <= 0.0 {
            return Err(EngineError::InvalidDuration(duration_ms));
        }
        keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));
        Ok(Self { keyframes, duration_ms, elapsed_ms: 0.0 })
    }

    /// Creates a two-stop animation from `from` to `to`.
    pub fn tween(from: f32, to: f32, duration_ms: f32, easing: Easing) -> Result<Self, EngineError> {
        Self::keyframes(
            duration_ms,
            vec![Keyframe::new(0.0, from, Easing::Linear), Keyframe::new(1.0, to, easing)],
        )
    }

    pub fn duration_ms(&self) -> f32 {
        self.duration_ms
    }

    pub fn progress(&self) -> f32 {
        if self.is_finished() {
            return 1.0;
        }
        (self.elapsed_ms / self.duration_ms as f64).clamp(0.0, 1.0) as f32
    }

    pub fn is_finished(&self) -> bool {
        reached_end(self.elapsed_ms, self.duration_ms)
    }

    /// Moves the animation forward, stopping at its end.
    pub fn advance(&mut self, dt_ms: f32) {
        self.elapsed_ms = (self.elapsed_ms + dt_ms as f64).min(self.duration_ms as f64);
    }

    /// Current interpolated value
    pub fn value(&self) -> f32 {
        let (first, last) = match (self.keyframes.first(), self.keyframes.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return 0.0,
        };

        let progress = self.progress();
        if progress <= first.time {
            return first.value;
        }
        if progress >= last.time {
            return last.value;
        }

        // First stop at or past the current progress, and the one before it
        let next_idx = self
            .keyframes
            .iter()
            .position(|kf| kf.time >= progress)
            .unwrap_or(self.keyframes.len() - 1);
        let next = &self.keyframes[next_idx];
        let prev = &self.keyframes[next_idx.saturating_sub(1)];

        let span = next.time - prev.time;
        if span <= f32::EPSILON {
            return next.value;
        }

        let local = next.easing.apply((progress - prev.time) / span);
        prev.value + (next.value - prev.value) * local
    }
}
