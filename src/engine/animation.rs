//! Animation tracker.
//!
//! Every render context owns one [`AnimationTracker`]. The host drives time:
//! each `tick` advances all in-flight motions by a fixed step (normally one
//! display refresh), `advance` by an explicit number of milliseconds. Nothing
//! here reads a clock.
//!
//! Three kinds of motion are tracked:
//!
//! - keyframe tweens ([`Animation`]) run for a fixed duration. A tween that
//!   completes during a tick stays readable, at its final value, until the
//!   following tick so the frame built right after the tick still sees it.
//!   The next tick prunes it.
//! - springs ([`Spring`]) are in flight until settled. They stay registered
//!   after settling so they can be retargeted.
//! - timelines ([`Timeline`]) are in flight while playing and stay registered
//!   so they can be restarted.

mod easing;
mod keyframe;
mod spring;
mod timeline;

pub use easing::Easing;
pub use keyframe::{Animation, Keyframe};
pub use spring::{Spring, SpringConfig};
pub use timeline::{Timeline, TimelineEntryId};

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Identifier of a motion within one tracker
    pub struct AnimationId;
}

// Relative slack absorbing rounding in accumulated steps
const END_TOLERANCE: f64 = 1e-9;

/// True once `elapsed_ms` has covered `duration_ms`.
fn reached_end(elapsed_ms: f64, duration_ms: f32) -> bool {
    elapsed_ms >= duration_ms as f64 * (1.0 - END_TOLERANCE)
}

/// Outcome of advancing the tracker
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickResult {
    /// Number of motions that were moved forward
    pub advanced: usize,
    /// Number of motions that came to rest during this advance
    pub finished: usize,
    /// Is any motion still in flight (another tick will be required)
    pub in_flight: bool,
}

#[derive(Debug)]
pub enum Motion {
    Tween(Animation),
    Spring(Spring),
    Timeline(Timeline),
}

impl Motion {
    fn is_active(&self) -> bool {
        match self {
            Motion::Tween(a) => !a.is_finished(),
            Motion::Spring(s) => !s.is_settled(),
            Motion::Timeline(t) => t.is_playing(),
        }
    }

    fn advance(&mut self, dt_ms: f32) {
        match self {
            Motion::Tween(a) => a.advance(dt_ms),
            Motion::Spring(s) => s.step(dt_ms / 1000.0),
            Motion::Timeline(t) => t.advance(dt_ms),
        }
    }

    /// Current scalar value. Timelines have one value per entry instead.
    fn value(&self) -> Option<f32> {
        match self {
            Motion::Tween(a) => Some(a.value()),
            Motion::Spring(s) => Some(s.value()),
            Motion::Timeline(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct AnimationTracker {
    motions: SlotMap<AnimationId, Motion>,
    step_ms: f32,
}

impl AnimationTracker {
    pub fn new(step_ms: f32) -> Self {
        Self {
            motions: SlotMap::with_key(),
            step_ms,
        }
    }

    #[inline]
    pub fn step_ms(&self) -> f32 {
        self.step_ms
    }

    /// Starts a keyframe tween.
    pub fn start(&mut self, animation: Animation) -> AnimationId {
        log::debug!("tween started ({}ms)", animation.duration_ms());
        self.motions.insert(Motion::Tween(animation))
    }

    pub fn start_spring(&mut self, spring: Spring) -> AnimationId {
        log::debug!("spring started {} -> {}", spring.value(), spring.target());
        self.motions.insert(Motion::Spring(spring))
    }

    /// Registers a timeline. It plays once started.
    pub fn add_timeline(&mut self, timeline: Timeline) -> AnimationId {
        self.motions.insert(Motion::Timeline(timeline))
    }

    pub fn cancel(&mut self, id: AnimationId) -> bool {
        self.motions.remove(id).is_some()
    }

    pub fn value(&self, id: AnimationId) -> Option<f32> {
        self.motions.get(id).and_then(Motion::value)
    }

    pub fn spring_mut(&mut self, id: AnimationId) -> Option<&mut Spring> {
        match self.motions.get_mut(id) {
            Some(Motion::Spring(s)) => Some(s),
            _ => None,
        }
    }

    pub fn timeline(&self, id: AnimationId) -> Option<&Timeline> {
        match self.motions.get(id) {
            Some(Motion::Timeline(t)) => Some(t),
            _ => None,
        }
    }

    pub fn timeline_mut(&mut self, id: AnimationId) -> Option<&mut Timeline> {
        match self.motions.get_mut(id) {
            Some(Motion::Timeline(t)) => Some(t),
            _ => None,
        }
    }

    /// True when at least one motion has not come to rest.
    pub fn in_flight(&self) -> bool {
        self.motions.values().any(Motion::is_active)
    }

    pub fn len(&self) -> usize {
        self.motions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }

    /// Advance by one scheduling step.
    pub fn tick(&mut self) -> TickResult {
        self.advance(self.step_ms)
    }

    /// Advance all in-flight motions by `dt_ms`.
    pub fn advance(&mut self, dt_ms: f32) -> TickResult {
        // Tweens that finished on an earlier tick have had their frame
        self.motions.retain(|_, m| !matches!(m, Motion::Tween(a) if a.is_finished()));

        if !dt_ms.is_finite() || dt_ms <= 0.0 {
            log::warn!("ignoring animation advance by {dt_ms}ms");
            return TickResult { in_flight: self.in_flight(), ..TickResult::default() };
        }

        let mut result = TickResult::default();
        for motion in self.motions.values_mut().filter(|m| m.is_active()) {
            motion.advance(dt_ms);
            result.advanced += 1;
            if !motion.is_active() {
                result.finished += 1;
            }
        }
        result.in_flight = self.in_flight();
        result
    }

    /// Drops every motion, finished or not.
    pub fn clear(&mut self) {
        self.motions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tween(duration_ms: f32) -> Animation {
        Animation::tween(0.0, 1.0, duration_ms, Easing::Linear).unwrap()
    }

    #[test]
    fn empty_tracker_tick_is_noop() {
        let mut t = AnimationTracker::new(16.0);
        let r = t.tick();
        assert_eq!(r, TickResult::default());
        assert!(!t.in_flight());
    }

    #[test]
    fn tick_count_matches_duration_over_step() {
        // D = 100, S = 16 => ceil(100 / 16) - 1 = 6 ticks report in flight
        let mut t = AnimationTracker::new(16.0);
        t.start(tween(100.0));

        let mut trues = 0;
        while t.tick().in_flight {
            trues += 1;
            assert!(trues < 100, "animation never terminated");
        }
        assert_eq!(trues, 6);
        assert!(!t.tick().in_flight);
    }

    #[test]
    fn exact_multiple_of_step() {
        // D = 100, S = 25 => 3 ticks in flight, the 4th finishes
        let mut t = AnimationTracker::new(25.0);
        t.start(tween(100.0));
        let results: Vec<bool> = (0..5).map(|_| t.tick().in_flight).collect();
        assert_eq!(results, vec![true, true, true, false, false]);
    }

    #[test]
    fn finished_animation_is_readable_until_next_tick() {
        let mut t = AnimationTracker::new(50.0);
        let id = t.start(tween(50.0));

        let r = t.tick();
        assert_eq!(r.finished, 1);
        assert!(!r.in_flight);
        assert_eq!(t.value(id), Some(1.0));

        t.tick();
        assert_eq!(t.value(id), None);
        assert!(t.is_empty());
    }

    #[test]
    fn cancel_removes_animation() {
        let mut t = AnimationTracker::new(16.0);
        let a = t.start(tween(100.0));
        let b = t.start(tween(100.0));
        assert_ne!(a, b);
        assert!(t.cancel(a));
        assert!(!t.cancel(a));
        assert_eq!(t.len(), 1);
        t.clear();
        assert!(!t.in_flight());
    }

    #[test]
    fn many_small_steps_do_not_drift() {
        // D = 100, S = 0.1 => ceil(D / S) - 1 = 999 ticks report in flight
        let mut t = AnimationTracker::new(0.1);
        t.start(tween(100.0));

        let mut trues = 0;
        while t.tick().in_flight {
            trues += 1;
            assert!(trues < 2000, "animation never terminated");
        }
        assert_eq!(trues, 999);
    }

    #[test]
    fn display_refresh_step_over_one_second() {
        let step = crate::config::DEFAULT_ANIMATION_STEP_MS;
        let expected = (1000.0_f64 / step as f64).ceil() as usize - 1;

        let mut t = AnimationTracker::new(step);
        t.start(tween(1000.0));
        let mut trues = 0;
        while t.tick().in_flight {
            trues += 1;
            assert!(trues < 1000, "animation never terminated");
        }
        assert_eq!(trues, expected);
    }

    #[test]
    fn spring_is_in_flight_until_settled() {
        let mut t = AnimationTracker::new(16.0);
        let mut spring = Spring::new(SpringConfig::stiff(), 0.0);
        spring.set_target(100.0);
        let id = t.start_spring(spring);
        assert!(t.in_flight());

        let mut ticks = 0;
        while t.tick().in_flight {
            ticks += 1;
            assert!(ticks < 1000, "spring never settled");
        }
        assert_eq!(t.value(id), Some(100.0));
        // settled springs stay registered but are no longer advanced
        assert_eq!(t.tick(), TickResult::default());
        assert_eq!(t.len(), 1);

        t.spring_mut(id).unwrap().set_target(0.0);
        assert!(t.in_flight());
    }

    #[test]
    fn timeline_is_in_flight_while_playing() {
        let mut t = AnimationTracker::new(25.0);
        let mut tl = Timeline::new();
        let entry = tl.add(0.0, 100.0, 0.0, 1.0, Easing::Linear).unwrap();
        let id = t.add_timeline(tl);
        assert!(!t.in_flight());
        assert_eq!(t.value(id), None);

        t.timeline_mut(id).unwrap().start();
        let results: Vec<bool> = (0..5).map(|_| t.tick().in_flight).collect();
        assert_eq!(results, vec![true, true, true, false, false]);
        assert_eq!(t.timeline(id).unwrap().value(entry), Some(1.0));
    }

    #[test]
    fn kinds_are_not_confused() {
        let mut t = AnimationTracker::new(16.0);
        let tween_id = t.start(tween(100.0));
        assert!(t.spring_mut(tween_id).is_none());
        assert!(t.timeline(tween_id).is_none());
    }

    #[test]
    fn invalid_advance_does_not_move_time() {
        let mut t = AnimationTracker::new(16.0);
        let id = t.start(tween(100.0));
        let r = t.advance(-5.0);
        assert_eq!(r.advanced, 0);
        assert!(r.in_flight);
        assert_eq!(t.value(id), Some(0.0));
    }
}
