//! Several tweens on one clock, each starting at its own offset.

use crate::engine::animation::{reached_end, Easing};
use crate::errors::EngineError;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct TimelineEntryId;
}

#[derive(Clone, Debug)]
struct TimelineEntry {
    /// Start relative to the timeline start
    offset_ms: f32,
    duration_ms: f32,
    from: f32,
    to: f32,
    easing: Easing,
}

impl TimelineEntry {
    fn value_at(&self, time_ms: f64) -> f32 {
        let local = time_ms - self.offset_ms as f64;
        if local <= 0.0 {
            return self.from;
        }
        if reached_end(local, self.duration_ms) {
            return self.to;
        }
        let t = self.easing.apply((local / self.duration_ms as f64) as f32);
        self.from + (self.to - self.from) * t
    }
}

/// A timeline is created stopped; entries are added and then it is started.
#[derive(Clone, Debug)]
pub struct Timeline {
    entries: SlotMap<TimelineEntryId, TimelineEntry>,
    current_ms: f64,
    duration_ms: f32,
    playing: bool,
    /// Number of plays, -1 for endless
    loop_count: i32,
    current_loop: i32,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    pub fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            current_ms: 0.0,
            duration_ms: 0.0,
            playing: false,
            loop_count: 1,
            current_loop: 0,
        }
    }

    /// Adds a tween from `from` to `to` starting `offset_ms` after the timeline start.
    pub fn add(
        &mut self,
        offset_ms: f32,
        duration_ms: f32,
        from: f32,
        to: f32,
        easing: Easing,
    ) -> Result<TimelineEntryId, EngineError> {
        if !offset_ms.is_finite() {
            return Err(EngineError::InvalidOffset(offset_ms));
        }
        if !duration_ms.is_finite() || duration_ms <= 0.0 {
            return Err(EngineError::InvalidDuration(duration_ms));
        }

        let id = self.entries.insert(TimelineEntry { offset_ms, duration_ms, from, to, easing });
        self.duration_ms = self.duration_ms.max(offset_ms.max(0.0) + duration_ms);
        Ok(id)
    }

    /// Sets how many times the timeline plays. -1 repeats forever; 0 is treated as 1.
    pub fn set_loop(&mut self, count: i32) {
        self.loop_count = if count < 0 { -1 } else { count.max(1) };
    }

    /// Plays from the beginning.
    pub fn start(&mut self) {
        self.current_ms = 0.0;
        self.current_loop = 0;
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Length of one play
    pub fn duration_ms(&self) -> f32 {
        self.duration_ms
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn advance(&mut self, dt_ms: f32) {
        if !self.playing {
            return;
        }

        self.current_ms += dt_ms as f64;
        if !reached_end(self.current_ms, self.duration_ms) {
            return;
        }

        let endless = self.loop_count < 0;
        if self.duration_ms > 0.0 && (endless || self.current_loop < self.loop_count - 1) {
            self.current_ms = (self.current_ms - self.duration_ms as f64).max(0.0);
            self.current_loop = self.current_loop.saturating_add(1);
        } else {
            self.current_ms = self.duration_ms as f64;
            self.playing = false;
        }
    }

    /// Value of one entry at the current time
    pub fn value(&self, id: TimelineEntryId) -> Option<f32> {
        self.entries.get(id).map(|entry| entry.value_at(self.current_ms))
    }
}
