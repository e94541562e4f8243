use crate::engine::animation::{Animation, AnimationId, AnimationTracker, Spring, TickResult, Timeline, TimelineEntryId};
use crate::engine::input::{InputTracker, TouchPhase, TouchSession};
use crate::engine::size::{validate_scale, SurfaceSize};
use crate::engine::DirtyFlags;
use crate::errors::EngineError;
use crate::render::backends::null::NullFrameBuilder;
use crate::render::{FrameBuilder, FrameInput};

/// Settings a context copies from the engine configuration at creation time.
#[derive(Debug, Clone, Copy)]
pub struct ContextSettings {
    pub animation_step_ms: f32,
    pub spring_rest_threshold: f32,
}

/// RenderContext dedicated to a single host surface
///
/// The context tracks everything that decides whether a new frame has to be
/// built: dirty reasons, animations in flight, the surface size, focus and
/// active touches. Frame construction itself is delegated to a
/// [`FrameBuilder`].
pub struct RenderContext {
    /// Logical size and scale factor
    size: SurfaceSize,
    /// Why the last built frame is stale (empty when it is current)
    dirty: DirtyFlags,
    /// Time-driven animations
    animations: AnimationTracker,
    /// Touch sessions and focus
    input: InputTracker,
    /// Rest threshold handed to springs started on this context
    spring_rest_threshold: f32,
    /// Number of frames successfully built
    frame_count: u64,
    /// Builds frames when the scheduler decides one is needed
    builder: Box<dyn FrameBuilder>,
}

impl std::fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderContext")
            .field("size", &self.size)
            .field("dirty", &self.dirty)
            .field("frame_count", &self.frame_count)
            .field("animations", &self.animations.len())
            .field("touches", &self.input.active_count())
            .field("builder", &self.builder.name())
            .finish()
    }
}

impl RenderContext {
    /// Creates a new context. Contexts start dirty so the first frame is always built.
    pub(crate) fn new(size: SurfaceSize, settings: ContextSettings) -> RenderContext {
        Self {
            size,
            dirty: DirtyFlags::INITIAL,
            animations: AnimationTracker::new(settings.animation_step_ms),
            input: InputTracker::new(),
            spring_rest_threshold: settings.spring_rest_threshold,
            frame_count: 0,
            builder: Box::new(NullFrameBuilder::new()),
        }
    }

    /// Installs the frame builder used by subsequent [`build_frame`](Self::build_frame) calls.
    pub fn set_frame_builder(&mut self, builder: Box<dyn FrameBuilder>) {
        log::debug!("context: frame builder {} -> {}", self.builder.name(), builder.name());
        self.builder.release();
        self.builder = builder;
        self.dirty.insert(DirtyFlags::EXTERNAL);
    }

    // ---------- Frame scheduling ----------

    /// True when the dirty flags are set or an animation is in flight.
    pub fn needs_render(&self) -> bool {
        !self.dirty.is_empty() || self.animations.in_flight()
    }

    #[inline]
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty.insert(DirtyFlags::EXTERNAL);
    }

    /// Builds the frame and clears all dirty flags.
    ///
    /// When the builder fails the flags are left untouched so the next frame retries.
    pub fn build_frame(&mut self) -> Result<u64, EngineError> {
        let touches = self.input.sessions();
        let frame = FrameInput {
            frame_number: self.frame_count + 1,
            size: self.size,
            focused: self.input.focused(),
            touches: &touches,
            dirty: self.dirty,
            animations: &self.animations,
        };

        self.builder.build(&frame).map_err(EngineError::FrameBuilder)?;

        self.frame_count += 1;
        self.dirty = DirtyFlags::empty();
        Ok(self.frame_count)
    }

    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    // ---------- Animations ----------

    pub fn start_animation(&mut self, animation: Animation) -> AnimationId {
        self.dirty.insert(DirtyFlags::ANIMATION);
        self.animations.start(animation)
    }

    pub fn cancel_animation(&mut self, id: AnimationId) -> bool {
        let removed = self.animations.cancel(id);
        if removed {
            self.dirty.insert(DirtyFlags::ANIMATION);
        }
        removed
    }

    /// Current value of a tween or spring
    pub fn animation_value(&self, id: AnimationId) -> Option<f32> {
        self.animations.value(id)
    }

    /// Starts a spring. Its rest threshold is the one configured for this context.
    pub fn start_spring(&mut self, spring: Spring) -> AnimationId {
        self.dirty.insert(DirtyFlags::ANIMATION);
        self.animations.start_spring(spring.with_rest_threshold(self.spring_rest_threshold))
    }

    /// Moves a spring's target. False when `id` is not a spring on this context.
    pub fn set_spring_target(&mut self, id: AnimationId, target: f32) -> bool {
        match self.animations.spring_mut(id) {
            Some(spring) => {
                spring.set_target(target);
                self.dirty.insert(DirtyFlags::ANIMATION);
                true
            }
            None => false,
        }
    }

    /// Registers a stopped timeline.
    pub fn add_timeline(&mut self, timeline: Timeline) -> AnimationId {
        self.animations.add_timeline(timeline)
    }

    pub fn timeline_mut(&mut self, id: AnimationId) -> Option<&mut Timeline> {
        self.animations.timeline_mut(id)
    }

    /// Plays a timeline from the start, `loop_count` times (-1 forever).
    pub fn play_timeline(&mut self, id: AnimationId, loop_count: i32) -> bool {
        match self.animations.timeline_mut(id) {
            Some(timeline) => {
                timeline.set_loop(loop_count);
                timeline.start();
                self.dirty.insert(DirtyFlags::ANIMATION);
                true
            }
            None => false,
        }
    }

    pub fn timeline_value(&self, id: AnimationId, entry: TimelineEntryId) -> Option<f32> {
        self.animations.timeline(id).and_then(|t| t.value(entry))
    }

    /// Advances animations by one configured step. Returns true when another tick is needed.
    pub fn tick_animations(&mut self) -> bool {
        let step = self.animations.step_ms();
        self.tick_animations_by(step)
    }

    /// Advances animations by `dt_ms`. Returns true when another tick is needed.
    pub fn tick_animations_by(&mut self, dt_ms: f32) -> bool {
        let TickResult { advanced, finished, in_flight } = self.animations.advance(dt_ms);
        if advanced > 0 {
            self.dirty.insert(DirtyFlags::ANIMATION);
        }
        if finished > 0 {
            log::debug!("context: {finished} animation(s) finished");
        }
        in_flight
    }

    pub fn animations(&self) -> &AnimationTracker {
        &self.animations
    }

    // ---------- Size ----------

    #[inline]
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Replaces the logical size and scale factor. Always invalidates the frame.
    ///
    /// An unusable scale factor keeps the previous one; the size is still applied.
    pub fn update_size(&mut self, width: u32, height: u32, scale_factor: f64) {
        let scale_factor = match validate_scale(scale_factor) {
            Ok(scale) => scale,
            Err(e) => {
                log::warn!("context: {e}, keeping scale {}", self.size.scale_factor);
                self.size.scale_factor
            }
        };

        self.size = SurfaceSize { width, height, scale_factor };
        self.dirty.insert(DirtyFlags::SIZE);
    }

    // ---------- Input ----------

    /// Applies a touch event, marking the context dirty when visible state changed.
    pub fn handle_touch(&mut self, id: u64, x: f32, y: f32, phase: TouchPhase) {
        if self.input.handle_touch(id, x, y, phase) {
            self.dirty.insert(DirtyFlags::INPUT);
        }
    }

    pub fn set_focused(&mut self, focused: bool) {
        if self.input.set_focused(focused) {
            self.dirty.insert(DirtyFlags::FOCUS);
        }
    }

    #[inline]
    pub fn focused(&self) -> bool {
        self.input.focused()
    }

    pub fn touch(&self, id: u64) -> Option<&TouchSession> {
        self.input.session(id)
    }

    pub fn active_touch_count(&self) -> usize {
        self.input.active_count()
    }
}

impl Drop for RenderContext {
    fn drop(&mut self) {
        log::trace!(
            "context: releasing {} animation(s), {} touch(es)",
            self.animations.len(),
            self.input.active_count()
        );
        self.animations.clear();
        self.input.clear();
        self.builder.release();
    }
}
