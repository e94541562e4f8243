//! C ABI entry points.
//!
//! Every function here is safe to call with a null, stale or destroyed
//! context handle: it does nothing and returns a harmless default (`false`,
//! `0`, `NaN` for animation values, null for strings). Errors are logged and
//! absorbed, and panics are caught before they can unwind into the host.
//!
//! Strings returned to the host are owned by the host until it hands them back
//! to [`blinc_free_string`], exactly once.
//!
//! Context, animation and timeline entry handles cross the boundary as
//! `u64`. `0` is never handed out and always means "none".

use crate::bridge::{self, owned, NativeCallFn, NativeFreeFn};
use crate::config::{self, EngineConfig, LogLevel};
use crate::engine::animation::{Animation, AnimationId, Easing, Spring, SpringConfig, Timeline, TimelineEntryId};
use crate::errors::EngineError;
use crate::engine::input::TouchPhase;
use crate::engine::{self, ContextHandle, RenderContext};
use crate::logging;
use slotmap::{Key, KeyData};
use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

/// Context handle as seen by the host. `0` is the null handle.
pub type BlincContext = u64;

fn from_wire<K: Key>(raw: u64) -> K {
    if raw == 0 {
        K::null()
    } else {
        KeyData::from_ffi(raw).into()
    }
}

fn to_wire<K: Key>(key: K) -> u64 {
    key.data().as_ffi()
}

/// Runs `f`, turning a panic into `default`.
fn guard<R>(op: &str, default: R, f: impl FnOnce() -> R) -> R {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(_) => {
            log::error!("{op}: panic caught at the C boundary");
            default
        }
    }
}

/// Runs `f` against the context behind `handle`, or returns `default`.
fn on_context<R: Copy>(
    op: &str,
    handle: BlincContext,
    default: R,
    f: impl FnOnce(&mut RenderContext) -> R,
) -> R {
    guard(op, default, || match engine::with_context(from_wire(handle), f) {
        Ok(result) => result,
        Err(e @ EngineError::ContextBusy) => {
            log::warn!("{op}: {e} ({handle:#x})");
            default
        }
        Err(e) => {
            log::debug!("{op}: {e} ({handle:#x})");
            default
        }
    })
}

/// Borrows a host string. Null and non UTF-8 strings yield `None`.
unsafe fn host_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

// ---------- Lifecycle ----------

#[no_mangle]
pub extern "C" fn blinc_create_context(width: u32, height: u32, scale_factor: f64) -> BlincContext {
    guard("create_context", 0, || to_wire(engine::create_context(width, height, scale_factor)))
}

#[no_mangle]
pub extern "C" fn blinc_destroy_context(ctx: BlincContext) {
    guard("destroy_context", (), || {
        engine::destroy_context(from_wire::<ContextHandle>(ctx));
    })
}

// ---------- Frame loop ----------

#[no_mangle]
pub extern "C" fn blinc_needs_render(ctx: BlincContext) -> bool {
    on_context("needs_render", ctx, false, |c| c.needs_render())
}

#[no_mangle]
pub extern "C" fn blinc_tick_animations(ctx: BlincContext) -> bool {
    on_context("tick_animations", ctx, false, |c| c.tick_animations())
}

#[no_mangle]
pub extern "C" fn blinc_tick_animations_by(ctx: BlincContext, dt_ms: f32) -> bool {
    on_context("tick_animations_by", ctx, false, |c| c.tick_animations_by(dt_ms))
}

#[no_mangle]
pub extern "C" fn blinc_build_frame(ctx: BlincContext) {
    on_context("build_frame", ctx, (), |c| {
        if let Err(e) = c.build_frame() {
            log::error!("build_frame: {e}");
        }
    })
}

/// Safe to call from inside a frame build: the mark then applies after the build.
#[no_mangle]
pub extern "C" fn blinc_mark_dirty(ctx: BlincContext) {
    guard("mark_dirty", (), || {
        if let Err(e) = engine::mark_dirty(from_wire(ctx)) {
            log::debug!("mark_dirty: {e} ({ctx:#x})");
        }
    })
}

#[no_mangle]
pub extern "C" fn blinc_frame_count(ctx: BlincContext) -> u64 {
    on_context("frame_count", ctx, 0, |c| c.frame_count())
}

// ---------- Animations ----------

/// Starts a tween from `from` to `to`. Returns the animation id, or 0.
#[no_mangle]
pub extern "C" fn blinc_animate(ctx: BlincContext, from: f32, to: f32, duration_ms: f32, easing: i32) -> u64 {
    let animation = match Easing::try_from(easing).and_then(|e| Animation::tween(from, to, duration_ms, e)) {
        Ok(animation) => animation,
        Err(e) => {
            log::warn!("animate: {e}");
            return 0;
        }
    };
    on_context("animate", ctx, 0, move |c| to_wire(c.start_animation(animation)))
}

/// Value of a tween or spring. `NaN` for unknown ids and timelines.
#[no_mangle]
pub extern "C" fn blinc_animation_value(ctx: BlincContext, id: u64) -> f32 {
    on_context("animation_value", ctx, f32::NAN, |c| {
        c.animation_value(from_wire(id)).unwrap_or(f32::NAN)
    })
}

/// Cancels a tween, spring or timeline.
#[no_mangle]
pub extern "C" fn blinc_cancel_animation(ctx: BlincContext, id: u64) -> bool {
    on_context("cancel_animation", ctx, false, |c| c.cancel_animation(from_wire(id)))
}

/// Starts a spring at `from` moving toward `to`. Returns the animation id, or 0.
///
/// The spring stays registered after it settles so it can be retargeted with
/// [`blinc_set_spring_target`]; cancel it to release it.
#[no_mangle]
pub extern "C" fn blinc_animate_spring(
    ctx: BlincContext,
    from: f32,
    to: f32,
    stiffness: f32,
    damping: f32,
    mass: f32,
) -> u64 {
    let config = SpringConfig::new(stiffness, damping, mass);
    if let Err(e) = config.validate() {
        log::warn!("animate_spring: {e}");
        return 0;
    }
    let mut spring = Spring::new(config, from);
    spring.set_target(to);
    on_context("animate_spring", ctx, 0, move |c| to_wire(c.start_spring(spring)))
}

/// Moves a spring's target, keeping its velocity.
#[no_mangle]
pub extern "C" fn blinc_set_spring_target(ctx: BlincContext, id: u64, target: f32) -> bool {
    on_context("set_spring_target", ctx, false, |c| c.set_spring_target(from_wire(id), target))
}

/// Creates an empty, stopped timeline. Returns its id, or 0.
#[no_mangle]
pub extern "C" fn blinc_timeline_create(ctx: BlincContext) -> u64 {
    on_context("timeline_create", ctx, 0, |c| to_wire(c.add_timeline(Timeline::new())))
}

/// Adds a tween starting `offset_ms` after the timeline start. Returns the entry id, or 0.
#[no_mangle]
pub extern "C" fn blinc_timeline_add(
    ctx: BlincContext,
    timeline: u64,
    offset_ms: f32,
    duration_ms: f32,
    from: f32,
    to: f32,
    easing: i32,
) -> u64 {
    let easing = match Easing::try_from(easing) {
        Ok(easing) => easing,
        Err(e) => {
            log::warn!("timeline_add: {e}");
            return 0;
        }
    };
    on_context("timeline_add", ctx, 0, |c| {
        let Some(tl) = c.timeline_mut(from_wire::<AnimationId>(timeline)) else {
            log::debug!("timeline_add: unknown timeline {timeline:#x}");
            return 0;
        };
        match tl.add(offset_ms, duration_ms, from, to, easing) {
            Ok(entry) => to_wire(entry),
            Err(e) => {
                log::warn!("timeline_add: {e}");
                0
            }
        }
    })
}

/// Plays a timeline from the start. `loop_count` < 0 repeats forever, 0 plays once.
#[no_mangle]
pub extern "C" fn blinc_timeline_start(ctx: BlincContext, timeline: u64, loop_count: i32) -> bool {
    on_context("timeline_start", ctx, false, |c| c.play_timeline(from_wire(timeline), loop_count))
}

/// Current value of one timeline entry. `NaN` for unknown ids.
#[no_mangle]
pub extern "C" fn blinc_timeline_value(ctx: BlincContext, timeline: u64, entry: u64) -> f32 {
    on_context("timeline_value", ctx, f32::NAN, |c| {
        c.timeline_value(from_wire(timeline), from_wire::<TimelineEntryId>(entry))
            .unwrap_or(f32::NAN)
    })
}

// ---------- Size and layout ----------

#[no_mangle]
pub extern "C" fn blinc_update_size(ctx: BlincContext, width: u32, height: u32, scale_factor: f64) {
    on_context("update_size", ctx, (), |c| c.update_size(width, height, scale_factor))
}

#[no_mangle]
pub extern "C" fn blinc_get_width(ctx: BlincContext) -> f32 {
    on_context("get_width", ctx, 0.0, |c| c.size().width as f32)
}

#[no_mangle]
pub extern "C" fn blinc_get_height(ctx: BlincContext) -> f32 {
    on_context("get_height", ctx, 0.0, |c| c.size().height as f32)
}

#[no_mangle]
pub extern "C" fn blinc_get_scale_factor(ctx: BlincContext) -> f64 {
    on_context("get_scale_factor", ctx, 0.0, |c| c.size().scale_factor)
}

// ---------- Input ----------

/// `phase`: 0 = begin, 1 = move, 2 = end, 3 = cancel. Other values are ignored.
#[no_mangle]
pub extern "C" fn blinc_handle_touch(ctx: BlincContext, touch_id: u64, x: f32, y: f32, phase: i32) {
    let phase = match TouchPhase::try_from(phase) {
        Ok(phase) => phase,
        Err(e) => {
            log::warn!("handle_touch: {e}");
            return;
        }
    };
    on_context("handle_touch", ctx, (), |c| c.handle_touch(touch_id, x, y, phase))
}

#[no_mangle]
pub extern "C" fn blinc_set_focused(ctx: BlincContext, focused: bool) {
    on_context("set_focused", ctx, (), |c| c.set_focused(focused))
}

#[no_mangle]
pub extern "C" fn blinc_active_touch_count(ctx: BlincContext) -> u32 {
    on_context("active_touch_count", ctx, 0, |c| {
        u32::try_from(c.active_touch_count()).unwrap_or(u32::MAX)
    })
}

// ---------- Native bridge ----------

/// Registers the outbound callback. A null callback disables outbound calls.
#[no_mangle]
pub extern "C" fn blinc_set_native_call_fn(call_fn: Option<NativeCallFn>) {
    guard("set_native_call_fn", (), || bridge::set_native_call_fn(call_fn))
}

/// Registers the function that releases results returned by the outbound
/// callback. Without one, results must be allocated with [`blinc_alloc_string`].
#[no_mangle]
pub extern "C" fn blinc_set_native_free_fn(free_fn: Option<NativeFreeFn>) {
    guard("set_native_free_fn", (), || bridge::set_native_free_fn(free_fn))
}

#[no_mangle]
pub extern "C" fn blinc_native_bridge_is_ready() -> bool {
    guard("native_bridge_is_ready", false, bridge::native_bridge_is_ready)
}

/// Copies `s` into an engine-owned string. Release it with [`blinc_free_string`],
/// or return it from the outbound callback.
///
/// # Safety
///
/// `s` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn blinc_alloc_string(s: *const c_char) -> *mut c_char {
    let Some(s) = host_str(s) else {
        return ptr::null_mut();
    };
    guard("alloc_string", ptr::null_mut(), || {
        owned::ledger().alloc(s).unwrap_or_else(|e| {
            log::warn!("alloc_string: {e}");
            ptr::null_mut()
        })
    })
}

/// Releases a string returned by the engine. Null, unknown and already
/// released pointers are ignored.
#[no_mangle]
pub extern "C" fn blinc_free_string(s: *mut c_char) {
    guard("free_string", (), || {
        owned::ledger().release(s);
    })
}

/// Calls an engine handler. Returns an owned result or null for "no result".
///
/// # Safety
///
/// Every argument must be null or a valid NUL-terminated string. A null
/// `args` is treated as an empty payload.
#[no_mangle]
pub unsafe extern "C" fn blinc_bridge_call(
    ns: *const c_char,
    name: *const c_char,
    args: *const c_char,
) -> *mut c_char {
    let (Some(ns), Some(name)) = (host_str(ns), host_str(name)) else {
        log::debug!("bridge_call: missing or invalid identifier");
        return ptr::null_mut();
    };
    let args = host_str(args).unwrap_or("");

    guard("bridge_call", ptr::null_mut(), || {
        match bridge::dispatch(ns, name, args) {
            Some(result) => owned::ledger().alloc(&result).unwrap_or_else(|e| {
                log::warn!("bridge_call {ns}.{name}: {e}");
                ptr::null_mut()
            }),
            None => ptr::null_mut(),
        }
    })
}

/// # Safety
///
/// Both arguments must be null or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn blinc_bridge_has_handler(ns: *const c_char, name: *const c_char) -> bool {
    match (host_str(ns), host_str(name)) {
        (Some(ns), Some(name)) => guard("bridge_has_handler", false, || bridge::handlers().contains(ns, name)),
        _ => false,
    }
}

// ---------- Configuration and logging ----------

/// Installs a JSON engine configuration for contexts created afterwards.
///
/// # Safety
///
/// `json` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn blinc_configure(json: *const c_char) -> bool {
    let Some(json) = host_str(json) else {
        return false;
    };
    guard("configure", false, || match EngineConfig::from_json(json) {
        Ok(cfg) => {
            config::install(cfg);
            true
        }
        Err(e) => {
            log::warn!("configure: {e}");
            false
        }
    })
}

/// `level`: 0 = off, 1 = error, 2 = warn, 3 = info, 4 = debug, 5 = trace.
/// Negative values use the configured level.
#[no_mangle]
pub extern "C" fn blinc_init_logging(level: i32) -> bool {
    guard("init_logging", false, || {
        if level < 0 {
            return logging::init_from_config();
        }
        match LogLevel::from_code(level) {
            Some(level) => logging::init(level),
            None => false,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BEGIN: i32 = 0;
    const MOVE: i32 = 1;
    const END: i32 = 2;

    fn cstr(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    #[test]
    fn frame_loop_scenario() {
        let _lock = crate::test_lock();

        let ctx = blinc_create_context(390, 844, 3.0);
        assert_ne!(ctx, 0);
        assert!(blinc_needs_render(ctx));

        blinc_build_frame(ctx);
        assert!(!blinc_needs_render(ctx));
        assert_eq!(blinc_frame_count(ctx), 1);

        blinc_handle_touch(ctx, 1, 10.0, 10.0, BEGIN);
        assert!(blinc_needs_render(ctx));
        assert_eq!(blinc_active_touch_count(ctx), 1);

        blinc_destroy_context(ctx);
    }

    #[test]
    fn mark_dirty_is_idempotent() {
        let _lock = crate::test_lock();

        let ctx = blinc_create_context(100, 100, 1.0);
        blinc_build_frame(ctx);
        for _ in 0..3 {
            blinc_mark_dirty(ctx);
        }
        assert!(blinc_needs_render(ctx));
        blinc_build_frame(ctx);
        assert!(!blinc_needs_render(ctx));

        blinc_destroy_context(ctx);
    }

    #[test]
    fn late_move_after_end_changes_nothing() {
        let _lock = crate::test_lock();

        let ctx = blinc_create_context(100, 100, 2.0);
        blinc_handle_touch(ctx, 7, 5.0, 5.0, BEGIN);
        blinc_handle_touch(ctx, 7, 5.0, 5.0, END);
        blinc_build_frame(ctx);

        blinc_handle_touch(ctx, 7, 20.0, 20.0, MOVE);
        assert!(!blinc_needs_render(ctx));
        assert_eq!(blinc_active_touch_count(ctx), 0);

        blinc_destroy_context(ctx);
    }

    #[test]
    fn unknown_phase_is_ignored() {
        let _lock = crate::test_lock();

        let ctx = blinc_create_context(100, 100, 1.0);
        blinc_build_frame(ctx);
        blinc_handle_touch(ctx, 1, 0.0, 0.0, 42);
        assert!(!blinc_needs_render(ctx));

        blinc_destroy_context(ctx);
    }

    #[test]
    fn zero_size_is_accepted() {
        let _lock = crate::test_lock();

        let ctx = blinc_create_context(390, 844, 3.0);
        blinc_build_frame(ctx);

        blinc_update_size(ctx, 0, 0, 1.0);
        assert_eq!(blinc_get_width(ctx), 0.0);
        assert_eq!(blinc_get_height(ctx), 0.0);
        assert_eq!(blinc_get_scale_factor(ctx), 1.0);
        assert!(blinc_needs_render(ctx));

        blinc_destroy_context(ctx);
    }

    #[test]
    fn invalid_handles_return_defaults() {
        let _lock = crate::test_lock();

        let stale = blinc_create_context(10, 20, 1.0);
        blinc_destroy_context(stale);
        // destroying twice is harmless
        blinc_destroy_context(stale);

        for ctx in [0, stale, 0xDEAD_BEEF] {
            assert!(!blinc_needs_render(ctx));
            assert!(!blinc_tick_animations(ctx));
            blinc_build_frame(ctx);
            blinc_mark_dirty(ctx);
            blinc_update_size(ctx, 1, 1, 1.0);
            blinc_handle_touch(ctx, 1, 0.0, 0.0, BEGIN);
            blinc_set_focused(ctx, true);
            assert_eq!(blinc_get_width(ctx), 0.0);
            assert_eq!(blinc_get_height(ctx), 0.0);
            assert_eq!(blinc_get_scale_factor(ctx), 0.0);
            assert_eq!(blinc_frame_count(ctx), 0);
            assert_eq!(blinc_active_touch_count(ctx), 0);
            assert_eq!(blinc_animate(ctx, 0.0, 1.0, 100.0, 0), 0);
            assert!(blinc_animation_value(ctx, 1).is_nan());
            assert!(!blinc_cancel_animation(ctx, 1));
            assert_eq!(blinc_animate_spring(ctx, 0.0, 1.0, 100.0, 10.0, 1.0), 0);
            assert_eq!(blinc_timeline_create(ctx), 0);
            assert!(blinc_timeline_value(ctx, 1, 1).is_nan());
        }
    }

    #[test]
    fn animation_ticks_until_finished() {
        let _lock = crate::test_lock();

        let ctx = blinc_create_context(100, 100, 1.0);
        let id = blinc_animate(ctx, 0.0, 100.0, 100.0, 0);
        assert_ne!(id, 0);
        blinc_build_frame(ctx);
        assert!(blinc_needs_render(ctx));

        // D = 100, S = 25: ceil(D / S) - 1 = 3 ticks report more work
        let ticks: Vec<bool> = (0..5).map(|_| blinc_tick_animations_by(ctx, 25.0)).collect();
        assert_eq!(ticks, vec![true, true, true, false, false]);

        blinc_build_frame(ctx);
        assert!(!blinc_needs_render(ctx));
        assert!(blinc_animation_value(ctx, id).is_nan());

        blinc_destroy_context(ctx);
    }

    #[test]
    fn animate_rejects_bad_arguments() {
        let _lock = crate::test_lock();

        let ctx = blinc_create_context(100, 100, 1.0);
        assert_eq!(blinc_animate(ctx, 0.0, 1.0, 100.0, 99), 0);
        assert_eq!(blinc_animate(ctx, 0.0, 1.0, -5.0, 0), 0);

        let id = blinc_animate(ctx, 0.0, 1.0, 100.0, 3);
        assert!(blinc_cancel_animation(ctx, id));
        assert!(!blinc_cancel_animation(ctx, id));

        blinc_destroy_context(ctx);
    }

    #[test]
    fn configure_applies_to_new_contexts() {
        let _lock = crate::test_lock();

        unsafe {
            assert!(!blinc_configure(ptr::null()));
            assert!(!blinc_configure(cstr("{ not json").as_ptr()));
            assert!(!blinc_configure(cstr(r#"{"spring_rest_threshold":0}"#).as_ptr()));
        }
        assert_eq!(config::current(), EngineConfig::default());

        assert!(unsafe { blinc_configure(cstr(r#"{"animation_step_ms":25.0}"#).as_ptr()) });

        let live = engine::live_contexts();
        let contexts: Vec<BlincContext> = (0..20).map(|_| blinc_create_context(10, 10, 1.0)).collect();
        assert!(contexts.iter().all(|&c| c != 0));
        let mut distinct = contexts.clone();
        distinct.sort_unstable();
        distinct.dedup();
        assert_eq!(distinct.len(), contexts.len());
        assert_eq!(engine::live_contexts(), live + 20);

        let ctx = contexts[19];
        assert_ne!(blinc_animate(ctx, 0.0, 1.0, 100.0, 0), 0);
        let ticks: Vec<bool> = (0..4).map(|_| blinc_tick_animations(ctx)).collect();
        assert_eq!(ticks, vec![true, true, true, false]);

        for ctx in contexts {
            blinc_destroy_context(ctx);
        }
        assert_eq!(engine::live_contexts(), live);
        config::install(EngineConfig::default());
    }

    #[test]
    fn eleven_concurrent_touches_are_tracked() {
        let _lock = crate::test_lock();

        let ctx = blinc_create_context(100, 100, 1.0);
        for id in 0..11 {
            blinc_handle_touch(ctx, id, id as f32, 0.0, BEGIN);
        }
        assert_eq!(blinc_active_touch_count(ctx), 11);

        blinc_handle_touch(ctx, 10, 0.0, 0.0, END);
        assert_eq!(blinc_active_touch_count(ctx), 10);

        blinc_destroy_context(ctx);
    }

    #[test]
    fn spring_settles_and_stops_ticking() {
        let _lock = crate::test_lock();

        let ctx = blinc_create_context(100, 100, 1.0);
        assert_eq!(blinc_animate_spring(ctx, 0.0, 1.0, 0.0, 10.0, 1.0), 0);
        assert_eq!(blinc_animate_spring(ctx, 0.0, 1.0, 100.0, 10.0, -1.0), 0);

        let id = blinc_animate_spring(ctx, 0.0, 100.0, 210.0, 20.0, 1.0);
        assert_ne!(id, 0);

        let mut ticks = 0;
        while blinc_tick_animations(ctx) {
            ticks += 1;
            assert!(ticks < 1000, "spring never settled");
        }
        assert_eq!(blinc_animation_value(ctx, id), 100.0);
        blinc_build_frame(ctx);
        assert!(!blinc_needs_render(ctx));

        assert!(blinc_set_spring_target(ctx, id, 50.0));
        assert!(blinc_needs_render(ctx));
        assert!(blinc_tick_animations(ctx));

        assert!(blinc_cancel_animation(ctx, id));
        assert!(!blinc_set_spring_target(ctx, id, 0.0));
        assert!(blinc_animation_value(ctx, id).is_nan());

        blinc_destroy_context(ctx);
    }

    #[test]
    fn timeline_entries_follow_their_offsets() {
        let _lock = crate::test_lock();

        let ctx = blinc_create_context(100, 100, 1.0);
        let tl = blinc_timeline_create(ctx);
        assert_ne!(tl, 0);
        let a = blinc_timeline_add(ctx, tl, 0.0, 100.0, 0.0, 10.0, 0);
        let b = blinc_timeline_add(ctx, tl, 50.0, 100.0, 0.0, 10.0, 0);
        assert_ne!(a, 0);
        assert_ne!(b, 0);
        assert_eq!(blinc_timeline_add(ctx, tl, 0.0, -1.0, 0.0, 1.0, 0), 0);
        assert_eq!(blinc_timeline_add(ctx, tl, 0.0, 10.0, 0.0, 1.0, 99), 0);
        assert_eq!(blinc_timeline_add(ctx, 0, 0.0, 10.0, 0.0, 1.0, 0), 0);

        // a stopped timeline does not keep the context rendering
        blinc_build_frame(ctx);
        assert!(!blinc_tick_animations(ctx));

        assert!(blinc_timeline_start(ctx, tl, 0));
        assert!(blinc_tick_animations_by(ctx, 100.0));
        assert_eq!(blinc_timeline_value(ctx, tl, a), 10.0);
        assert!((blinc_timeline_value(ctx, tl, b) - 5.0).abs() < 1e-4);

        assert!(!blinc_tick_animations_by(ctx, 50.0));
        assert_eq!(blinc_timeline_value(ctx, tl, b), 10.0);
        assert!(blinc_timeline_value(ctx, tl, 0).is_nan());
        assert!(blinc_animation_value(ctx, tl).is_nan());

        assert!(blinc_cancel_animation(ctx, tl));
        assert!(!blinc_timeline_start(ctx, tl, 1));

        blinc_destroy_context(ctx);
    }

    #[test]
    fn free_string_releases_once() {
        let _lock = crate::test_lock();

        let s = cstr("payload");
        let owned_ptr = unsafe { blinc_alloc_string(s.as_ptr()) };
        assert!(owned::ledger().is_live(owned_ptr));

        blinc_free_string(owned_ptr);
        assert!(!owned::ledger().is_live(owned_ptr));
        // a second release is ignored rather than freeing twice
        blinc_free_string(owned_ptr);
        blinc_free_string(ptr::null_mut());
    }

    #[test]
    fn inbound_call_returns_owned_result() {
        let _lock = crate::test_lock();

        bridge::register_handler("test.ffi", "reverse", |args| Some(args.chars().rev().collect())).unwrap();
        let (ns, name, args) = (cstr("test.ffi"), cstr("reverse"), cstr("abc"));

        unsafe {
            assert!(blinc_bridge_has_handler(ns.as_ptr(), name.as_ptr()));

            let result = blinc_bridge_call(ns.as_ptr(), name.as_ptr(), args.as_ptr());
            assert!(!result.is_null());
            assert_eq!(CStr::from_ptr(result).to_str().unwrap(), "cba");

            blinc_free_string(result);
            assert!(!owned::ledger().is_live(result));

            let missing = cstr("missing");
            assert!(blinc_bridge_call(ns.as_ptr(), missing.as_ptr(), args.as_ptr()).is_null());
            assert!(blinc_bridge_call(cstr("").as_ptr(), name.as_ptr(), args.as_ptr()).is_null());
            assert!(blinc_bridge_call(ptr::null(), name.as_ptr(), args.as_ptr()).is_null());
        }

        bridge::unregister_handler("test.ffi", "reverse");
    }

    static LAST_HOST_RESULT: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn host_echo(_ns: *const c_char, _name: *const c_char, args: *const c_char) -> *mut c_char {
        let result = blinc_alloc_string(args);
        LAST_HOST_RESULT.store(result as usize, Ordering::SeqCst);
        result
    }

    #[test]
    fn outbound_call_through_registered_host() {
        let _lock = crate::test_lock();

        blinc_set_native_call_fn(None);
        assert!(!blinc_native_bridge_is_ready());
        assert_eq!(bridge::call_native("app", "ping", "{}"), None);

        blinc_set_native_call_fn(Some(host_echo));
        assert!(blinc_native_bridge_is_ready());

        let reply: serde_json::Value = bridge::call_native_json("app", "echo", &serde_json::json!({ "n": 1 })).unwrap();
        assert_eq!(reply["n"], 1);

        let host_ptr = LAST_HOST_RESULT.load(Ordering::SeqCst) as *const c_char;
        assert!(!owned::ledger().is_live(host_ptr));

        blinc_set_native_call_fn(None);
        assert!(!blinc_native_bridge_is_ready());
    }

    #[test]
    fn guard_absorbs_panics() {
        assert_eq!(guard("test", 7, || panic!("boom")), 7);
    }
}
