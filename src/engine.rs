//! The engine: a global clock driving a registry of animations.

use log::trace;
use slotmap::{new_key_type, SlotMap};

use crate::animation::{Animation, AnimationCallbacks};
use crate::config::EngineConfig;
use crate::errors::{EngineError, EngineResult};
use crate::interpolators::ExternalInterpolator;
use crate::types::{ExternalValue, Time, ValueKind};

new_key_type! {
    /// Stable handle to an animation registered with an [`Engine`].
    pub struct AnimationHandle;
}

/// Drives a global clock and fans each tick out to every registered
/// animation in registration order.
pub struct Engine {
    animations: SlotMap<AnimationHandle, Animation>,
    order: Vec<AnimationHandle>,
    fps: u32,
    tpf: Time,
    frame: i64,
    curr: Time,
}

impl Engine {
    /// Creates an engine with the default configuration (30 fps).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an engine with an explicit configuration.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        let tpf = Self::tpf_for(config.fps);
        Self {
            animations: SlotMap::with_capacity_and_key(config.capacity_hint),
            order: Vec::with_capacity(config.capacity_hint),
            fps: config.fps,
            tpf,
            frame: 0,
            curr: Time::ZERO,
        }
    }

    fn tpf_for(fps: u32) -> Time {
        Time::from_nanos(Time::SECOND.as_nanos() / i64::from(fps))
    }

    /// Sets the tick rate and recomputes the derived time-per-frame.
    pub fn set_fps(&mut self, fps: u32) {
        self.fps = fps;
        self.tpf = Self::tpf_for(fps);
    }

    /// Current tick rate.
    #[must_use]
    pub const fn fps(&self) -> u32 {
        self.fps
    }

    /// Current time-per-frame, derived from `fps`.
    #[must_use]
    pub const fn tpf(&self) -> Time {
        self.tpf
    }

    /// Current frame counter.
    #[must_use]
    pub const fn frame(&self) -> i64 {
        self.frame
    }

    /// Advances the clock by one frame and processes every animation.
    pub fn tick(&mut self) {
        self.frame += 1;
        self.curr += self.tpf;
        self.process_all();
    }

    /// Jumps directly to a frame number and processes every animation.
    pub fn seek_frame(&mut self, frame: i64) {
        self.frame = frame;
        self.curr = self.tpf * frame;
        self.process_all();
    }

    /// Jumps directly to a global time and processes every animation.
    pub fn seek_time(&mut self, t: Time) {
        self.curr = t;
        self.process_all();
    }

    /// The engine's current global time.
    #[must_use]
    pub const fn get_time(&self) -> Time {
        self.curr
    }

    /// Registers a new built-in-kind animation.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidKind` if `kind` is `ValueKind::External`
    /// — external animations must go through
    /// [`Self::add_external_animation`], which supplies the reducer this
    /// constructor path has no way to express.
    pub fn add_animation(&mut self, kind: ValueKind, callbacks: AnimationCallbacks) -> EngineResult<AnimationHandle> {
        if kind == ValueKind::External {
            return Err(EngineError::InvalidKind);
        }
        let animation = Animation::new(kind, callbacks);
        let handle = self.animations.insert(animation);
        self.order.push(handle);
        Ok(handle)
    }

    /// Registers a new `external`-kind animation with a caller-supplied
    /// reducer and initial prev/curr buffers.
    pub fn add_external_animation(
        &mut self, interpolator: Box<dyn ExternalInterpolator>, callbacks: AnimationCallbacks, prev: ExternalValue,
        curr: ExternalValue,
    ) -> AnimationHandle {
        let animation = Animation::new_external(interpolator, callbacks, prev, curr);
        let handle = self.animations.insert(animation);
        self.order.push(handle);
        handle
    }

    /// Removes an animation from processing without dropping it from the
    /// registry's backing storage until [`Self::delete_animation`] is
    /// called — kept for parity with the source's separate remove/delete
    /// steps; here it is simply detachment from the processing order.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::PreconditionViolation` if `handle` is not
    /// currently registered.
    pub fn remove_animation(&mut self, handle: AnimationHandle) -> EngineResult<()> {
        let pos = self
            .order
            .iter()
            .position(|&h| h == handle)
            .ok_or_else(|| EngineError::precondition("animation handle is not registered"))?;
        self.order.remove(pos);
        Ok(())
    }

    /// Permanently removes an animation and frees its keyframes.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::PreconditionViolation` if `handle` does not
    /// resolve in this engine's arena.
    pub fn delete_animation(&mut self, handle: AnimationHandle) -> EngineResult<()> {
        self.order.retain(|&h| h != handle);
        self.animations
            .remove(handle)
            .ok_or_else(|| EngineError::precondition("animation handle does not resolve in this engine"))?;
        Ok(())
    }

    /// Re-adds a previously [`Self::remove_animation`]-ed animation to the
    /// processing order, appending it at the end — it resumes receiving
    /// ticks on the next `process_all` but does not regain its old position
    /// in registration order.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::PreconditionViolation` if `handle` does not
    /// resolve in this engine's arena (it was deleted, not just removed) or
    /// is already present in the processing order.
    pub fn reinsert_animation(&mut self, handle: AnimationHandle) -> EngineResult<()> {
        if !self.animations.contains_key(handle) {
            return Err(EngineError::precondition("animation handle does not resolve in this engine"));
        }
        if self.order.contains(&handle) {
            return Err(EngineError::precondition("animation handle is already registered"));
        }
        self.order.push(handle);
        Ok(())
    }

    /// Returns a reference to a registered animation.
    #[must_use]
    pub fn animation(&self, handle: AnimationHandle) -> Option<&Animation> {
        self.animations.get(handle)
    }

    /// Returns a mutable reference to a registered animation.
    pub fn animation_mut(&mut self, handle: AnimationHandle) -> Option<&mut Animation> {
        self.animations.get_mut(handle)
    }

    /// Walks every registered animation, in registration order, and runs its
    /// per-tick timeline state machine against the current global clock.
    pub fn process_all(&mut self) {
        for &handle in &self.order {
            trace!("engine: dispatching tick to animation {handle:?} at {}", self.curr);
            if let Some(animation) = self.animations.get_mut(handle) {
                animation.process(handle, self.curr, self.tpf);
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;

    #[test]
    fn default_engine_runs_at_30fps() {
        let e = Engine::new();
        assert_eq!(e.fps(), 30);
        assert_eq!(e.tpf(), Time::SECOND / 30);
        assert_eq!(e.get_time(), Time::ZERO);
    }

    #[test]
    fn set_fps_recomputes_time_per_frame() {
        let mut e = Engine::new();
        e.set_fps(60);
        assert_eq!(e.tpf(), Time::SECOND / 60);
    }

    #[test]
    fn add_animation_rejects_external_kind() {
        let mut e = Engine::new();
        let result = e.add_animation(ValueKind::External, AnimationCallbacks::default());
        assert!(matches!(result, Err(EngineError::InvalidKind)));
    }

    #[test]
    fn tick_advances_frame_and_clock_together() {
        let mut e = Engine::new();
        e.tick();
        assert_eq!(e.frame(), 1);
        assert_eq!(e.get_time(), Time::SECOND / 30);
    }

    #[test]
    fn seek_frame_is_idempotent() {
        let mut e = Engine::new();
        e.set_fps(30);
        e.seek_frame(90);
        let after_first = e.get_time();
        e.seek_frame(90);
        assert_eq!(e.get_time(), after_first);
    }

    #[test]
    fn removed_animation_stops_ticking_until_reinserted() {
        let mut e = Engine::new();
        let handle = e.add_animation(ValueKind::U32, AnimationCallbacks::default()).unwrap();
        let a = e.animation_mut(handle).unwrap();
        let k0 = a.add_keyframe();
        let k1 = a.add_keyframe();
        a.set_time(k1, Time::from_secs(1)).unwrap();
        a.set_value(k0, Value::U32(0)).unwrap();
        a.set_value(k1, Value::U32(100)).unwrap();
        a.set_repeat(-1);

        e.remove_animation(handle).unwrap();
        for _ in 0..45 {
            e.tick();
        }
        assert!(matches!(e.animation(handle).unwrap().value(), Value::U32(0)));

        e.reinsert_animation(handle).unwrap();
        for _ in 0..15 {
            e.tick();
        }
        assert!(matches!(e.animation(handle).unwrap().value(), Value::U32(100)));
    }

    #[test]
    fn registered_animation_receives_ticks_in_registration_order() {
        let mut e = Engine::new();
        let handle = e.add_animation(ValueKind::U32, AnimationCallbacks::default()).unwrap();
        let a = e.animation_mut(handle).unwrap();
        let k0 = a.add_keyframe();
        let k1 = a.add_keyframe();
        a.set_time(k0, Time::from_secs(1)).unwrap();
        a.set_value(k0, Value::U32(10)).unwrap();
        a.set_time(k1, Time::from_secs(2)).unwrap();
        a.set_value(k1, Value::U32(40)).unwrap();

        for _ in 0..90 {
            e.tick();
        }
        assert!(matches!(e.animation(handle).unwrap().value(), Value::U32(40)));
    }
}
