//! Animations: an ordered keyframe timeline plus the per-tick state machine
//! that walks it.

use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, trace};
use slotmap::SlotMap;

use crate::engine::AnimationHandle;
use crate::errors::{EngineError, EngineResult};
use crate::interpolators::{self, ExternalInterpolator};
use crate::keyframe::{Keyframe, KeyframeHandle};
use crate::shapes::{Shape, ShapeParams};
use crate::types::{ExternalValue, Time, Value, ValueKind};

/// Mints the per-`Animation` owner tag that disambiguates keyframe handles
/// across animations — see the `id` field on `Animation`.
static NEXT_ANIMATION_ID: AtomicU64 = AtomicU64::new(1);

/// State-change callbacks an animation invokes as it is processed.
///
/// The original library threads an opaque `void *data` through every
/// callback; here the host closes over whatever state it needs instead, the
/// idiomatic Rust equivalent of that pattern.
#[derive(Default)]
pub struct AnimationCallbacks {
    /// Invoked whenever a new value has been computed for this tick, with
    /// the bracketing keyframe, the new current value, and the previous one.
    pub on_value: Option<Box<dyn FnMut(KeyframeHandle, &Value, &Value)>>,
    /// Invoked once when the animation transitions from not-started to
    /// started.
    pub on_start: Option<Box<dyn FnMut()>>,
    /// Invoked once when a finite animation has exhausted its repeats.
    pub on_stop: Option<Box<dyn FnMut()>>,
    /// Invoked once per completed cycle of a repeating animation.
    pub on_repeat: Option<Box<dyn FnMut()>>,
}

/// A single animated timeline: an ordered list of keyframes, a repeat/offset
/// policy, and the value most recently produced for it.
pub struct Animation {
    /// Owner tag stamped on every keyframe this animation mints. Each
    /// `Animation` has its own independently-allocated `SlotMap`, so two
    /// animations can otherwise hand out bit-identical `KeyframeHandle`s
    /// (same index, same starting generation); this tag is what lets
    /// `get_owned`/`get_owned_mut` reject a handle minted by a different
    /// animation instead of silently resolving into an unrelated keyframe.
    id: u64,
    kind: ValueKind,
    interpolator: Option<Box<dyn ExternalInterpolator>>,
    keys: SlotMap<KeyframeHandle, Keyframe>,
    keys_ordered: Vec<KeyframeHandle>,
    keys_insertion: Vec<KeyframeHandle>,
    start: Time,
    end: Time,
    repeat: i64,
    offset: Time,
    callbacks: AnimationCallbacks,
    enabled: bool,
    started: bool,
    curr: Value,
    prev: Value,
    /// Last warped phase handed to the reducer; `-1.0` is an impossible
    /// phase so the very first tick is never short-circuited.
    m_last: f64,
}

impl Animation {
    /// Creates a standalone animation for one of the built-in value kinds.
    ///
    /// Most hosts go through `Engine::add_animation` instead; this
    /// constructor exists for embedding just the timeline model without an
    /// engine around it.
    ///
    /// # Panics
    ///
    /// Nothing in this constructor panics; `kind` may be any `ValueKind`
    /// including `External`, though `External` animations are normally
    /// created via [`Self::new_external`] so they carry a reducer.
    #[must_use]
    pub fn new(kind: ValueKind, callbacks: AnimationCallbacks) -> Self {
        let value = Value::default_for(kind);
        Self::with_initial_values(kind, None, callbacks, value.clone(), value)
    }

    /// Creates a standalone `external`-kind animation with a caller-supplied
    /// reducer and initial prev/curr buffers.
    #[must_use]
    pub fn new_external(
        interpolator: Box<dyn ExternalInterpolator>, callbacks: AnimationCallbacks, prev: ExternalValue,
        curr: ExternalValue,
    ) -> Self {
        Self::with_initial_values(
            ValueKind::External,
            Some(interpolator),
            callbacks,
            Value::External(prev),
            Value::External(curr),
        )
    }

    fn with_initial_values(
        kind: ValueKind, interpolator: Option<Box<dyn ExternalInterpolator>>, callbacks: AnimationCallbacks,
        prev: Value, curr: Value,
    ) -> Self {
        Self {
            id: NEXT_ANIMATION_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            interpolator,
            keys: SlotMap::with_key(),
            keys_ordered: Vec::new(),
            keys_insertion: Vec::new(),
            start: Time::ZERO,
            end: Time::ZERO,
            repeat: 1,
            offset: Time::ZERO,
            callbacks,
            enabled: true,
            started: false,
            curr,
            prev,
            m_last: -1.0,
        }
    }

    /// The value kind this animation drives.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Cached minimum keyframe time (`0` if empty).
    #[must_use]
    pub const fn start(&self) -> Time {
        self.start
    }

    /// Cached maximum keyframe time (`0` if empty).
    #[must_use]
    pub const fn end(&self) -> Time {
        self.end
    }

    /// Current repeat count; negative means infinite.
    #[must_use]
    pub const fn repeat(&self) -> i64 {
        self.repeat
    }

    /// Current time offset applied to this animation's window.
    #[must_use]
    pub const fn offset(&self) -> Time {
        self.offset
    }

    /// Sets how many times the timeline replays; negative means forever.
    pub fn set_repeat(&mut self, times: i64) {
        self.repeat = times;
    }

    /// Shifts this animation's entire window by `dt`.
    pub fn add_offset(&mut self, dt: Time) {
        self.offset += dt;
    }

    /// Enables processing for this animation.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Disables processing for this animation; ticks are silently ignored
    /// until re-enabled.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    /// Whether this animation is currently enabled.
    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// The last value computed for this animation.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.curr
    }

    /// Access to this animation's callback set.
    pub fn callbacks_mut(&mut self) -> &mut AnimationCallbacks {
        &mut self.callbacks
    }

    /// Appends a blank keyframe (time `0`, the kind's default value, linear
    /// shape) and returns a handle to it.
    pub fn add_keyframe(&mut self) -> KeyframeHandle {
        let kf = Keyframe::new(Value::default_for(self.kind), self.id);
        let handle = self.keys.insert(kf);
        self.keys_insertion.push(handle);
        self.insert_ordered(handle, Time::ZERO);
        self.recompute_bounds();
        handle
    }

    /// Removes a keyframe, running its aux destructor glue and recomputing
    /// `start`/`end`.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::PreconditionViolation` if `handle` does not
    /// belong to this animation.
    pub fn remove_keyframe(&mut self, handle: KeyframeHandle) -> EngineResult<()> {
        self.get_owned(handle)
            .ok_or_else(|| EngineError::precondition("keyframe handle does not resolve in this animation"))?;
        self.keys.remove(handle);
        self.keys_ordered.retain(|&h| h != handle);
        self.keys_insertion.retain(|&h| h != handle);
        self.recompute_bounds();
        Ok(())
    }

    /// Returns a keyframe by handle.
    #[must_use]
    pub fn keyframe(&self, handle: KeyframeHandle) -> Option<&Keyframe> {
        self.get_owned(handle)
    }

    /// Returns a keyframe by handle, mutably — use this to reach
    /// [`Keyframe::set_aux`].
    pub fn keyframe_mut(&mut self, handle: KeyframeHandle) -> Option<&mut Keyframe> {
        self.get_owned_mut(handle)
    }

    /// Resolves `handle` to a keyframe, but only if it was minted by this
    /// animation's own arena — rejects a handle that merely collides with
    /// one of ours (same slot index and generation, different owner).
    fn get_owned(&self, handle: KeyframeHandle) -> Option<&Keyframe> {
        self.keys.get(handle).filter(|kf| kf.owner == self.id)
    }

    /// Mutable counterpart of [`Self::get_owned`].
    fn get_owned_mut(&mut self, handle: KeyframeHandle) -> Option<&mut Keyframe> {
        let id = self.id;
        self.keys.get_mut(handle).filter(|kf| kf.owner == id)
    }

    /// Returns a keyframe by insertion order, not time order.
    #[must_use]
    pub fn keyframe_at(&self, index: usize) -> Option<&Keyframe> {
        self.keys_insertion.get(index).and_then(|&h| self.keys.get(h))
    }

    /// Iterates keyframes in time-ascending order.
    pub fn iterate_keys(&self) -> impl Iterator<Item = &Keyframe> {
        self.keys_ordered.iter().filter_map(move |&h| self.keys.get(h))
    }

    /// Changes a keyframe's timestamp, re-sorting its place in the
    /// time-ordered index. A no-op if `t` equals the keyframe's current time.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::PreconditionViolation` if `handle` does not
    /// belong to this animation.
    pub fn set_time(&mut self, handle: KeyframeHandle, t: Time) -> EngineResult<()> {
        let kf = self
            .get_owned_mut(handle)
            .ok_or_else(|| EngineError::precondition("keyframe handle does not resolve in this animation"))?;
        if kf.time == t {
            return Ok(());
        }
        kf.time = t;
        self.keys_ordered.retain(|&h| h != handle);
        self.insert_ordered(handle, t);
        self.recompute_bounds();
        Ok(())
    }

    /// Sets a keyframe's value.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::PreconditionViolation` if `handle` does not
    /// belong to this animation.
    pub fn set_value(&mut self, handle: KeyframeHandle, value: Value) -> EngineResult<()> {
        let kf = self
            .get_owned_mut(handle)
            .ok_or_else(|| EngineError::precondition("keyframe handle does not resolve in this animation"))?;
        kf.value = value;
        Ok(())
    }

    /// Sets a keyframe's shape warp.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::PreconditionViolation` if `handle` does not
    /// belong to this animation.
    pub fn set_shape(&mut self, handle: KeyframeHandle, shape: Shape) -> EngineResult<()> {
        let kf = self
            .get_owned_mut(handle)
            .ok_or_else(|| EngineError::precondition("keyframe handle does not resolve in this animation"))?;
        kf.shape = shape;
        Ok(())
    }

    /// Sets a keyframe's shape control-point parameters.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::PreconditionViolation` if `handle` does not
    /// belong to this animation.
    pub fn set_shape_params(&mut self, handle: KeyframeHandle, params: ShapeParams) -> EngineResult<()> {
        let kf = self
            .get_owned_mut(handle)
            .ok_or_else(|| EngineError::precondition("keyframe handle does not resolve in this animation"))?;
        kf.shape_params = params;
        Ok(())
    }

    fn insert_ordered(&mut self, handle: KeyframeHandle, t: Time) {
        let pos = self.keys_ordered.iter().position(|&h| self.keys[h].time >= t).unwrap_or(self.keys_ordered.len());
        self.keys_ordered.insert(pos, handle);
    }

    fn recompute_bounds(&mut self) {
        match (self.keys_ordered.first(), self.keys_ordered.last()) {
            (Some(&first), Some(&last)) => {
                self.start = self.keys[first].time;
                self.end = self.keys[last].time;
            },
            _ => {
                self.start = Time::ZERO;
                self.end = Time::ZERO;
            },
        }
    }

    /// Runs the per-tick timeline state machine against the engine's global
    /// clock, firing start/stop/repeat transitions and dispatching to
    /// [`Self::animate`] as needed.
    pub(crate) fn process(&mut self, handle: AnimationHandle, global: Time, tpf: Time) {
        if !self.enabled {
            return;
        }
        if global < self.start + self.offset {
            return;
        }
        if self.end == self.start {
            return;
        }

        trace!(
            "animation {handle:?}: curr={global} offset={} window=[{} {}] repeat={}",
            self.offset, self.start, self.end, self.repeat
        );

        if self.repeat >= 0 {
            let abs_end = self.end * self.repeat + self.offset;
            if global > abs_end {
                if self.started {
                    self.animate(self.end);
                    self.started = false;
                    debug!("animation {handle:?}: stopping at {global}");
                    if let Some(cb) = self.callbacks.on_stop.as_mut() {
                        cb();
                    }
                }
                return;
            }
        }

        let local = global - (self.start + self.offset);
        let length = self.end - self.start;
        let phase_time = (local % length) + self.start;

        if (phase_time - tpf) < self.start && self.started {
            self.animate(self.end);
            debug!("animation {handle:?}: repeating");
            if let Some(cb) = self.callbacks.on_repeat.as_mut() {
                cb();
            }
            return;
        }

        if !self.started {
            debug!("animation {handle:?}: starting");
            if let Some(cb) = self.callbacks.on_start.as_mut() {
                cb();
            }
            self.started = true;
        }

        self.animate(phase_time);
    }

    /// Locates the keyframe interval bracketing `t_local`, warps the phase
    /// by the interval's shape, reduces it to a value, and emits `on_value`.
    ///
    /// Short-circuits (no recomputation, `curr == prev` in the callback) when
    /// the warped phase is identical to the previous tick's.
    fn animate(&mut self, t_local: Time) {
        if self.keys_ordered.is_empty() {
            return;
        }

        for pair in self.keys_ordered.windows(2) {
            let (ha, hb) = (pair[0], pair[1]);
            let (a_time, b_time) = (self.keys[ha].time, self.keys[hb].time);
            if t_local < a_time || t_local > b_time {
                continue;
            }

            let m = if t_local == a_time {
                0.0
            } else if t_local == b_time {
                1.0
            } else {
                (t_local.as_nanos() - a_time.as_nanos()) as f64 / (b_time.as_nanos() - a_time.as_nanos()) as f64
            };
            let (shape, params) = (self.keys[ha].shape, self.keys[ha].shape_params);
            let m_prime = shape.warp(m, &params);
            trace!("animate: m={m} m'={m_prime} interval=[{a_time} {b_time}]");

            if m_prime == self.m_last {
                if let Some(cb) = self.callbacks.on_value.as_mut() {
                    cb(ha, &self.curr, &self.curr);
                }
                return;
            }

            let new_curr = self.reduce(ha, hb, m_prime);
            self.prev = std::mem::replace(&mut self.curr, new_curr);
            if let Some(cb) = self.callbacks.on_value.as_mut() {
                cb(ha, &self.curr, &self.prev);
            }
            self.m_last = m_prime;
            return;
        }
    }

    fn reduce(&self, ha: KeyframeHandle, hb: KeyframeHandle, m_prime: f64) -> Value {
        let (a, b) = (&self.keys[ha].value, &self.keys[hb].value);
        match (&self.interpolator, a, b) {
            (Some(interp), Value::External(a), Value::External(b)) => Value::External(interp.reduce(a, b, m_prime)),
            _ => interpolators::reduce(a, b, m_prime),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::engine::AnimationHandle;

    fn handle() -> AnimationHandle {
        slotmap::SlotMap::<AnimationHandle, ()>::with_key().insert(())
    }

    #[test]
    fn keyframes_stay_sorted_after_out_of_order_inserts() {
        let mut a = Animation::new(ValueKind::U32, AnimationCallbacks::default());
        let k3 = a.add_keyframe();
        let k1 = a.add_keyframe();
        let k2 = a.add_keyframe();
        a.set_time(k3, Time::from_secs(3)).unwrap();
        a.set_time(k1, Time::from_secs(1)).unwrap();
        a.set_time(k2, Time::from_secs(2)).unwrap();

        let times: Vec<_> = a.iterate_keys().map(Keyframe::time).collect();
        assert_eq!(times, vec![Time::from_secs(1), Time::from_secs(2), Time::from_secs(3)]);
        assert_eq!(a.start(), Time::from_secs(1));
        assert_eq!(a.end(), Time::from_secs(3));
        // insertion order is preserved independent of time order.
        assert_eq!(a.keyframe_at(0).unwrap().time(), Time::from_secs(3));
    }

    #[test]
    fn stale_handle_is_a_precondition_violation_not_a_panic() {
        // `a` gets a keyframe of its own first: two freshly constructed
        // animations each calling `add_keyframe()` once would otherwise hand
        // out bit-identical `KeyframeHandle`s (same slot index, same
        // starting generation), which would make this check trivially pass
        // for the wrong reason (`a`'s arena is simply empty).
        let mut a = Animation::new(ValueKind::U32, AnimationCallbacks::default());
        let own = a.add_keyframe();
        a.set_value(own, Value::U32(7)).unwrap();

        let mut other = Animation::new(ValueKind::U32, AnimationCallbacks::default());
        let foreign = other.add_keyframe();
        assert!(matches!(a.set_time(foreign, Time::ZERO), Err(EngineError::PreconditionViolation(_))));
        // and the foreign handle must not have silently resolved into `a`'s
        // own same-slot keyframe and mutated it.
        assert!(matches!(a.keyframe(own).unwrap().value(), Value::U32(7)));
    }

    #[test]
    fn linear_ramp_reports_midpoint_with_ceiling_rounding() {
        let mut a = Animation::new(ValueKind::U32, AnimationCallbacks::default());
        let k0 = a.add_keyframe();
        let k1 = a.add_keyframe();
        a.set_time(k0, Time::from_secs(1)).unwrap();
        a.set_value(k0, Value::U32(10)).unwrap();
        a.set_time(k1, Time::from_secs(2)).unwrap();
        a.set_value(k1, Value::U32(40)).unwrap();

        let h = handle();
        let tpf = Time::SECOND / 30;
        a.process(h, Time::from_millis(1500), tpf);
        assert!(matches!(a.value(), Value::U32(25)));
    }

    #[test]
    fn repeat_sequence_emits_start_values_repeat_stop_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut cbs = AnimationCallbacks::default();
        {
            let log = log.clone();
            cbs.on_start = Some(Box::new(move || log.borrow_mut().push("start".to_string())));
        }
        {
            let log = log.clone();
            cbs.on_repeat = Some(Box::new(move || log.borrow_mut().push("repeat".to_string())));
        }
        {
            let log = log.clone();
            cbs.on_stop = Some(Box::new(move || log.borrow_mut().push("stop".to_string())));
        }
        let mut a = Animation::new(ValueKind::U32, cbs);
        let k0 = a.add_keyframe();
        let k1 = a.add_keyframe();
        a.set_value(k0, Value::U32(10)).unwrap();
        a.set_time(k1, Time::from_secs(1)).unwrap();
        a.set_value(k1, Value::U32(40)).unwrap();
        a.set_repeat(3);

        let h = handle();
        let tpf = Time::SECOND / 30;
        // zero-anchored window (start=0, end=1s): the stop formula
        // `end * repeat + offset` then lands exactly on the third cycle, so
        // ticking a little past 3s reaches on_stop within this loop.
        for frame in 0..(30i64 * 4) {
            let t = tpf * frame;
            a.process(h, t, tpf);
        }
        let events = log.borrow();
        assert_eq!(events.first().map(String::as_str), Some("start"));
        assert_eq!(events.iter().filter(|e| e.as_str() == "repeat").count(), 2);
        assert_eq!(events.last().map(String::as_str), Some("stop"));
    }
}
