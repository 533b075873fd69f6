//! Keyframes: the value-at-a-time anchors of an animation's timeline.

use std::any::Any;

use slotmap::new_key_type;

use crate::shapes::{Shape, ShapeParams};
use crate::types::{Time, Value};

new_key_type! {
    /// Stable handle to a keyframe within its owning animation's arena.
    ///
    /// A bare handle is not enough to prove ownership: two independently
    /// constructed animations each allocate their own `SlotMap`, so a
    /// handle minted by one can collide (same slot index, same starting
    /// generation) with a handle minted by another. Every `Keyframe` also
    /// carries the minting animation's `owner` tag, and `Animation`'s
    /// accessors check it before resolving a handle, so a foreign or stale
    /// handle is rejected rather than silently resolving into an unrelated
    /// keyframe.
    pub struct KeyframeHandle;
}

/// A single timestamped anchor on an animation's timeline.
///
/// `shape`/`shape_params` describe the interval that **starts** at this
/// keyframe and ends at the next one in time order; they are unused on an
/// animation's last keyframe.
pub struct Keyframe {
    pub(crate) time: Time,
    pub(crate) value: Value,
    pub(crate) shape: Shape,
    pub(crate) shape_params: ShapeParams,
    /// Owner tag of the `Animation` that minted this keyframe; see
    /// `KeyframeHandle`'s doc comment.
    pub(crate) owner: u64,
    aux: Option<Box<dyn Any>>,
}

impl core::fmt::Debug for Keyframe {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Keyframe")
            .field("time", &self.time)
            .field("value", &self.value)
            .field("shape", &self.shape)
            .field("shape_params", &self.shape_params)
            .field("owner", &self.owner)
            .field("aux", &self.aux.is_some())
            .finish()
    }
}

impl Keyframe {
    pub(crate) fn new(value: Value, owner: u64) -> Self {
        Self {
            time: Time::ZERO,
            value,
            shape: Shape::default(),
            shape_params: ShapeParams::default(),
            owner,
            aux: None,
        }
    }

    /// The keyframe's timestamp on the owning animation's local timeline.
    #[must_use]
    pub const fn time(&self) -> Time {
        self.time
    }

    /// The value this keyframe holds.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// The shape warp used for the interval starting at this keyframe.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// Control-point parameters for `shape` (only meaningful for quadratic
    /// and cubic shapes).
    #[must_use]
    pub const fn shape_params(&self) -> &ShapeParams {
        &self.shape_params
    }

    /// Attaches caller-owned annotation data to this keyframe.
    ///
    /// The engine never reads this back; it exists purely so a host can hang
    /// its own bookkeeping off a keyframe. Rust's `Drop` glue on the boxed
    /// payload takes the place of the explicit destructor callback the
    /// source required — it runs when the aux is replaced, the keyframe is
    /// removed, or the owning animation is deleted.
    pub fn set_aux<T: Any>(&mut self, data: T) {
        if self.aux.is_some() {
            log::warn!("keyframe aux replaced before being reclaimed by the caller");
        }
        self.aux = Some(Box::new(data));
    }

    /// Returns the attached annotation, if any, downcast to `T`.
    #[must_use]
    pub fn aux<T: Any>(&self) -> Option<&T> {
        self.aux.as_ref().and_then(|a| a.downcast_ref::<T>())
    }

    /// Clears any attached annotation, running its `Drop` glue.
    pub fn clear_aux(&mut self) {
        self.aux = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueKind;

    #[test]
    fn new_keyframe_defaults_to_zero_time_and_linear_shape() {
        let kf = Keyframe::new(Value::default_for(ValueKind::U32), 1);
        assert_eq!(kf.time(), Time::ZERO);
        assert_eq!(kf.shape(), Shape::Linear);
    }

    #[test]
    fn aux_roundtrips_through_downcast() {
        let mut kf = Keyframe::new(Value::U32(0), 1);
        assert!(kf.aux::<u32>().is_none());
        kf.set_aux(42u32);
        assert_eq!(kf.aux::<u32>(), Some(&42));
        kf.clear_aux();
        assert!(kf.aux::<u32>().is_none());
    }
}
