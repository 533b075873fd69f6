//! Tagged value variants animated by the engine.
//!
//! The engine is abstract over what a value *means*; it only needs to know
//! its kind so it can pick the right interpolator. `ValueKind` is fixed at
//! animation-creation time and every `Value` produced by an animation must
//! carry the same kind (invariants I3/I5 in the data model).

use core::fmt;

/// The kind of value an animation drives.
///
/// Numeric tags match the ABI-equivalent contract in the spec:
/// `u32=0, i32=1, f32=2, f64=3, argb=4, string=5, external=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 32-bit integer.
    I32,
    /// Single precision float.
    F32,
    /// Double precision float.
    F64,
    /// Packed `0xAARRGGBB` color.
    Argb,
    /// Owned string, discrete interpolation only.
    String,
    /// Caller-supplied opaque value with a caller-supplied reducer.
    External,
}

impl ValueKind {
    /// Returns the ABI-equivalent numeric tag for this kind.
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::U32 => 0,
            Self::I32 => 1,
            Self::F32 => 2,
            Self::F64 => 3,
            Self::Argb => 4,
            Self::String => 5,
            Self::External => 6,
        }
    }
}

/// A tagged value of one of the kinds in `ValueKind`.
///
/// `Value::External` carries an opaque, reference-counted handle: the engine
/// never dereferences it, it only passes it through to the caller-supplied
/// interpolator and callbacks. Lifetime and interior mutability are the
/// caller's responsibility.
#[derive(Debug, Clone)]
pub enum Value {
    /// Unsigned 32-bit integer value.
    U32(u32),
    /// Signed 32-bit integer value.
    I32(i32),
    /// Single precision float value.
    F32(f32),
    /// Double precision float value.
    F64(f64),
    /// Packed `0xAARRGGBB` color value.
    Argb(u32),
    /// Owned string value.
    String(String),
    /// Opaque external value; meaningful only with an external interpolator.
    External(ExternalValue),
}

/// An opaque, caller-owned value for `external`-kind animations.
///
/// The engine stores and passes this handle around but never reads through
/// it. Equality and cloning only compare/duplicate the handle, not whatever
/// it points to.
#[derive(Debug, Clone)]
pub struct ExternalValue(pub std::sync::Arc<dyn std::any::Any + Send + Sync>);

impl ExternalValue {
    /// Wraps an arbitrary caller-owned payload as an opaque external value.
    #[must_use]
    pub fn new<T: std::any::Any + Send + Sync>(payload: T) -> Self {
        Self(std::sync::Arc::new(payload))
    }

    /// Attempts to downcast back to the concrete payload type.
    #[must_use]
    pub fn downcast_ref<T: std::any::Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl Value {
    /// Returns the kind tag of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::U32(_) => ValueKind::U32,
            Self::I32(_) => ValueKind::I32,
            Self::F32(_) => ValueKind::F32,
            Self::F64(_) => ValueKind::F64,
            Self::Argb(_) => ValueKind::Argb,
            Self::String(_) => ValueKind::String,
            Self::External(_) => ValueKind::External,
        }
    }

    /// Builds the default (zero-valued) `Value` for a given kind.
    #[must_use]
    pub fn default_for(kind: ValueKind) -> Self {
        match kind {
            ValueKind::U32 => Self::U32(0),
            ValueKind::I32 => Self::I32(0),
            ValueKind::F32 => Self::F32(0.0),
            ValueKind::F64 => Self::F64(0.0),
            ValueKind::Argb => Self::Argb(0),
            ValueKind::String => Self::String(String::new()),
            ValueKind::External => Self::External(ExternalValue::new(())),
        }
    }
}

impl PartialEq for ExternalValue {
    /// Two external values are equal only if they wrap the same allocation —
    /// the engine cannot know how to compare caller-owned payloads
    /// structurally.
    fn eq(&self, other: &Self) -> bool {
        std::sync::Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::U32(a), Self::U32(b)) => a == b,
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::F32(a), Self::F32(b)) => a == b,
            (Self::F64(a), Self::F64(b)) => a == b,
            (Self::Argb(a), Self::Argb(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::External(a), Self::External(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Argb => "argb",
            Self::String => "string",
            Self::External => "external",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_match_abi_contract() {
        assert_eq!(ValueKind::U32.tag(), 0);
        assert_eq!(ValueKind::I32.tag(), 1);
        assert_eq!(ValueKind::F32.tag(), 2);
        assert_eq!(ValueKind::F64.tag(), 3);
        assert_eq!(ValueKind::Argb.tag(), 4);
        assert_eq!(ValueKind::String.tag(), 5);
        assert_eq!(ValueKind::External.tag(), 6);
    }

    #[test]
    fn value_kind_matches_owning_variant() {
        assert_eq!(Value::U32(1).kind(), ValueKind::U32);
        assert_eq!(Value::Argb(0xff00_00ff).kind(), ValueKind::Argb);
        assert_eq!(Value::String("x".into()).kind(), ValueKind::String);
    }
}
