//! Core data types shared across the animation engine.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                  Core Types                     │
//! ├───────────────────────────────────────────────┤
//! │  Time            │  Value / ValueKind           │
//! │  ─────────────── │  ──────────────────────────  │
//! │  nanosecond clock │  tagged union over the seven │
//! │  shared by every  │  animatable kinds, fixed per │
//! │  timestamp        │  animation at creation time  │
//! └───────────────────────────────────────────────┘
//! ```

pub mod time;
pub mod value;

pub use time::Time;
pub use value::{ExternalValue, Value, ValueKind};
