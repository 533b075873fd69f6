//! Error types for the animation engine.
//!
//! The engine's surface is primarily infallible mutation (spec.md §7); this
//! module provides `EngineError` for the handful of operations that can
//! genuinely fail.

mod engine_error;

pub use engine_error::{EngineError, EngineResult};
