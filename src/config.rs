//! Engine configuration.

/// Construction-time knobs for an [`Engine`](crate::Engine).
///
/// Everything here is set once, at construction, and never changes the
/// engine's observable behavior beyond tick rate — `capacity_hint` is purely
/// a performance hint.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Initial tick rate, in frames per second.
    pub fps: u32,
    /// Pre-reservation hint for the animation arena. `0` means no
    /// pre-reservation.
    pub capacity_hint: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { fps: 30, capacity_hint: 0 }
    }
}
