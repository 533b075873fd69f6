//! Animation engine error definitions.

use core::fmt;

/// Animation engine operation errors.
#[derive(Debug)]
pub enum EngineError {
    /// A built-in animation was requested with the external kind marker.
    InvalidKind,
    /// A handle passed by the caller no longer resolves in its arena
    /// (stale or foreign `AnimationHandle`/`KeyframeHandle`).
    PreconditionViolation(String),
}

impl EngineError {
    /// Creates a precondition-violation error with a message.
    #[must_use]
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::PreconditionViolation(msg.into())
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKind => write!(
                f,
                "invalid kind: external animations must be created via add_external_animation"
            ),
            Self::PreconditionViolation(msg) => write!(f, "precondition violation: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Result type for animation engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
