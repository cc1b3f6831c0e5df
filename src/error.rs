use thiserror::Error;

/// Landmark sets that break the detector output contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LandmarkError {
    #[error("hand landmark set must have {expected} points, got {got}")]
    MalformedHand { expected: usize, got: usize },
}

/// Failures reported by an actuator backend.
///
/// `Unsupported` is the expected outcome on hosts that lack a capability
/// (no media keys, no URL opener) and is treated as a no-op by the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuatorError {
    #[error("unsupported on this host: {0}")]
    Unsupported(String),
    #[error("actuator backend error: {0}")]
    Backend(String),
}

impl ActuatorError {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}
