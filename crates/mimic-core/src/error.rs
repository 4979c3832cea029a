//! Error types for MIMIC
//!
//! Only configuration problems surface as errors. Assets that are still
//! loading and limbs that were not detected this frame are steady states
//! handled with `Option` and no-ops.

use thiserror::Error;

/// Core MIMIC errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MimicError {
    // Configuration errors
    #[error("Unknown clip: {0}")]
    UnknownClip(String),

    #[error("Unknown bone: {0}")]
    UnknownBone(String),

    #[error("Unknown expression: {0}")]
    UnknownExpression(String),

    #[error("Invalid clip: {0}")]
    InvalidClip(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Readiness errors (only from explicit calls, never from the frame loop)
    #[error("Rig not ready")]
    RigNotReady,

    #[error("Clip not ready: {0}")]
    ClipNotReady(String),

    // Input errors
    #[error("Missing {category} landmarks: expected {expected}, got {actual}")]
    MissingLandmarks {
        category: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Result type for MIMIC operations
pub type MimicResult<T> = Result<T, MimicError>;
