//! Error types for SAPIEN

use thiserror::Error;

use crate::JointName;

/// Core SAPIEN errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SapienError {
    // Frame errors
    #[error("Missing joint: {0:?}")]
    MissingJoint(JointName),

    // Geometry errors
    #[error("Degenerate geometry: vector magnitude {magnitude} below epsilon")]
    DegenerateGeometry { magnitude: f64 },

    #[error("Non-finite joint position")]
    NonFinitePosition,
}

/// Result type for SAPIEN operations
pub type SapienResult<T> = Result<T, SapienError>;
