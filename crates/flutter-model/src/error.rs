//! Validation errors raised before any mesh generation or file I/O.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ValidationError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{name} must be positive and finite (received {value})")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{name} must be in [{min}, {max}] (received {value})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("mesh density must be at least 1x1 (received {nx}x{ny})")]
    EmptyMesh { nx: usize, ny: usize },

    #[error("thickness {thickness} m is below the minimum plate thickness {min} m")]
    ThicknessTooSmall { thickness: f64, min: f64 },

    #[error(
        "thickness ratio h/min(a,b) = {ratio:.3} exceeds {limit}; the panel is not a plate"
    )]
    ThicknessTooLarge { ratio: f64, limit: f64 },

    #[error("element aspect ratio {ratio:.2} exceeds the hard limit {limit}")]
    ElementAspectRatio { ratio: f64, limit: f64 },

    #[error("mesh would need {count} ids which do not fit an 8-column field")]
    TooManyIds { count: usize },

    #[error("invalid boundary code '{0}': expected 4 letters from S, C, F")]
    BoundaryCode(String),

    #[error("composite laminate '{0}' has no plies")]
    EmptyLaminate(String),

    #[error("invalid material '{name}': {reason}")]
    Material { name: String, reason: String },

    #[error("invalid flow conditions: {0}")]
    Flow(String),
}

/// Checks that a named quantity is strictly positive and finite.
pub fn ensure_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositive { name, value })
    }
}
