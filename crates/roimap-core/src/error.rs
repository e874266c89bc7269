//! Error types for geometry construction.

use thiserror::Error;

/// Errors raised when building spatial metadata or scale factors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Direction cosine matrix cannot be inverted.
    #[error("Direction matrix is singular")]
    SingularDirection,

    /// Spacing contains a zero, negative or non-finite component.
    #[error("Invalid spacing: {0:?}")]
    InvalidSpacing(Vec<f64>),

    /// Raster has a zero-length axis.
    #[error("Empty raster: size {0:?}")]
    EmptyRaster(Vec<usize>),

    /// Buffer length does not match the raster size.
    #[error("Shape mismatch: expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Tensor contents could not be read back to the host.
    #[error("Tensor data error: {0}")]
    TensorData(String),

    /// Matrix values cannot describe a transform.
    #[error("Invalid matrix: {0}")]
    InvalidMatrix(String),

    /// Scale factor is zero, negative or non-finite.
    #[error("Invalid scale factor: {0}")]
    InvalidScale(f64),

    /// Slide dimensions cannot produce a positive scale factor.
    #[error("Invalid slide dimensions {width}x{height}")]
    InvalidDimensions { width: u64, height: u64 },
}
