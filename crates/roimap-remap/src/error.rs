//! Error types for remapping operations.
//!
//! Each failure class is a distinct variant so callers can tell a bad ROI
//! record from an incomplete registration run or an off-raster point.

use roimap_core::roi::RoiError;
use roimap_core::GeometryError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for remapping operations.
#[derive(Error, Debug)]
pub enum RemapError {
    /// Malformed ROI record, empty chunk mask or invalid geometry.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The registration run produced no transform file for a chunk.
    #[error("Missing transform for chunk {chunk:02}: {}", path.display())]
    MissingTransform { chunk: u32, path: PathBuf },

    /// A point fell outside a raster it had to be looked up in.
    #[error("Point ({x}, {y}) is outside the {raster} ({width}x{height})")]
    OutOfBounds {
        x: f64,
        y: f64,
        raster: &'static str,
        width: usize,
        height: usize,
    },

    /// Failure reported by a file read or an external client.
    #[error("Upstream error: {0}")]
    Upstream(String),
}

/// Result type for remapping operations.
pub type Result<T> = std::result::Result<T, RemapError>;

impl RemapError {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an upstream error.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }
}

impl From<RoiError> for RemapError {
    fn from(err: RoiError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<GeometryError> for RemapError {
    fn from(err: GeometryError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
