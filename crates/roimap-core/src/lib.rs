//! Core types for remapping slide annotations between registered images.
//!
//! Spatial primitives, raster geometry, batched transforms, the ROI model
//! and the thumbnail scaler.

pub mod error;
pub mod image;
pub mod spatial;
pub mod transform;
pub mod interpolation;
pub mod roi;
pub mod scaling;

pub use error::GeometryError;
pub use image::{ImageMetadata, LabelImage};
pub use spatial::{Direction, Point, Point2, Spacing, Vector};
pub use roi::{Roi, RoiError, RoiGeometry, RoiRecord, TrapezoidVertex};
pub use scaling::ScalingFactor;
