//! Image types and operations.
//!
//! Raster geometry and host-side label rasters for chunk masks.

pub mod metadata;
pub mod labels;

pub use metadata::ImageMetadata;
pub use labels::{LabelImage, BACKGROUND};
