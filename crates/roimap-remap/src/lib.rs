//! Remapping of slide ROIs through a chunked deformable + rigid
//! registration.
//!
//! A [`RemapSession`] builds the nearest-chunk map of the reference
//! thumbnail once, loads chunk transforms on demand and exposes a
//! [`PointRemapper`] that [`transform_roi`] drives vertex batches through.

pub mod error;
pub mod config;
pub mod distance;
pub mod region;
pub mod store;
pub mod remapper;
pub mod driver;
pub mod annotation;
pub mod session;

pub use error::{RemapError, Result};
pub use config::{OutOfBoundsPolicy, RemapConfig, SessionLayout};
pub use region::NearestChunkMap;
pub use store::{ChunkTransformStore, DirectorySource, TransformSource};
pub use remapper::PointRemapper;
pub use driver::{transform_roi, transform_rois, PointMapper};
pub use annotation::{remap_slide_rois, AnnotationClient, JsonStoreClient};
pub use session::RemapSession;
