//! Transform types and operations.
//!
//! Batched point transforms between physical coordinate frames: the dense
//! deformable field, the mirrored rigid matrix, and their composition.

pub mod trait_;
pub mod displacement_field;
pub mod rigid;
pub mod chained;
pub mod batch;

pub use trait_::Transform;
pub use displacement_field::DisplacementField2D;
pub use rigid::{flip_axes, mirrored_affine, MirroredRigidTransform, RigidMatrix};
pub use chained::ChainedTransform;
pub use batch::{points_to_tensor, tensor_to_points};

/// Per-chunk registration result: deformable field, then rigid matrix.
pub type ChunkTransform<B> =
    ChainedTransform<B, DisplacementField2D<B>, MirroredRigidTransform<B>, 2>;
