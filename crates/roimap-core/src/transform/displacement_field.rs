//! Dense displacement field transform.
//!
//! A deformable registration result: every pixel of the reference grid holds
//! the physical displacement to add to the physical point at that pixel.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use crate::error::GeometryError;
use crate::image::ImageMetadata;
use crate::interpolation::{Interpolator, LinearInterpolator};
use super::trait_::Transform;

/// Dense 2D displacement field.
///
/// The displacement tensor has shape `[2, H, W]`; component 0 is the x
/// displacement, component 1 the y displacement, both in physical units of
/// the field's own coordinate frame.
#[derive(Debug, Clone)]
pub struct DisplacementField2D<B: Backend> {
    displacement: Tensor<B, 3>,
    metadata: ImageMetadata<2>,
    interpolator: LinearInterpolator,
}

impl<B: Backend> DisplacementField2D<B> {
    /// Create a field from a `[2, H, W]` tensor and its geometry.
    pub fn new(displacement: Tensor<B, 3>, metadata: ImageMetadata<2>) -> Result<Self, GeometryError> {
        let [components, h, w] = displacement.dims();
        let [sx, sy] = metadata.size();
        if components != 2 || h != sy || w != sx {
            return Err(GeometryError::ShapeMismatch {
                expected: 2 * metadata.num_pixels(),
                actual: components * h * w,
            });
        }
        Ok(Self {
            displacement,
            metadata,
            interpolator: LinearInterpolator::new(),
        })
    }

    /// A field with zero displacement everywhere.
    pub fn zeros(metadata: ImageMetadata<2>, device: &B::Device) -> Self {
        let [w, h] = metadata.size();
        Self {
            displacement: Tensor::zeros([2, h, w], device),
            metadata,
            interpolator: LinearInterpolator::new(),
        }
    }

    /// Get the displacement tensor `[2, H, W]`.
    pub fn displacement(&self) -> &Tensor<B, 3> {
        &self.displacement
    }

    pub fn metadata(&self) -> &ImageMetadata<2> {
        &self.metadata
    }

    /// Bilinearly sample the displacement at continuous indices `[N, 2]`.
    ///
    /// Returns `[N, 2]` physical displacements.
    pub fn displacement_at_indices(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let [n, _] = indices.dims();
        let components: Vec<Tensor<B, 2>> = (0..2)
            .map(|c| {
                let plane = self.displacement.clone().narrow(0, c, 1).squeeze::<2>(0);
                self.interpolator
                    .interpolate(&plane, indices.clone())
                    .reshape([n, 1])
            })
            .collect();
        Tensor::cat(components, 1)
    }
}

impl<B: Backend> Transform<B, 2> for DisplacementField2D<B> {
    /// `p_warped = p + u(p)` with `p` and the result in physical space.
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let indices = self.metadata.world_to_index_tensor(points.clone());
        points + self.displacement_at_indices(indices)
    }
}
