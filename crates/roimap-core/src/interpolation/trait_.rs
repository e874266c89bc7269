//! Interpolator trait for sampling values at continuous coordinates.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Samples a 2D raster at non-integer pixel indices.
///
/// # Type Parameters
/// * `B` - The Burn backend
pub trait Interpolator<B: Backend> {
    /// Interpolate values from a raster at given continuous indices.
    ///
    /// # Arguments
    /// * `data` - The source raster `[H, W]`
    /// * `indices` - The indices at which to interpolate `[Batch, 2]`, as `(x, y)`
    ///
    /// # Returns
    /// Tensor of sampled values `[Batch]`
    fn interpolate(&self, data: &Tensor<B, 2>, indices: Tensor<B, 2>) -> Tensor<B, 1>;
}
