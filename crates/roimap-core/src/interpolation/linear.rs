//! Bilinear interpolation.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};
use super::trait_::Interpolator;

/// Bilinear sampler for one `[Y, X]` plane of a displacement field.
///
/// [`DisplacementField2D`](crate::transform::DisplacementField2D) samples
/// each vector component plane through this at the continuous `(x, y)` pixel
/// index of every point in a batch. Corners are clamped to the border pixels,
/// so a point up to half a pixel outside the field reads the edge value;
/// callers that need strict bounds check
/// [`contains_continuous_index`](crate::image::ImageMetadata::contains_continuous_index)
/// first.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolator;

impl LinearInterpolator {
    pub fn new() -> Self {
        Self
    }

    /// Values at integer `(col, row)` pairs of a row-major plane of `width`
    /// columns.
    #[inline]
    fn corner<B: Backend>(
        plane: &Tensor<B, 1>,
        col: &Tensor<B, 1, Int>,
        row: &Tensor<B, 1, Int>,
        width: i32,
    ) -> Tensor<B, 1> {
        plane.clone().gather(0, row.clone() * width + col.clone())
    }
}

impl<B: Backend> Interpolator<B> for LinearInterpolator {
    fn interpolate(&self, data: &Tensor<B, 2>, indices: Tensor<B, 2>) -> Tensor<B, 1> {
        let [height, width] = data.dims();
        let [n, _] = indices.dims();
        let device = indices.device();

        let x = indices.clone().narrow(1, 0, 1).squeeze::<1>(1);
        let y = indices.narrow(1, 1, 1).squeeze::<1>(1);
        let left = x.clone().floor();
        let top = y.clone().floor();
        let fx = x - left.clone();
        let fy = y - top.clone();

        let max_col = (width - 1) as f64;
        let max_row = (height - 1) as f64;
        let col0 = left.clone().clamp(0.0, max_col).int();
        let col1 = (left + 1.0).clamp(0.0, max_col).int();
        let row0 = top.clone().clamp(0.0, max_row).int();
        let row1 = (top + 1.0).clamp(0.0, max_row).int();

        let plane = data.clone().reshape([height * width]);
        let stride = width as i32;
        let top_left = Self::corner(&plane, &col0, &row0, stride);
        let top_right = Self::corner(&plane, &col1, &row0, stride);
        let bottom_left = Self::corner(&plane, &col0, &row1, stride);
        let bottom_right = Self::corner(&plane, &col1, &row1, stride);

        let gx = Tensor::<B, 1>::ones([n], &device) - fx.clone();
        let gy = Tensor::<B, 1>::ones([n], &device) - fy.clone();
        let upper = top_left * gx.clone() + top_right * fx.clone();
        let lower = bottom_left * gx + bottom_right * fx;
        upper * gy + lower * fy
    }
}
