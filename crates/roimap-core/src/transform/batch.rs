//! Conversion between host point lists and `[N, 2]` point tensors.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use crate::error::GeometryError;
use crate::spatial::Point2;

/// Pack points into a `[N, 2]` tensor, one `(x, y)` row per point.
pub fn points_to_tensor<B: Backend>(points: &[Point2], device: &B::Device) -> Tensor<B, 2> {
    let data: Vec<f64> = points.iter().flat_map(|p| [p.x(), p.y()]).collect();
    Tensor::<B, 2>::from_data(TensorData::new(data, Shape::new([points.len(), 2])), device)
}

/// Unpack a `[N, 2]` tensor into points.
pub fn tensor_to_points<B: Backend>(tensor: Tensor<B, 2>) -> Result<Vec<Point2>, GeometryError> {
    let [n, d] = tensor.dims();
    if d != 2 {
        return Err(GeometryError::ShapeMismatch { expected: n * 2, actual: n * d });
    }
    let values = tensor
        .into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .map_err(|e| GeometryError::TensorData(format!("{:?}", e)))?;
    Ok(values.chunks_exact(2).map(|c| Point2::new([c[0], c[1]])).collect())
}
