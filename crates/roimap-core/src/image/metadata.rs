//! Image geometry: size, origin, spacing and direction.
//!
//! Index order follows the physical axes: `index[0]` is the column (x) and
//! `index[1]` is the row (y). Pixel buffers are stored row-major with y as the
//! outer axis, so a raster of size `[w, h]` is a tensor of shape `[h, w]`.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use crate::error::GeometryError;
use crate::spatial::{Direction, Point, Spacing, Vector};

/// Physical space description of a raster.
///
/// The inverse direction is computed once at construction, so coordinate
/// conversions are infallible afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata<const D: usize> {
    /// Number of pixels along each axis, in index order (x first).
    size: [usize; D],
    /// Physical coordinate of the first pixel (index 0, 0, ...).
    origin: Point<D>,
    /// Physical distance between pixels along each axis.
    spacing: Spacing<D>,
    /// Orientation of the image axes.
    direction: Direction<D>,
    inverse_direction: Direction<D>,
}

impl<const D: usize> ImageMetadata<D> {
    /// Create new image metadata.
    ///
    /// Fails if the raster is empty, the spacing is not strictly positive or
    /// the direction matrix is singular.
    pub fn new(
        size: [usize; D],
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
    ) -> Result<Self, GeometryError> {
        if size.iter().any(|&s| s == 0) {
            return Err(GeometryError::EmptyRaster(size.to_vec()));
        }
        if !spacing.is_valid() {
            return Err(GeometryError::InvalidSpacing(spacing.to_vec()));
        }
        let inverse_direction = direction
            .try_inverse()
            .ok_or(GeometryError::SingularDirection)?;

        Ok(Self {
            size,
            origin,
            spacing,
            direction,
            inverse_direction,
        })
    }

    /// Unit spacing, zero origin, identity direction.
    pub fn identity(size: [usize; D]) -> Result<Self, GeometryError> {
        Self::new(size, Point::origin(), Spacing::uniform(1.0), Direction::identity())
    }

    /// Same geometry with a different size.
    pub fn with_size(&self, size: [usize; D]) -> Result<Self, GeometryError> {
        Self::new(size, self.origin, self.spacing, self.direction)
    }

    pub fn size(&self) -> [usize; D] {
        self.size
    }

    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    pub fn spacing(&self) -> &Spacing<D> {
        &self.spacing
    }

    pub fn direction(&self) -> &Direction<D> {
        &self.direction
    }

    /// Total number of pixels.
    pub fn num_pixels(&self) -> usize {
        self.size.iter().product()
    }

    /// `point = origin + Direction * (index * spacing)`
    pub fn transform_continuous_index_to_physical_point(&self, index: &Point<D>) -> Point<D> {
        let mut scaled_index = Vector::<D>::zeros();
        for i in 0..D {
            scaled_index[i] = index[i] * self.spacing[i];
        }
        self.origin + self.direction * scaled_index
    }

    /// `index = (Direction^-1 * (point - origin)) / spacing`
    pub fn transform_physical_point_to_continuous_index(&self, point: &Point<D>) -> Point<D> {
        let rotated = self.inverse_direction * (*point - self.origin);
        let mut index = Point::<D>::origin();
        for i in 0..D {
            index[i] = rotated[i] / self.spacing[i];
        }
        index
    }

    /// True when a continuous index falls on the raster, counting the half
    /// pixel around every border pixel centre.
    pub fn contains_continuous_index(&self, index: &Point<D>) -> bool {
        (0..D).all(|i| index[i] >= -0.5 && index[i] <= self.size[i] as f64 - 0.5)
    }

    /// Row-major matrix `M` (D×D) and offset `o` such that
    /// `physical = index @ M + o` for row vectors.
    pub fn index_to_physical_rows(&self) -> (Vec<f64>, [f64; D]) {
        let mut m = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                m.push(self.spacing[r] * self.direction[(c, r)]);
            }
        }
        (m, self.origin.to_array())
    }

    /// Row-major matrix `T` (D×D) such that
    /// `index = (physical - origin) @ T` for row vectors.
    pub fn physical_to_index_rows(&self) -> (Vec<f64>, [f64; D]) {
        let mut t = Vec::with_capacity(D * D);
        for r in 0..D {
            for c in 0..D {
                t.push(self.inverse_direction[(c, r)] / self.spacing[c]);
            }
        }
        (t, self.origin.to_array())
    }

    /// Batch transform continuous indices to physical points.
    ///
    /// # Arguments
    /// * `indices` - A tensor of shape `[Batch, D]` containing continuous indices
    ///
    /// # Returns
    /// A tensor of shape `[Batch, D]` containing physical points
    pub fn index_to_world_tensor<B: Backend>(&self, indices: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = indices.device();
        let (m, origin) = self.index_to_physical_rows();

        // P = O + I @ M
        let m_tensor = matrix_tensor::<B, D>(m, &device);
        let origin_tensor = row_tensor::<B, D>(&origin, &device);
        indices.matmul(m_tensor) + origin_tensor
    }

    /// Batch transform physical points to continuous indices.
    pub fn world_to_index_tensor<B: Backend>(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let device = points.device();
        let (t, origin) = self.physical_to_index_rows();

        // I = (P - O) @ T
        let t_tensor = matrix_tensor::<B, D>(t, &device);
        let origin_tensor = row_tensor::<B, D>(&origin, &device);
        (points - origin_tensor).matmul(t_tensor)
    }
}

fn matrix_tensor<B: Backend, const D: usize>(values: Vec<f64>, device: &B::Device) -> Tensor<B, 2> {
    Tensor::<B, 2>::from_data(TensorData::new(values, Shape::new([D, D])), device)
}

fn row_tensor<B: Backend, const D: usize>(values: &[f64; D], device: &B::Device) -> Tensor<B, 2> {
    Tensor::<B, 2>::from_data(TensorData::new(values.to_vec(), Shape::new([1, D])), device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type Point2 = Point<2>;
    type Spacing2 = Spacing<2>;
    type Direction2 = Direction<2>;

    #[test]
    fn test_identity_geometry_maps_index_to_itself() {
        let meta = ImageMetadata::<2>::identity([10, 20]).unwrap();
        let p = Point2::new([3.5, 7.25]);
        assert_eq!(meta.transform_continuous_index_to_physical_point(&p), p);
        assert_eq!(meta.transform_physical_point_to_continuous_index(&p), p);
        assert_eq!(meta.num_pixels(), 200);
    }

    #[test]
    fn test_lps_geometry() {
        // Typical slide thumbnail read through an LPS-oriented reader.
        let meta = ImageMetadata::new(
            [100, 80],
            Point2::new([-0.0, -0.0]),
            Spacing2::new([0.04, 0.04]),
            Direction2::from_row_major([[-1.0, 0.0], [0.0, -1.0]]),
        )
        .unwrap();

        let phys = meta.transform_continuous_index_to_physical_point(&Point2::new([10.0, 5.0]));
        assert!((phys[0] + 0.4).abs() < 1e-12);
        assert!((phys[1] + 0.2).abs() < 1e-12);

        let idx = meta.transform_physical_point_to_continuous_index(&phys);
        assert!((idx[0] - 10.0).abs() < 1e-9);
        assert!((idx[1] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_metadata_is_rejected() {
        let origin = Point2::origin();
        assert_eq!(
            ImageMetadata::new([0, 5], origin, Spacing2::uniform(1.0), Direction2::identity()),
            Err(GeometryError::EmptyRaster(vec![0, 5]))
        );
        assert!(matches!(
            ImageMetadata::new([5, 5], origin, Spacing2::new([1.0, 0.0]), Direction2::identity()),
            Err(GeometryError::InvalidSpacing(_))
        ));
        assert_eq!(
            ImageMetadata::new(
                [5, 5],
                origin,
                Spacing2::uniform(1.0),
                Direction2::from_row_major([[1.0, 1.0], [1.0, 1.0]])
            ),
            Err(GeometryError::SingularDirection)
        );
    }

    #[test]
    fn test_contains_continuous_index() {
        let meta = ImageMetadata::<2>::identity([4, 3]).unwrap();
        assert!(meta.contains_continuous_index(&Point2::new([-0.5, 2.5])));
        assert!(meta.contains_continuous_index(&Point2::new([3.4, 0.0])));
        assert!(!meta.contains_continuous_index(&Point2::new([3.6, 0.0])));
        assert!(!meta.contains_continuous_index(&Point2::new([0.0, -0.7])));
    }

    #[test]
    fn test_row_matrices_match_point_conversions() {
        let meta = ImageMetadata::new(
            [8, 8],
            Point2::new([2.0, -3.0]),
            Spacing2::new([0.5, 2.0]),
            Direction2::from_row_major([[0.0, -1.0], [1.0, 0.0]]),
        )
        .unwrap();
        let index = Point2::new([1.5, 2.0]);
        let expected = meta.transform_continuous_index_to_physical_point(&index);

        let (m, o) = meta.index_to_physical_rows();
        let px = index[0] * m[0] + index[1] * m[2] + o[0];
        let py = index[0] * m[1] + index[1] * m[3] + o[1];
        assert!((px - expected[0]).abs() < 1e-12);
        assert!((py - expected[1]).abs() < 1e-12);

        let (t, o) = meta.physical_to_index_rows();
        let dx = expected[0] - o[0];
        let dy = expected[1] - o[1];
        let ix = dx * t[0] + dy * t[2];
        let iy = dx * t[1] + dy * t[3];
        assert!((ix - index[0]).abs() < 1e-12);
        assert!((iy - index[1]).abs() < 1e-12);
    }

    #[test]
    fn test_tensor_conversions_match_point_conversions() {
        let device = Default::default();
        let meta = ImageMetadata::new(
            [10, 6],
            Point2::new([5.0, -2.0]),
            Spacing2::new([0.5, 0.25]),
            Direction2::from_row_major([[0.0, -1.0], [1.0, 0.0]]),
        )
        .unwrap();

        let index = Point2::new([3.0, 1.5]);
        let expected = meta.transform_continuous_index_to_physical_point(&index);

        let indices = Tensor::<NdArray<f32>, 2>::from_floats([[3.0, 1.5]], &device);
        let world = meta.index_to_world_tensor(indices);
        let world_data = world.clone().into_data();
        let world_slice = world_data.as_slice::<f32>().unwrap();
        assert!((world_slice[0] as f64 - expected[0]).abs() < 1e-5);
        assert!((world_slice[1] as f64 - expected[1]).abs() < 1e-5);

        let back = meta.world_to_index_tensor(world).into_data();
        let back_slice = back.as_slice::<f32>().unwrap();
        assert!((back_slice[0] - 3.0).abs() < 1e-5);
        assert!((back_slice[1] - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_tensor_conversions_keep_f64_precision() {
        let device = Default::default();
        let meta = ImageMetadata::new(
            [1000, 800],
            Point2::new([-12345.678901, 2345.123456]),
            Spacing2::new([0.0123456789, 0.0123456789]),
            Direction2::from_row_major([[-1.0, 0.0], [0.0, -1.0]]),
        )
        .unwrap();

        let index = Point2::new([123.456789, 654.321987]);
        let indices = Tensor::<NdArray<f64>, 2>::from_data(
            TensorData::new(vec![index.x(), index.y()], Shape::new([1, 2])),
            &device,
        );
        let back = meta
            .world_to_index_tensor(meta.index_to_world_tensor(indices))
            .into_data()
            .to_vec::<f64>()
            .unwrap();
        assert!((back[0] - index.x()).abs() < 1e-9);
        assert!((back[1] - index.y()).abs() < 1e-9);
    }
}
