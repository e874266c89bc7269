//! Rigid matrix transform in the registration tool's convention.
//!
//! Rigid chunk matrices are written by the registration tool in RAS world
//! coordinates, while every other quantity here lives in LPS (the raster
//! library convention). The two conventions differ by negating both axes,
//! `F = -I`. Converting a point into RAS, applying `A x + b` and converting
//! back gives
//!
//! ```text
//! F (A (F x) + b) = A x - b
//! ```
//!
//! since `F A F = A` for `F = -I`. [`mirrored_affine`] is the only place that
//! identity is spelled out; the tensor transform delegates to the same form.

use burn::tensor::backend::Backend;
use burn::tensor::{Shape, Tensor, TensorData};
use nalgebra::{Matrix2, Vector2 as NaVector2};
use crate::error::GeometryError;
use crate::spatial::Point2;
use super::trait_::Transform;

/// A 2×3 rigid matrix `[A | b]` as stored in a registration `.mat` file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidMatrix {
    linear: Matrix2<f64>,
    translation: NaVector2<f64>,
}

impl RigidMatrix {
    pub fn new(linear: [[f64; 2]; 2], translation: [f64; 2]) -> Self {
        Self {
            linear: Matrix2::new(linear[0][0], linear[0][1], linear[1][0], linear[1][1]),
            translation: NaVector2::new(translation[0], translation[1]),
        }
    }

    pub fn identity() -> Self {
        Self::new([[1.0, 0.0], [0.0, 1.0]], [0.0, 0.0])
    }

    /// Build from parsed matrix rows.
    ///
    /// Accepts a 2×3 matrix or a 3×3 homogeneous matrix; in the latter case
    /// only the top two rows are used.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, GeometryError> {
        if !(rows.len() == 2 || rows.len() == 3) || rows.iter().any(|r| r.len() != 3) {
            return Err(GeometryError::ShapeMismatch {
                expected: 6,
                actual: rows.iter().map(Vec::len).sum(),
            });
        }
        if rows.iter().flatten().any(|v| !v.is_finite()) {
            return Err(GeometryError::InvalidMatrix(
                "rigid matrix contains non-finite values".to_string(),
            ));
        }
        Ok(Self::new(
            [[rows[0][0], rows[0][1]], [rows[1][0], rows[1][1]]],
            [rows[0][2], rows[1][2]],
        ))
    }

    /// The 2×2 linear block `A`, row-major.
    pub fn linear(&self) -> [[f64; 2]; 2] {
        [
            [self.linear[(0, 0)], self.linear[(0, 1)]],
            [self.linear[(1, 0)], self.linear[(1, 1)]],
        ]
    }

    /// The translation block `b`.
    pub fn translation(&self) -> [f64; 2] {
        [self.translation[0], self.translation[1]]
    }

    /// Rows `[A | b]` as written to a `.mat` file.
    pub fn to_rows(&self) -> [[f64; 3]; 2] {
        let a = self.linear();
        let b = self.translation();
        [[a[0][0], a[0][1], b[0]], [a[1][0], a[1][1], b[1]]]
    }

    /// Textbook affine form `A x + b`, valid in the tool's own (RAS) frame.
    pub fn apply_ras(&self, point: &Point2) -> Point2 {
        let p = self.linear * point.inner().coords + self.translation;
        Point2::new([p[0], p[1]])
    }
}

/// Apply a RAS rigid matrix to an LPS point, returning an LPS point.
///
/// Computes `A x - b`.
pub fn mirrored_affine(matrix: &RigidMatrix, point: &Point2) -> Point2 {
    let p = matrix.linear * point.inner().coords - matrix.translation;
    Point2::new([p[0], p[1]])
}

/// Tensor form of [`mirrored_affine`] for batches of LPS points.
#[derive(Debug, Clone)]
pub struct MirroredRigidTransform<B: Backend> {
    matrix: RigidMatrix,
    linear_t: Tensor<B, 2>,    // [2, 2], A transposed
    translation: Tensor<B, 2>, // [1, 2]
}

impl<B: Backend> MirroredRigidTransform<B> {
    pub fn new(matrix: RigidMatrix, device: &B::Device) -> Self {
        let a = matrix.linear();
        let b = matrix.translation();
        let linear = Tensor::<B, 2>::from_data(
            TensorData::new(
                vec![a[0][0], a[0][1], a[1][0], a[1][1]],
                Shape::new([2, 2]),
            ),
            device,
        );
        let translation = Tensor::<B, 2>::from_data(
            TensorData::new(vec![b[0], b[1]], Shape::new([1, 2])),
            device,
        );
        Self {
            matrix,
            linear_t: linear.transpose(),
            translation,
        }
    }

    pub fn identity(device: &B::Device) -> Self {
        Self::new(RigidMatrix::identity(), device)
    }

    pub fn matrix(&self) -> &RigidMatrix {
        &self.matrix
    }

    /// Single-point form, identical to [`mirrored_affine`].
    pub fn transform_point(&self, point: &Point2) -> Point2 {
        mirrored_affine(&self.matrix, point)
    }
}

impl<B: Backend> Transform<B, 2> for MirroredRigidTransform<B> {
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        // Row vectors: y = x @ A^T - b
        points.matmul(self.linear_t.clone()) - self.translation.clone()
    }
}

/// Negate both axes; the LPS <-> RAS change of world convention.
pub fn flip_axes(point: &Point2) -> Point2 {
    Point2::new([-point.x(), -point.y()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;
    use proptest::prelude::*;

    type TestBackend = NdArray<f32>;

    fn rotation(theta: f64, translation: [f64; 2]) -> RigidMatrix {
        let (s, c) = theta.sin_cos();
        RigidMatrix::new([[c, -s], [s, c]], translation)
    }

    #[test]
    fn test_from_rows_accepts_2x3_and_3x3() {
        let two = RigidMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let three = RigidMatrix::from_rows(&[
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        assert_eq!(two, three);
        assert_eq!(two.linear(), [[1.0, 2.0], [4.0, 5.0]]);
        assert_eq!(two.translation(), [3.0, 6.0]);
    }

    #[test]
    fn test_from_rows_rejects_bad_shapes() {
        assert!(RigidMatrix::from_rows(&[vec![1.0, 2.0, 3.0]]).is_err());
        assert!(RigidMatrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).is_err());
        assert!(RigidMatrix::from_rows(&[vec![1.0, 0.0, f64::NAN], vec![0.0, 1.0, 0.0]]).is_err());
    }

    #[test]
    fn test_mirrored_affine_subtracts_translation() {
        let m = RigidMatrix::new([[0.0, -1.0], [1.0, 0.0]], [2.0, 3.0]);
        let p = mirrored_affine(&m, &Point2::new([1.0, 0.0]));
        assert!((p.x() - -2.0).abs() < 1e-12);
        assert!((p.y() - -2.0).abs() < 1e-12);

        let textbook = m.apply_ras(&Point2::new([1.0, 0.0]));
        assert!((textbook.x() - 2.0).abs() < 1e-12);
        assert!((textbook.y() - 4.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_mirrored_affine_equals_flip_apply_flip(
            a00 in -5.0f64..5.0, a01 in -5.0f64..5.0,
            a10 in -5.0f64..5.0, a11 in -5.0f64..5.0,
            b0 in -100.0f64..100.0, b1 in -100.0f64..100.0,
            x in -1000.0f64..1000.0, y in -1000.0f64..1000.0,
        ) {
            prop_assume!((a00 * a11 - a01 * a10).abs() > 1e-3);
            let m = RigidMatrix::new([[a00, a01], [a10, a11]], [b0, b1]);
            let p = Point2::new([x, y]);

            let shortcut = mirrored_affine(&m, &p);
            let explicit = flip_axes(&m.apply_ras(&flip_axes(&p)));

            prop_assert!((shortcut.x() - explicit.x()).abs() < 1e-9);
            prop_assert!((shortcut.y() - explicit.y()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_tensor_transform_matches_point_form() {
        let device = Default::default();
        let m = rotation(0.3, [4.0, -7.5]);
        let transform = MirroredRigidTransform::<TestBackend>::new(m, &device);

        let inputs = [[10.0, 20.0], [-3.5, 0.25], [0.0, 0.0]];
        let points = Tensor::<TestBackend, 2>::from_floats(
            [
                [inputs[0][0] as f32, inputs[0][1] as f32],
                [inputs[1][0] as f32, inputs[1][1] as f32],
                [inputs[2][0] as f32, inputs[2][1] as f32],
            ],
            &device,
        );
        let out = transform.transform_points(points).into_data();
        let slice = out.as_slice::<f32>().unwrap();

        for (i, input) in inputs.iter().enumerate() {
            let expected = transform.transform_point(&Point2::new(*input));
            assert!((slice[2 * i] as f64 - expected.x()).abs() < 1e-4);
            assert!((slice[2 * i + 1] as f64 - expected.y()).abs() < 1e-4);
        }
    }

    #[test]
    fn test_tensor_transform_is_exact_on_f64_backend() {
        let device = Default::default();
        let m = rotation(0.3, [4.0, -7.5]);
        let transform = MirroredRigidTransform::<NdArray<f64>>::new(m, &device);

        let input = Point2::new([812.123456789, -455.987654321]);
        let points = Tensor::<NdArray<f64>, 2>::from_data(
            TensorData::new(vec![input.x(), input.y()], Shape::new([1, 2])),
            &device,
        );
        let out = transform.transform_points(points).into_data().to_vec::<f64>().unwrap();
        let expected = transform.transform_point(&input);
        assert!((out[0] - expected.x()).abs() < 1e-10);
        assert!((out[1] - expected.y()).abs() < 1e-10);
    }

    #[test]
    fn test_identity_is_noop() {
        let device = Default::default();
        let transform = MirroredRigidTransform::<TestBackend>::identity(&device);
        let points = Tensor::<TestBackend, 2>::from_floats([[1.5, -2.0]], &device);
        let out = transform.transform_points(points).into_data();
        assert_eq!(out.as_slice::<f32>().unwrap(), &[1.5f32, -2.0]);
    }
}
