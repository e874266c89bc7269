//! Chained transform implementation.
//!
//! T(x) = T2(T1(x))

use burn::tensor::Tensor;
use burn::tensor::backend::Backend;
use super::trait_::Transform;
use std::marker::PhantomData;

/// Chained Transform (T2 after T1).
///
/// A chunk transform is a deformable field followed by a rigid matrix, both
/// applied in physical space.
#[derive(Debug, Clone)]
pub struct ChainedTransform<B: Backend, T1, T2, const D: usize> {
    pub first: T1,
    pub second: T2,
    _phantom: PhantomData<B>,
}

impl<B: Backend, T1, T2, const D: usize> ChainedTransform<B, T1, T2, D> {
    /// Create a new chained transform.
    ///
    /// # Arguments
    /// * `first` - The first transform to apply
    /// * `second` - The second transform to apply
    pub fn new(first: T1, second: T2) -> Self {
        Self { first, second, _phantom: PhantomData }
    }
}

impl<B: Backend, T1, T2, const D: usize> Transform<B, D> for ChainedTransform<B, T1, T2, D>
where
    T1: Transform<B, D>,
    T2: Transform<B, D>,
{
    fn transform_points(&self, points: Tensor<B, 2>) -> Tensor<B, 2> {
        let intermediate = self.first.transform_points(points);
        self.second.transform_points(intermediate)
    }
}
