//! Point type for representing spatial coordinates.
//!
//! A point carries no tag for the space it lives in. Callers track whether a
//! given point is a pixel index or a physical coordinate, thumbnail or full
//! resolution, reference or moving slide.

use nalgebra::Point as NaPoint;
use serde::{Deserialize, Serialize};
use super::Vector;

/// A point in D-dimensional space.
///
/// Thin wrapper around nalgebra's `Point` so the remapping code can talk
/// about points and displacements as distinct types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point<const D: usize>(pub NaPoint<f64, D>);

impl<const D: usize> Point<D> {
    /// Create a new point from coordinates.
    pub fn new(coords: [f64; D]) -> Self {
        Self(NaPoint::from(coords))
    }

    /// Create a point at the origin (all coordinates zero).
    pub fn origin() -> Self {
        Self(NaPoint::origin())
    }

    /// Convert point to a vector of coordinates.
    pub fn to_vec(&self) -> Vec<f64> {
        (0..D).map(|i| self.0.coords[i]).collect()
    }

    /// Coordinates as a fixed-size array.
    pub fn to_array(&self) -> [f64; D] {
        let mut out = [0.0; D];
        for (i, v) in out.iter_mut().enumerate() {
            *v = self.0.coords[i];
        }
        out
    }

    /// The position vector of this point.
    pub fn coords(&self) -> Vector<D> {
        Vector(self.0.coords)
    }

    /// True when every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.0.coords.iter().all(|c| c.is_finite())
    }

    /// Get the inner nalgebra point.
    pub fn inner(&self) -> &NaPoint<f64, D> {
        &self.0
    }
}

impl Point<2> {
    /// Horizontal (column) coordinate.
    pub fn x(&self) -> f64 {
        self.0.coords[0]
    }

    /// Vertical (row) coordinate.
    pub fn y(&self) -> f64 {
        self.0.coords[1]
    }
}

impl<const D: usize> std::ops::Index<usize> for Point<D> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0.coords[index]
    }
}

impl<const D: usize> std::ops::IndexMut<usize> for Point<D> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.0.coords[index]
    }
}

impl<const D: usize> std::ops::Sub for Point<D> {
    type Output = Vector<D>;

    fn sub(self, other: Self) -> Self::Output {
        Vector(self.0.coords - other.0.coords)
    }
}

impl<const D: usize> std::ops::Add<Vector<D>> for Point<D> {
    type Output = Self;

    fn add(self, vector: Vector<D>) -> Self::Output {
        Self(self.0 + vector.0)
    }
}

impl<const D: usize> std::ops::Sub<Vector<D>> for Point<D> {
    type Output = Self;

    fn sub(self, vector: Vector<D>) -> Self::Output {
        Self(self.0 - vector.0)
    }
}

impl<const D: usize> From<[f64; D]> for Point<D> {
    fn from(coords: [f64; D]) -> Self {
        Self::new(coords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Point2 = Point<2>;
    type Vector2 = Vector<2>;

    #[test]
    fn test_point_accessors() {
        let p = Point2::new([3.0, 7.0]);
        assert_eq!(p.x(), 3.0);
        assert_eq!(p.y(), 7.0);
        assert_eq!(p.to_array(), [3.0, 7.0]);
    }

    #[test]
    fn test_point_vector_arithmetic() {
        let p = Point2::new([1.0, 2.0]);
        let v = Vector2::new([0.5, -1.0]);
        assert_eq!(p + v, Point2::new([1.5, 1.0]));
        assert_eq!(p - v, Point2::new([0.5, 3.0]));
        assert_eq!((p + v) - p, v);
    }

    #[test]
    fn test_point_is_finite() {
        assert!(Point2::new([1.0, 2.0]).is_finite());
        assert!(!Point2::new([f64::NAN, 2.0]).is_finite());
    }
}
