//! Conversion between full-resolution slide pixels and thumbnail pixels.
//!
//! Integer pixel coordinates address pixel corners on the slide and pixel
//! centres on the thumbnail, hence the half-pixel offset. Both directions use
//! the same forward formula `(p + 0.5) * s`; upsampling passes `1 / s`.

use serde::{Deserialize, Serialize};
use crate::error::GeometryError;
use crate::spatial::Point2;

/// Longest side of a slide thumbnail, in pixels.
pub const THUMBNAIL_LONGEST_SIDE: f64 = 1000.0;

/// Per-slide factor relating full-resolution pixels to thumbnail pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingFactor(f64);

impl ScalingFactor {
    /// Wrap an explicit factor; must be positive and finite.
    pub fn new(value: f64) -> Result<Self, GeometryError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(GeometryError::InvalidScale(value))
        }
    }

    /// `1000 / max(width, height)` for a slide of the given full resolution.
    pub fn from_dimensions(width: u64, height: u64) -> Result<Self, GeometryError> {
        let longest = width.max(height);
        if width == 0 || height == 0 {
            return Err(GeometryError::InvalidDimensions { width, height });
        }
        Ok(Self(THUMBNAIL_LONGEST_SIDE / longest as f64))
    }

    /// Factor for slides without a thumbnail.
    pub fn identity() -> Self {
        Self(1.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn reciprocal(&self) -> f64 {
        1.0 / self.0
    }
}

/// `((x + 0.5) * factor, (y + 0.5) * factor)`.
#[inline]
pub fn scale_point(point: &Point2, factor: f64) -> Point2 {
    Point2::new([(point.x() + 0.5) * factor, (point.y() + 0.5) * factor])
}

/// Exact inverse of [`scale_point`] for the same factor.
#[inline]
pub fn unscale_point(point: &Point2, factor: f64) -> Point2 {
    Point2::new([point.x() / factor - 0.5, point.y() / factor - 0.5])
}

/// Widths are magnitudes and take no offset.
#[inline]
pub fn scale_width(width: f64, factor: f64) -> f64 {
    width * factor
}

/// Full-resolution slide pixel to thumbnail pixel.
pub fn to_thumbnail(point: &Point2, scale: ScalingFactor) -> Point2 {
    scale_point(point, scale.value())
}

/// Thumbnail pixel to full-resolution pixel, through the forward formula
/// with an explicit factor. Callers upsampling a slide pass
/// `scale.reciprocal()`.
pub fn to_full(point: &Point2, factor: f64) -> Point2 {
    scale_point(point, factor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_downsample_adds_half_pixel() {
        let s = ScalingFactor::new(0.5).unwrap();
        let p = to_thumbnail(&Point2::new([10.0, 10.0]), s);
        assert_eq!(p, Point2::new([5.25, 5.25]));
    }

    #[test]
    fn test_factor_from_dimensions_uses_longest_side() {
        let landscape = ScalingFactor::from_dimensions(20_000, 5_000).unwrap();
        assert!((landscape.value() - 0.05).abs() < 1e-15);
        let portrait = ScalingFactor::from_dimensions(5_000, 40_000).unwrap();
        assert!((portrait.value() - 0.025).abs() < 1e-15);
        assert_eq!(ScalingFactor::identity().value(), 1.0);
    }

    #[test]
    fn test_invalid_factors_are_rejected() {
        assert!(ScalingFactor::from_dimensions(0, 100).is_err());
        assert!(ScalingFactor::new(0.0).is_err());
        assert!(ScalingFactor::new(-1.0).is_err());
        assert!(ScalingFactor::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_width_has_no_offset() {
        assert!((scale_width(4.0, 0.1) - 0.4).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_unscale_inverts_scale(
            x in -1.0e5f64..1.0e5,
            y in -1.0e5f64..1.0e5,
            s in 1.0e-3f64..10.0,
        ) {
            let p = Point2::new([x, y]);
            let back = unscale_point(&scale_point(&p, s), s);
            prop_assert!((back.x() - x).abs() < 1e-6 * (1.0 + x.abs()));
            prop_assert!((back.y() - y).abs() < 1e-6 * (1.0 + y.abs()));
        }

        #[test]
        fn prop_forward_pair_is_a_fixed_shift(
            x in -1.0e5f64..1.0e5,
            y in -1.0e5f64..1.0e5,
            s in 1.0e-3f64..10.0,
        ) {
            // Scaling down by s and back up by 1/s through the forward
            // formula lands 0.5 + 0.5 / s past the start on both axes.
            let scale = ScalingFactor::new(s).unwrap();
            let p = Point2::new([x, y]);
            let round_trip = to_full(&to_thumbnail(&p, scale), scale.reciprocal());
            let shift = 0.5 + 0.5 / s;
            prop_assert!((round_trip.x() - x - shift).abs() < 1e-6 * (1.0 + x.abs() + shift));
            prop_assert!((round_trip.y() - y - shift).abs() < 1e-6 * (1.0 + y.abs() + shift));
        }
    }
}
