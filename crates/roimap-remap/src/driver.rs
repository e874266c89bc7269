//! Full-resolution ROI on the reference slide -> full-resolution ROI on the
//! moving slide.

use roimap_core::roi::Roi;
use roimap_core::scaling::ScalingFactor;
use roimap_core::spatial::Point2;
use crate::error::Result;

/// Maps reference thumbnail indices to moving thumbnail indices.
pub trait PointMapper {
    /// Map every point, keeping order and count.
    fn map_points(&self, points: &[Point2]) -> Result<Vec<Point2>>;
}

impl<F> PointMapper for F
where
    F: Fn(Point2) -> Result<Point2>,
{
    fn map_points(&self, points: &[Point2]) -> Result<Vec<Point2>> {
        points.iter().map(|p| self(*p)).collect()
    }
}

/// Move one ROI from the reference slide to the moving slide.
///
/// Positions are scaled down with `reference_scale`, remapped, and scaled up
/// with `1 / moving_scale`, each scaling as `(p + 0.5) * s`. Trapezoid widths
/// skip the remap and are scaled by both factors.
pub fn transform_roi<M: PointMapper + ?Sized>(
    roi: &Roi,
    reference_scale: ScalingFactor,
    moving_scale: ScalingFactor,
    mapper: &M,
) -> Result<Roi> {
    let thumbnail = roi.scaled(reference_scale.value());
    let remapped = mapper.map_points(&thumbnail.positions())?;
    let moved = thumbnail.with_positions(remapped)?;
    Ok(moved.scaled(moving_scale.reciprocal()))
}

/// Move a batch of ROIs; any failure fails the whole batch.
pub fn transform_rois<M: PointMapper + ?Sized>(
    rois: &[Roi],
    reference_scale: ScalingFactor,
    moving_scale: ScalingFactor,
    mapper: &M,
) -> Result<Vec<Roi>> {
    rois.iter()
        .map(|roi| transform_roi(roi, reference_scale, moving_scale, mapper))
        .collect()
}
