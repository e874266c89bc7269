//! Nearest-chunk assignment over the reference thumbnail.
//!
//! Every pixel of the chunk mask, background included, is given the label of
//! the chunk whose signed squared distance map is smallest there. The map is
//! built once per session and then only queried.

use rayon::prelude::*;
use roimap_core::image::{ImageMetadata, LabelImage};
use roimap_core::spatial::Point2;
use crate::config::OutOfBoundsPolicy;
use crate::distance::signed_squared_distance;
use crate::error::{RemapError, Result};

/// Dense chunk label for every pixel of the reference thumbnail.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestChunkMap {
    labels: Vec<u32>,
    width: usize,
    height: usize,
    chunks: Vec<u32>,
    metadata: ImageMetadata<2>,
}

impl NearestChunkMap {
    /// Build the map from a chunk mask after clearing `border_margin` pixels
    /// along each edge.
    ///
    /// Ties between equidistant chunks go to the lowest label.
    pub fn from_mask(mask: &LabelImage, border_margin: usize) -> Result<Self> {
        let cleaned = mask.with_border_cleared(border_margin);
        let chunks = cleaned.distinct_labels();
        if chunks.is_empty() {
            return Err(RemapError::invalid_input(format!(
                "chunk mask has no chunks left after clearing a {} pixel border",
                border_margin
            )));
        }
        let (width, height) = (cleaned.width(), cleaned.height());
        tracing::info!(
            "Building nearest chunk map: {} chunks on {}x{} pixels",
            chunks.len(),
            width,
            height
        );

        let distance_maps: Vec<Vec<f64>> = chunks
            .par_iter()
            .map(|&chunk| {
                let region: Vec<bool> = cleaned.labels().iter().map(|&l| l == chunk).collect();
                signed_squared_distance(&region, width, height)
            })
            .collect();

        let labels = (0..width * height)
            .map(|i| {
                let mut best = 0;
                for (k, map) in distance_maps.iter().enumerate().skip(1) {
                    if map[i] < distance_maps[best][i] {
                        best = k;
                    }
                }
                chunks[best]
            })
            .collect();

        Ok(Self {
            labels,
            width,
            height,
            chunks,
            metadata: mask.metadata().clone(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Chunk labels present in the map, ascending.
    pub fn chunks(&self) -> &[u32] {
        &self.chunks
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Label at integer pixel `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.labels[y * self.width + x])
        } else {
            None
        }
    }

    /// Chunk for a continuous pixel index: column `round(x)`, row `round(y)`.
    pub fn label_at(&self, point: &Point2, policy: OutOfBoundsPolicy) -> Result<u32> {
        let (col, row) = (point.x().round(), point.y().round());
        let inside = col >= 0.0
            && row >= 0.0
            && col < self.width as f64
            && row < self.height as f64;

        let (col, row) = match (inside, policy) {
            (true, _) => (col as usize, row as usize),
            (false, OutOfBoundsPolicy::Clamp) if col.is_finite() && row.is_finite() => (
                col.clamp(0.0, (self.width - 1) as f64) as usize,
                row.clamp(0.0, (self.height - 1) as f64) as usize,
            ),
            _ => {
                return Err(RemapError::OutOfBounds {
                    x: point.x(),
                    y: point.y(),
                    raster: "nearest chunk map",
                    width: self.width,
                    height: self.height,
                })
            }
        };
        Ok(self.labels[row * self.width + col])
    }

    /// The map as a label raster on the mask's geometry.
    pub fn to_label_image(&self) -> Result<LabelImage> {
        Ok(LabelImage::new(self.labels.clone(), self.metadata.clone())?)
    }
}
