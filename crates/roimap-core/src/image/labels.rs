//! Host-side integer label rasters.
//!
//! Chunk masks and nearest-chunk maps are queried one pixel at a time from
//! the remapping hot path, so they live in plain row-major buffers rather
//! than tensors.

use crate::error::GeometryError;
use super::metadata::ImageMetadata;

/// Label value reserved for pixels outside every chunk.
pub const BACKGROUND: u32 = 0;

/// Two-dimensional raster of integer labels, row-major with y outer.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelImage {
    labels: Vec<u32>,
    metadata: ImageMetadata<2>,
}

impl LabelImage {
    pub fn new(labels: Vec<u32>, metadata: ImageMetadata<2>) -> Result<Self, GeometryError> {
        if labels.len() != metadata.num_pixels() {
            return Err(GeometryError::ShapeMismatch {
                expected: metadata.num_pixels(),
                actual: labels.len(),
            });
        }
        Ok(Self { labels, metadata })
    }

    /// Build a label raster from rows (`rows[y][x]`) on an identity geometry.
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self, GeometryError> {
        let height = rows.len();
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut labels = Vec::with_capacity(width * height);
        for row in rows {
            if row.len() != width {
                return Err(GeometryError::ShapeMismatch {
                    expected: width * height,
                    actual: labels.len() + row.len(),
                });
            }
            labels.extend_from_slice(row);
        }
        Self::new(labels, ImageMetadata::identity([width, height])?)
    }

    pub fn width(&self) -> usize {
        self.metadata.size()[0]
    }

    pub fn height(&self) -> usize {
        self.metadata.size()[1]
    }

    pub fn metadata(&self) -> &ImageMetadata<2> {
        &self.metadata
    }

    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// Label at column `x`, row `y`.
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width() && y < self.height() {
            Some(self.labels[y * self.width() + x])
        } else {
            None
        }
    }

    /// Distinct non-background labels in ascending order.
    pub fn distinct_labels(&self) -> Vec<u32> {
        let mut labels: Vec<u32> = self
            .labels
            .iter()
            .copied()
            .filter(|&l| l != BACKGROUND)
            .collect();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    /// Copy with a band of `margin` pixels along every edge set to background.
    pub fn with_border_cleared(&self, margin: usize) -> Self {
        let (w, h) = (self.width(), self.height());
        let mut labels = self.labels.clone();
        for y in 0..h {
            for x in 0..w {
                let on_border = x < margin || y < margin || x + margin >= w || y + margin >= h;
                if on_border {
                    labels[y * w + x] = BACKGROUND;
                }
            }
        }
        Self {
            labels,
            metadata: self.metadata.clone(),
        }
    }
}
