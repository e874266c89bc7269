//! Reference thumbnail index -> moving thumbnail index.
//!
//! For each point: pick the chunk from the nearest-chunk map, move the point
//! into the chunk field's physical space, add the sampled displacement, apply
//! the chunk's mirrored rigid matrix and read the result back as a continuous
//! index of the moving thumbnail. Points are grouped by chunk so each group
//! runs through the tensor transforms in one pass.

use burn::tensor::backend::Backend;
use roimap_core::image::ImageMetadata;
use roimap_core::spatial::Point2;
use roimap_core::transform::{points_to_tensor, tensor_to_points, Transform};
use std::collections::BTreeMap;
use crate::config::OutOfBoundsPolicy;
use crate::driver::PointMapper;
use crate::error::{RemapError, Result};
use crate::region::NearestChunkMap;
use crate::store::{ChunkTransformStore, TransformSource};

pub struct PointRemapper<B: Backend, S> {
    map: NearestChunkMap,
    store: ChunkTransformStore<B, S>,
    moving: ImageMetadata<2>,
    policy: OutOfBoundsPolicy,
    device: B::Device,
}

impl<B: Backend, S: TransformSource<B>> PointRemapper<B, S> {
    /// # Arguments
    /// * `map` - Nearest-chunk map of the reference thumbnail
    /// * `store` - Chunk transforms of the registration session
    /// * `moving` - Geometry of the moving thumbnail
    /// * `policy` - Handling of points off the map or off a chunk's field
    /// * `device` - Device the point batches are built on
    pub fn new(
        map: NearestChunkMap,
        store: ChunkTransformStore<B, S>,
        moving: ImageMetadata<2>,
        policy: OutOfBoundsPolicy,
        device: B::Device,
    ) -> Self {
        Self { map, store, moving, policy, device }
    }

    pub fn map(&self) -> &NearestChunkMap {
        &self.map
    }

    pub fn store(&self) -> &ChunkTransformStore<B, S> {
        &self.store
    }

    pub fn moving(&self) -> &ImageMetadata<2> {
        &self.moving
    }

    /// Remap a single point. The result is a continuous index, not rounded.
    pub fn remap(&self, point: Point2) -> Result<Point2> {
        self.remap_points(&[point])?
            .pop()
            .ok_or_else(|| RemapError::upstream("remapper returned no point"))
    }

    /// Remap a batch of points, keeping their order.
    ///
    /// Fails as a whole if any point fails.
    pub fn remap_points(&self, points: &[Point2]) -> Result<Vec<Point2>> {
        let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (i, point) in points.iter().enumerate() {
            let chunk = self.map.label_at(point, self.policy)?;
            groups.entry(chunk).or_default().push(i);
        }

        let mut out = vec![Point2::origin(); points.len()];
        for (chunk, members) in groups {
            let transform = self.store.get(chunk)?;
            let field_metadata = transform.first.metadata();

            let batch: Vec<Point2> = members.iter().map(|&i| points[i]).collect();
            if self.policy == OutOfBoundsPolicy::Reject {
                if let Some(p) = batch.iter().find(|p| !field_metadata.contains_continuous_index(p)) {
                    let [width, height] = field_metadata.size();
                    return Err(RemapError::OutOfBounds {
                        x: p.x(),
                        y: p.y(),
                        raster: "displacement field",
                        width,
                        height,
                    });
                }
            }

            let indices = points_to_tensor::<B>(&batch, &self.device);
            let physical = field_metadata.index_to_world_tensor(indices);
            let mapped = transform.transform_points(physical);
            let moving_indices = self.moving.world_to_index_tensor(mapped);

            let remapped = tensor_to_points(moving_indices)?;
            for (&i, p) in members.iter().zip(remapped) {
                out[i] = p;
            }
            tracing::debug!("Remapped {} points through chunk {:02}", members.len(), chunk);
        }
        Ok(out)
    }
}

impl<B: Backend, S: TransformSource<B>> PointMapper for PointRemapper<B, S> {
    fn map_points(&self, points: &[Point2]) -> Result<Vec<Point2>> {
        self.remap_points(points)
    }
}
