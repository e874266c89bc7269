//! One registration session: chunk mask, chunk transforms and the moving
//! thumbnail geometry, wired into a [`PointRemapper`].

use burn::tensor::backend::Backend;
use roimap_io::{read_image_geometry, read_label_image};
use std::path::{Path, PathBuf};
use crate::annotation::{remap_slide_rois, AnnotationClient};
use crate::config::RemapConfig;
use crate::error::{RemapError, Result};
use crate::region::NearestChunkMap;
use crate::remapper::PointRemapper;
use crate::store::{ChunkTransformStore, DirectorySource};

pub struct RemapSession<B: Backend> {
    registration_dir: PathBuf,
    config: RemapConfig,
    remapper: PointRemapper<B, DirectorySource<B>>,
}

impl<B: Backend> RemapSession<B> {
    /// Read the chunk mask and moving thumbnail geometry and build the
    /// nearest-chunk map. Chunk transforms are loaded on first use.
    pub fn open(
        registration_dir: impl AsRef<Path>,
        moving_thumbnail: impl AsRef<Path>,
        config: RemapConfig,
        device: B::Device,
    ) -> Result<Self> {
        let registration_dir = registration_dir.as_ref().to_path_buf();
        let mask_path = config.layout.chunk_mask_path(&registration_dir);
        tracing::info!("Opening registration session {}", registration_dir.display());

        let mask = read_label_image(&mask_path).map_err(|e| RemapError::upstream(format!("{:#}", e)))?;
        let moving = read_image_geometry(moving_thumbnail.as_ref())
            .map_err(|e| RemapError::upstream(format!("{:#}", e)))?;
        let map = NearestChunkMap::from_mask(&mask, config.border_margin)?;

        let source = DirectorySource::new(registration_dir.clone(), config.layout.clone(), device.clone());
        let remapper = PointRemapper::new(
            map,
            ChunkTransformStore::new(source),
            moving,
            config.out_of_bounds,
            device,
        );
        Ok(Self { registration_dir, config, remapper })
    }

    pub fn registration_dir(&self) -> &Path {
        &self.registration_dir
    }

    pub fn config(&self) -> &RemapConfig {
        &self.config
    }

    pub fn remapper(&self) -> &PointRemapper<B, DirectorySource<B>> {
        &self.remapper
    }

    pub fn nearest_chunk_map(&self) -> &NearestChunkMap {
        self.remapper.map()
    }

    /// Replace the ROIs of `moving` with the remapped ROIs of `fixed`.
    pub fn remap_slide<C: AnnotationClient + ?Sized>(
        &self,
        client: &mut C,
        fixed: &str,
        moving: &str,
    ) -> Result<usize> {
        remap_slide_rois(client, fixed, moving, &self.remapper)
    }
}
