//! Per-chunk transform loading and caching.

use burn::tensor::backend::Backend;
use roimap_core::transform::{ChunkTransform, MirroredRigidTransform};
use roimap_io::{read_displacement_field, read_rigid_matrix};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use crate::config::SessionLayout;
use crate::error::{RemapError, Result};

/// Something that can produce the transform pair of a chunk.
pub trait TransformSource<B: Backend> {
    /// Load the deformable field and rigid matrix of `chunk`.
    fn load(&self, chunk: u32) -> Result<ChunkTransform<B>>;
}

/// Reads chunk transforms from a registration session directory.
#[derive(Debug, Clone)]
pub struct DirectorySource<B: Backend> {
    dir: PathBuf,
    layout: SessionLayout,
    device: B::Device,
}

impl<B: Backend> DirectorySource<B> {
    pub fn new(dir: impl Into<PathBuf>, layout: SessionLayout, device: B::Device) -> Self {
        Self { dir: dir.into(), layout, device }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn require_file(chunk: u32, path: PathBuf) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(RemapError::MissingTransform { chunk, path })
    }
}

impl<B: Backend> TransformSource<B> for DirectorySource<B> {
    fn load(&self, chunk: u32) -> Result<ChunkTransform<B>> {
        let rigid_path = require_file(chunk, self.layout.rigid_path(&self.dir, chunk))?;
        let deformable_path = require_file(chunk, self.layout.deformable_path(&self.dir, chunk))?;

        let rigid = read_rigid_matrix(&rigid_path)
            .map_err(|e| RemapError::upstream(format!("{:#}", e)))?;
        let field = read_displacement_field::<B, _>(&deformable_path, &self.device)
            .map_err(|e| RemapError::upstream(format!("{:#}", e)))?;

        Ok(ChunkTransform::new(field, MirroredRigidTransform::new(rigid, &self.device)))
    }
}

/// Memoizes a [`TransformSource`] by chunk label.
///
/// Each label is loaded at most once for the lifetime of the store.
pub struct ChunkTransformStore<B: Backend, S> {
    source: S,
    cache: Mutex<HashMap<u32, Arc<ChunkTransform<B>>>>,
}

impl<B: Backend, S: TransformSource<B>> ChunkTransformStore<B, S> {
    pub fn new(source: S) -> Self {
        Self { source, cache: Mutex::new(HashMap::new()) }
    }

    /// Transform pair of `chunk`, loading it on first use.
    pub fn get(&self, chunk: u32) -> Result<Arc<ChunkTransform<B>>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| RemapError::upstream("chunk transform cache lock poisoned"))?;
        if let Some(transform) = cache.get(&chunk) {
            return Ok(Arc::clone(transform));
        }
        tracing::debug!("Loading transforms for chunk {:02}", chunk);
        let transform = Arc::new(self.source.load(chunk)?);
        cache.insert(chunk, Arc::clone(&transform));
        Ok(transform)
    }

    /// Number of chunks loaded so far.
    pub fn loaded_chunks(&self) -> usize {
        self.cache.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
