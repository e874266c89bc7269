//! Annotation server seam and slide-level batch remapping.
//!
//! The remapper never talks to a server directly: callers hand in an
//! [`AnnotationClient`]. [`JsonStoreClient`] keeps the same data in a local
//! JSON document.

use roimap_core::roi::RoiRecord;
use roimap_core::scaling::ScalingFactor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use crate::driver::{transform_roi, PointMapper};
use crate::error::{RemapError, Result};

/// Access to slides and their ROIs on an annotation server.
pub trait AnnotationClient {
    /// Full-resolution `(width, height)` of a slide, in pixels.
    fn slide_dimensions(&self, slide: &str) -> Result<(u64, u64)>;

    /// Whether the slide has a thumbnail. ROIs on slides without one are
    /// already in thumbnail-sized coordinates.
    fn has_thumbnail(&self, _slide: &str) -> Result<bool> {
        Ok(true)
    }

    /// Every ROI record on a slide.
    fn list_rois(&self, slide: &str) -> Result<Vec<RoiRecord>>;

    /// Add one ROI to a slide.
    fn create_roi(&mut self, slide: &str, label: &str, record: &RoiRecord) -> Result<()>;

    /// Remove every ROI from a slide.
    fn delete_rois(&mut self, slide: &str) -> Result<()>;
}

/// One slide in a [`JsonStoreClient`] document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideEntry {
    /// `[width, height]` at full resolution.
    pub dimensions: [u64; 2],
    #[serde(default = "default_thumbnail")]
    pub thumbnail: bool,
    #[serde(default)]
    pub rois: Vec<RoiRecord>,
}

fn default_thumbnail() -> bool {
    true
}

/// `{"slides": {"<id>": {"dimensions": [w, h], "rois": [...]}}}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationStore {
    #[serde(default)]
    pub slides: BTreeMap<String, SlideEntry>,
}

/// File-backed [`AnnotationClient`]. Every mutation is written through.
#[derive(Debug)]
pub struct JsonStoreClient {
    path: PathBuf,
    store: AnnotationStore,
}

impl JsonStoreClient {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = fs::read_to_string(&path).map_err(|e| {
            RemapError::upstream(format!("Failed to read annotation store {}: {}", path.display(), e))
        })?;
        let store = serde_json::from_str(&text).map_err(|e| {
            RemapError::upstream(format!("Invalid annotation store {}: {}", path.display(), e))
        })?;
        Ok(Self { path, store })
    }

    /// Create a store file holding `store`.
    pub fn create(path: impl Into<PathBuf>, store: AnnotationStore) -> Result<Self> {
        let client = Self { path: path.into(), store };
        client.save()?;
        Ok(client)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    fn save(&self) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.store)
            .map_err(|e| RemapError::upstream(format!("Failed to serialize annotation store: {}", e)))?;
        fs::write(&self.path, text).map_err(|e| {
            RemapError::upstream(format!("Failed to write annotation store {}: {}", self.path.display(), e))
        })
    }

    fn slide(&self, slide: &str) -> Result<&SlideEntry> {
        self.store
            .slides
            .get(slide)
            .ok_or_else(|| RemapError::upstream(format!("Unknown slide {}", slide)))
    }

    fn slide_mut(&mut self, slide: &str) -> Result<&mut SlideEntry> {
        self.store
            .slides
            .get_mut(slide)
            .ok_or_else(|| RemapError::upstream(format!("Unknown slide {}", slide)))
    }
}

impl AnnotationClient for JsonStoreClient {
    fn slide_dimensions(&self, slide: &str) -> Result<(u64, u64)> {
        let [w, h] = self.slide(slide)?.dimensions;
        Ok((w, h))
    }

    fn has_thumbnail(&self, slide: &str) -> Result<bool> {
        Ok(self.slide(slide)?.thumbnail)
    }

    fn list_rois(&self, slide: &str) -> Result<Vec<RoiRecord>> {
        Ok(self.slide(slide)?.rois.clone())
    }

    fn create_roi(&mut self, slide: &str, label: &str, record: &RoiRecord) -> Result<()> {
        let mut record = record.clone();
        record.label = label.to_string();
        self.slide_mut(slide)?.rois.push(record);
        self.save()
    }

    fn delete_rois(&mut self, slide: &str) -> Result<()> {
        self.slide_mut(slide)?.rois.clear();
        self.save()
    }
}

/// Thumbnail scale of a slide from its full-resolution dimensions, or 1
/// when the slide has no thumbnail.
pub fn slide_scale<C: AnnotationClient + ?Sized>(client: &C, slide: &str) -> Result<ScalingFactor> {
    if !client.has_thumbnail(slide)? {
        return Ok(ScalingFactor::identity());
    }
    let (w, h) = client.slide_dimensions(slide)?;
    Ok(ScalingFactor::from_dimensions(w, h)?)
}

/// Replace the ROIs of `moving` with the remapped ROIs of `fixed`.
///
/// Every ROI is transformed before anything is written, so a failure leaves
/// the moving slide as it was. Returns the number of ROIs created.
pub fn remap_slide_rois<C, M>(client: &mut C, fixed: &str, moving: &str, mapper: &M) -> Result<usize>
where
    C: AnnotationClient + ?Sized,
    M: PointMapper + ?Sized,
{
    let reference_scale = slide_scale(&*client, fixed)?;
    let moving_scale = slide_scale(&*client, moving)?;
    tracing::info!(
        "Remapping ROIs from slide {} (scale {:.6}) to slide {} (scale {:.6})",
        fixed,
        reference_scale.value(),
        moving,
        moving_scale.value()
    );

    let remapped = client
        .list_rois(fixed)?
        .iter()
        .map(|record| -> Result<RoiRecord> {
            let roi = record.to_roi()?;
            let moved = transform_roi(&roi, reference_scale, moving_scale, mapper)?;
            Ok(record.with_roi(&moved))
        })
        .collect::<Result<Vec<_>>>()?;

    client.delete_rois(moving)?;
    for record in &remapped {
        client.create_roi(moving, &record.label, record)?;
        tracing::info!("Created ROI {} on slide {}", record.label, moving);
    }
    Ok(remapped.len())
}
