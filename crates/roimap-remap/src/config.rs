//! Remapping configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default width, in thumbnail pixels, of the band cleared around the chunk
/// mask before the nearest-chunk map is built.
pub const DEFAULT_BORDER_MARGIN: usize = 25;

/// What to do with a point that falls off the nearest-chunk map or off the
/// displacement field of its chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfBoundsPolicy {
    /// Fail the point with [`crate::RemapError::OutOfBounds`].
    #[default]
    Reject,
    /// Use the nearest valid pixel and let interpolation clamp at the border.
    Clamp,
}

/// File names inside a registration session directory.
///
/// `{chunk}` in a template is replaced by the two-digit chunk label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionLayout {
    pub chunk_mask: String,
    pub rigid_template: String,
    pub deformable_template: String,
}

impl Default for SessionLayout {
    fn default() -> Self {
        Self {
            chunk_mask: "reference_multi_chunk.nii.gz".to_string(),
            rigid_template: "output_piecewise_rigid_{chunk}.mat".to_string(),
            deformable_template: "output_piecewise_deformable_{chunk}.nii.gz".to_string(),
        }
    }
}

impl SessionLayout {
    pub fn chunk_mask_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.chunk_mask)
    }

    pub fn rigid_path(&self, dir: &Path, chunk: u32) -> PathBuf {
        dir.join(expand_template(&self.rigid_template, chunk))
    }

    pub fn deformable_path(&self, dir: &Path, chunk: u32) -> PathBuf {
        dir.join(expand_template(&self.deformable_template, chunk))
    }
}

fn expand_template(template: &str, chunk: u32) -> String {
    template.replace("{chunk}", &format!("{:02}", chunk))
}

/// Remapping configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemapConfig {
    /// Band, in pixels, cleared around the chunk mask.
    pub border_margin: usize,
    /// Handling of points off the rasters.
    pub out_of_bounds: OutOfBoundsPolicy,
    /// Transform file naming.
    pub layout: SessionLayout,
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            border_margin: DEFAULT_BORDER_MARGIN,
            out_of_bounds: OutOfBoundsPolicy::default(),
            layout: SessionLayout::default(),
        }
    }
}

impl RemapConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cleared border width.
    pub fn with_border_margin(mut self, margin: usize) -> Self {
        self.border_margin = margin;
        self
    }

    /// Set the out-of-bounds policy.
    pub fn with_out_of_bounds(mut self, policy: OutOfBoundsPolicy) -> Self {
        self.out_of_bounds = policy;
        self
    }

    /// Set the session file layout.
    pub fn with_layout(mut self, layout: SessionLayout) -> Self {
        self.layout = layout;
        self
    }
}
