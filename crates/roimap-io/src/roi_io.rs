//! ROI exchange records as JSON.

use anyhow::{Context, Result};
use roimap_core::roi::RoiRecord;
use std::fs;
use std::path::Path;

/// Read a JSON array of ROI records.
pub fn read_roi_records<P: AsRef<Path>>(path: P) -> Result<Vec<RoiRecord>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ROI file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid ROI JSON in {}", path.display()))
}

/// Write ROI records as a pretty-printed JSON array.
pub fn write_roi_records<P: AsRef<Path>>(path: P, records: &[RoiRecord]) -> Result<()> {
    let path = path.as_ref();
    let text = serde_json::to_string_pretty(records).context("Failed to serialize ROI records")?;
    fs::write(path, text).with_context(|| format!("Failed to write ROI file {}", path.display()))
}
