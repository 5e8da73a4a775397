//! Persisted unit lists
//!
//! A listing crawl saves its unit list so that a later run can start the
//! detail crawl directly. Two encodings are read: a JSON array (`.json`)
//! and plain line-delimited text (anything else). Saving always writes the
//! JSON form, which keeps both order and element type.

use crate::units::WorkUnit;
use crate::{Result, TrawlError};
use std::path::Path;

/// Writes a unit list to `path` as a JSON array, replacing any previous file
pub fn save_units(path: &Path, units: &[WorkUnit]) -> Result<()> {
    let encoded = serde_json::to_string(units)
        .map_err(|e| TrawlError::InvalidArgument(format!("Cannot encode unit list: {}", e)))?;
    std::fs::write(path, encoded)?;
    tracing::debug!("Saved {} units to {}", units.len(), path.display());
    Ok(())
}

/// Reads a unit list previously written by `save_units` or by hand
///
/// Order and duplicates are preserved exactly as stored.
pub fn load_units(path: &Path) -> Result<Vec<WorkUnit>> {
    let content = std::fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let units = if is_json {
        serde_json::from_str::<Vec<WorkUnit>>(&content).map_err(|e| {
            TrawlError::InvalidArgument(format!(
                "Unit list {} is not a JSON array of ids/names: {}",
                path.display(),
                e
            ))
        })?
    } else {
        content.lines().filter_map(WorkUnit::parse_line).collect()
    };

    tracing::info!("Loaded {} units from {}", units.len(), path.display());
    Ok(units)
}
