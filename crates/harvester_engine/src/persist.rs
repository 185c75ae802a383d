use std::fs;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::HarvestError;

/// Ensure output directory exists and is writable; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), HarvestError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| HarvestError::io(dir, e))?;
        if !meta.is_dir() {
            return Err(HarvestError::io(dir, "path is not a directory"));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| HarvestError::io(dir, e))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| HarvestError::io(dir, e))?;
    Ok(())
}
