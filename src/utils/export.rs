use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::errors::{PipelineError, PipelineResult};

/// Serialize without extraneous whitespace.
pub fn to_compact_json<T: Serialize + ?Sized>(value: &T) -> PipelineResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

/// Replace `path` with the compact JSON form of `value`.
///
/// The bytes go to a temporary file in the same directory which is then
/// renamed over the target, so readers see either the old or the new file.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> PipelineResult<()> {
    let bytes = to_compact_json(value)?;
    write_bytes(&bytes, path)
}

pub fn write_bytes(bytes: &[u8], path: &Path) -> PipelineResult<()> {
    let write_err = |message: String| PipelineError::Write {
        path: path.to_path_buf(),
        message,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| write_err(format!("Cannot create temp file: {}", e)))?;
    tmp.write_all(bytes).map_err(|e| write_err(e.to_string()))?;
    tmp.flush().map_err(|e| write_err(e.to_string()))?;
    tmp.persist(path).map_err(|e| write_err(e.error.to_string()))?;
    Ok(())
}
