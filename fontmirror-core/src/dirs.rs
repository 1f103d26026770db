//! Directory provisioning and whole-file writes for the cache tree.

use std::fs;
use std::io;
use std::path::Path;

/// Create `path` (and parents) if it does not exist yet.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path)?;
    log::debug!("created directory {}", path.display());
    Ok(())
}

/// Overwrite `path` with `contents`, creating the parent directory first.
pub fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
}

/// True when `path` exists and holds at least one byte.
pub fn is_nonempty_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file() && m.len() > 0).unwrap_or(false)
}
