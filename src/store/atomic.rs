use crate::core::{RatesError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Replaces `path` with `contents` in a single rename.
///
/// The bytes go to a temp file in the same directory first. If anything fails
/// before the rename the temp file is dropped (and removed), so readers only
/// ever see the old or the new complete file.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| RatesError::io(dir, e))?;

    let mut file = NamedTempFile::new_in(dir).map_err(|e| RatesError::io(dir, e))?;
    if let Err(e) = write_and_sync(&mut file, contents) {
        return Err(RatesError::io(file.path(), e));
    }
    file.persist(path).map_err(|e| RatesError::io(path, e.error))?;
    Ok(())
}

fn write_and_sync(file: &mut NamedTempFile, contents: &[u8]) -> std::io::Result<()> {
    file.write_all(contents)?;
    file.flush()?;
    file.as_file().sync_all()
}
