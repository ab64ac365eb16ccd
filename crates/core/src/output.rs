//! Writing finished output files.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::RenderError;

/// Write fully serialized output to `path`, creating parent directories.
///
/// If the write fails, a file created by this call is removed before the
/// error is returned. A file that already existed is left in place.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| RenderError::WriteFailed {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    write_or_clean_up(path, bytes, |path, bytes| fs::write(path, bytes))
}

fn write_or_clean_up<F>(path: &Path, bytes: &[u8], write: F) -> Result<(), RenderError>
where
    F: FnOnce(&Path, &[u8]) -> io::Result<()>,
{
    let existed = path.exists();
    if let Err(source) = write(path, bytes) {
        if !existed && path.is_file() {
            if let Err(e) = fs::remove_file(path) {
                log::warn!("Could not remove partial file {}: {}", path.display(), e);
            }
        }
        return Err(RenderError::WriteFailed {
            path: path.to_path_buf(),
            source,
        });
    }

    log::debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
