use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

/// Replace `path` with `bytes`: write a temp file beside it, flush it to
/// disk, then rename over the original. On failure the original is intact.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    log::debug!("wrote {} bytes to {:?}", bytes.len(), path);
    Ok(())
}
