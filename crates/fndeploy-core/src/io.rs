use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting config files.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Write `lines` joined by newlines, preserving order. No trailing newline,
/// so an N-entry list always reads back as exactly N lines.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut f = std::fs::File::create(path)?;
    f.write_all(lines.join("\n").as_bytes())?;
    f.flush()?;
    Ok(())
}

/// Copy `src` to `dest` byte for byte, creating `dest`'s parent if needed.
pub fn copy_file(src: &Path, dest: &Path) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        ensure_dir(parent)?;
    }
    Ok(std::fs::copy(src, dest)?)
}
