use std::fs;
use std::io::Write;

use camino::Utf8Path;

use crate::error::NamerError;

pub fn ensure_dir(dir: &Utf8Path) -> Result<(), NamerError> {
    fs::create_dir_all(dir.as_std_path())
        .map_err(|err| NamerError::Filesystem(format!("create {dir}: {err}")))
}

/// Replaces `dest` with `content` through a temp file in the same directory.
pub fn write_atomic(dest: &Utf8Path, content: &[u8]) -> Result<(), NamerError> {
    let parent = dest
        .parent()
        .ok_or_else(|| NamerError::Filesystem("invalid destination path".to_string()))?;
    ensure_dir(parent)?;
    let mut temp = tempfile::Builder::new()
        .prefix("kira-cn-file")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| NamerError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .and_then(|_| temp.flush())
        .map_err(|err| NamerError::Filesystem(format!("write {dest}: {err}")))?;
    temp.persist(dest.as_std_path())
        .map_err(|err| NamerError::Filesystem(format!("persist {dest}: {err}")))?;
    Ok(())
}
