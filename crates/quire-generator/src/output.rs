//! Output file writing.
//!
//! Writes go to a uniquely named temporary file in the destination directory
//! and are renamed into place, so a destination is either fully written or
//! untouched.

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use tempfile::NamedTempFile;

use crate::error::{BuildError, Result};

/// Write `bytes` to `path`, creating missing parent directories.
///
/// The temporary file is removed if anything fails, and its handle is closed
/// before this returns.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    write_atomic(path, bytes).map_err(|source| BuildError::OutputWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp = temp_file_in(parent)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".quire-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }
    builder.tempfile_in(dir)
}

/// Remove `dir` and everything below it, if it exists.
pub fn clean_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        tracing::debug!(dir = %dir.display(), "cleaning output directory");
        fs::remove_dir_all(dir).map_err(|source| BuildError::OutputWrite {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}
