//! Static asset copying.
//!
//! Mirrors the static tree into the output tree byte for byte. Nothing under
//! the static root is filtered or transformed.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{BuildError, Result};

/// Copies a static tree into a destination directory.
#[derive(Debug, Clone)]
pub struct AssetCopier {
    source_dir: PathBuf,
    dest_dir: PathBuf,
}

impl AssetCopier {
    /// Create a copier from `source_dir` into `dest_dir`.
    #[must_use]
    pub fn new(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
        }
    }

    /// Copy every file, returning how many were copied.
    ///
    /// A missing source directory is an error. The file list is gathered
    /// before anything is written, so a destination nested inside the source
    /// is never copied into itself.
    pub fn copy(&self) -> Result<usize> {
        info!(
            source = %self.source_dir.display(),
            dest = %self.dest_dir.display(),
            "copying static assets"
        );

        let files = self.collect_files()?;

        for relative in &files {
            self.copy_file(relative)?;
        }

        info!(count = files.len(), "assets copied");
        Ok(files.len())
    }

    /// List files under the source directory, relative to it.
    fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.source_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.path() != self.dest_dir.as_path())
        {
            let entry = entry.map_err(|err| BuildError::AssetCopy {
                path: err
                    .path()
                    .map_or_else(|| self.source_dir.clone(), Path::to_path_buf),
                source: io::Error::from(err),
            })?;

            if entry.file_type().is_file() {
                let relative = entry
                    .path()
                    .strip_prefix(&self.source_dir)
                    .map_err(|_| BuildError::AssetCopy {
                        path: entry.path().to_path_buf(),
                        source: io::Error::new(
                            io::ErrorKind::InvalidInput,
                            "asset is outside the static root",
                        ),
                    })?;
                files.push(relative.to_path_buf());
            }
        }

        Ok(files)
    }

    /// Copy a single file given relative to the source directory.
    fn copy_file(&self, relative: &Path) -> Result<()> {
        let src = self.source_dir.join(relative);
        let dest = self.dest_dir.join(relative);

        let copy = || -> io::Result<()> {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&src, &dest)?;
            Ok(())
        };
        copy().map_err(|source| BuildError::AssetCopy {
            path: src.clone(),
            source,
        })?;

        debug!(src = %src.display(), dest = %dest.display(), "copied asset");
        Ok(())
    }
}
