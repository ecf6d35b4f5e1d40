//! Content discovery.
//!
//! Walks the content root and maps every regular file to a [`ContentItem`].

use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

use quire_core::ContentItem;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{BuildError, Result};

/// Walks a content tree.
#[derive(Debug, Clone)]
pub struct Discoverer {
    content_root: PathBuf,
    output_root: PathBuf,
}

impl Discoverer {
    /// Create a discoverer mapping `content_root` onto `output_root`.
    #[must_use]
    pub fn new(content_root: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            content_root: content_root.into(),
            output_root: output_root.into(),
        }
    }

    /// Collect every regular file under the content root.
    ///
    /// Directories are traversed but not returned. Symlinked directories are
    /// not descended into; a symlink to a regular file is kept under its own
    /// name. When the output root lies inside the content root it is skipped,
    /// so earlier output never feeds a later build.
    ///
    /// The first traversal error aborts the walk, so a successful result is
    /// always the complete set. Items come back in walk order; use
    /// [`crate::order`] for a stable order.
    pub fn discover(&self) -> Result<Vec<ContentItem>> {
        info!(dir = %self.content_root.display(), "discovering content");

        let mut items = Vec::new();
        let mut seen: HashMap<PathBuf, PathBuf> = HashMap::new();

        let walker = WalkDir::new(&self.content_root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !(e.depth() > 0 && e.path() == self.output_root));

        for entry in walker {
            let entry = entry.map_err(|err| self.walk_error(err))?;

            if entry.path_is_symlink() {
                if !entry.path().is_file() {
                    warn!(path = %entry.path().display(), "skipping symlink that is not a file");
                    continue;
                }
            } else if !entry.file_type().is_file() {
                continue;
            }

            let item = ContentItem::new(entry.path(), &self.content_root, &self.output_root)
                .map_err(|err| BuildError::Discovery {
                    path: entry.path().to_path_buf(),
                    source: io::Error::new(io::ErrorKind::InvalidInput, err),
                })?;

            if let Some(first) =
                seen.insert(item.output_path().to_path_buf(), item.source_path().to_path_buf())
            {
                return Err(BuildError::OutputCollision {
                    first,
                    second: item.source_path().to_path_buf(),
                    output: item.output_path().to_path_buf(),
                });
            }

            debug!(path = %item.normalized_path(), "discovered");
            items.push(item);
        }

        info!(count = items.len(), "found content files");
        Ok(items)
    }

    fn walk_error(&self, err: walkdir::Error) -> BuildError {
        let path = err
            .path()
            .map_or_else(|| self.content_root.clone(), Path::to_path_buf);
        BuildError::Discovery {
            path,
            source: io::Error::from(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::error::ErrorKind;

    fn write(root: &Path, relative: &str, body: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn test_discovers_files_at_every_depth() {
        let content = TempDir::new().unwrap();
        write(content.path(), "index.txt", "root");
        write(content.path(), "a/b.txt", "nested");
        write(content.path(), "a/deep/c/d.txt", "deep");
        write(content.path(), ".hidden", "hidden");
        fs::create_dir_all(content.path().join("empty/dir")).unwrap();

        let items = Discoverer::new(content.path(), "out").discover().unwrap();

        let mut paths: Vec<_> = items.iter().map(ContentItem::normalized_path).collect();
        paths.sort();
        assert_eq!(paths, [".hidden", "a/b.txt", "a/deep/c/d.txt", "index.txt"]);
    }

    #[test]
    fn test_path_invariants_hold() {
        let content = TempDir::new().unwrap();
        write(content.path(), "x/y/z.html", "");
        write(content.path(), "top.md", "");

        let items = Discoverer::new(content.path(), "/srv/out")
            .discover()
            .unwrap();

        for item in &items {
            assert_eq!(
                item.relative_path(),
                item.source_path().strip_prefix(content.path()).unwrap()
            );
            assert_eq!(
                item.output_path(),
                Path::new("/srv/out").join(item.relative_path())
            );
        }
    }

    #[test]
    fn test_skips_nested_output_root() {
        let content = TempDir::new().unwrap();
        write(content.path(), "a.txt", "");
        write(content.path(), "out/a.txt", "previous output");
        write(content.path(), "outline/b.txt", "");

        let items = Discoverer::new(content.path(), content.path().join("out"))
            .discover()
            .unwrap();

        let mut paths: Vec<_> = items.iter().map(ContentItem::normalized_path).collect();
        paths.sort();
        assert_eq!(paths, ["a.txt", "outline/b.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_keeps_symlinked_files() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        write(dir.path(), "real.txt", "target");
        write(dir.path(), "shared/x.txt", "");
        fs::create_dir_all(&content).unwrap();
        symlink(dir.path().join("real.txt"), content.join("link.txt")).unwrap();
        symlink(dir.path().join("shared"), content.join("shared")).unwrap();
        symlink(dir.path().join("gone.txt"), content.join("dangling.txt")).unwrap();

        let items = Discoverer::new(&content, "out").discover().unwrap();

        let paths: Vec<_> = items.iter().map(ContentItem::normalized_path).collect();
        assert_eq!(paths, ["link.txt"]);
        assert_eq!(items[0].source_path(), content.join("link.txt"));
    }

    #[test]
    fn test_empty_root_yields_nothing() {
        let content = TempDir::new().unwrap();
        let items = Discoverer::new(content.path(), "out").discover().unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_missing_root_is_discovery_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = Discoverer::new(&missing, "out").discover().unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Discovery);
        assert_eq!(err.path(), Some(missing.as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_aborts() {
        use std::os::unix::fs::PermissionsExt;

        let content = TempDir::new().unwrap();
        write(content.path(), "ok.txt", "");
        write(content.path(), "locked/secret.txt", "");
        let locked = content.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores permission bits; nothing to observe there.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = Discoverer::new(content.path(), "out").discover();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Discovery);
        assert_eq!(err.path(), Some(locked.as_path()));
    }
}
