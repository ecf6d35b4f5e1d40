//! Content items and path mapping.
//!
//! A [`ContentItem`] is one discovered source file together with every path
//! derived from it. All derivations live in [`ContentItem::new`] so the
//! invariants below hold for every item:
//!
//! - `relative_path` is `source_path` with the content root stripped.
//! - `output_path` is `output_root.join(relative_path)`.
//! - `segments` are the components of `relative_path`, and
//!   [`ContentItem::normalized_path`] joins them with `/` on every host.

use std::path::{Component, Path, PathBuf};

use crate::error::{CoreError, Result};

/// A source document and its derived path metadata.
///
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    source_path: PathBuf,
    relative_path: PathBuf,
    output_path: PathBuf,
    segments: Vec<String>,
}

impl ContentItem {
    /// Map a file under `content_root` to its place under `output_root`.
    ///
    /// Fails when `source_path` is not below `content_root`, or when the
    /// remainder is empty, contains `..`, or is not valid UTF-8.
    pub fn new(source_path: &Path, content_root: &Path, output_root: &Path) -> Result<Self> {
        let relative_path = source_path
            .strip_prefix(content_root)
            .map_err(|_| CoreError::invalid_path(source_path, "not under the content root"))?
            .to_path_buf();

        let segments = path_segments(&relative_path)
            .ok_or_else(|| CoreError::invalid_path(source_path, "not a plain relative path"))?;

        if segments.is_empty() {
            return Err(CoreError::invalid_path(source_path, "is the content root"));
        }

        Ok(Self {
            source_path: source_path.to_path_buf(),
            output_path: output_root.join(&relative_path),
            relative_path,
            segments,
        })
    }

    /// Path the item was discovered at.
    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Path relative to the content root, using host separators.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Destination under the output root.
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Path components of the relative path.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of path components.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Relative path joined with `/`.
    #[must_use]
    pub fn normalized_path(&self) -> String {
        self.segments.join("/")
    }

    /// Directory part of the normalized path, `""` for top-level files.
    #[must_use]
    pub fn directory(&self) -> String {
        match self.segments.split_last() {
            Some((_, parents)) => parents.join("/"),
            None => String::new(),
        }
    }

    /// File name.
    #[must_use]
    pub fn base_name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }
}

/// Split a relative path into UTF-8 components.
///
/// Returns `None` for absolute paths, `..`, and non UTF-8 names. `.`
/// components are dropped.
fn path_segments(path: &Path) -> Option<Vec<String>> {
    let mut segments = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(name) => segments.push(name.to_str()?.to_string()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(segments)
}

/// Destination of the static asset copy.
///
/// The static root is nested under the output root by its plain components,
/// so `static` maps to `output/static` and an absolute root such as
/// `/srv/assets` maps to `output/srv/assets` instead of escaping the output
/// root.
#[must_use]
pub fn static_output_dir(output_root: &Path, static_root: &Path) -> PathBuf {
    static_root
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name),
            _ => None,
        })
        .fold(output_root.to_path_buf(), |dest, name| dest.join(name))
}
