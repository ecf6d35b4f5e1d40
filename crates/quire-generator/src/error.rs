//! Build errors.
//!
//! Every variant names the file it concerns, so a failing build always points
//! at the offending path.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Walking the content tree failed.
    #[error("discovery failed at {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two source files map to the same output path.
    #[error("{first} and {second} both map to {output}")]
    OutputCollision {
        first: PathBuf,
        second: PathBuf,
        output: PathBuf,
    },

    /// A source file could not be read as UTF-8 text.
    #[error("failed to read template {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Template syntax error.
    #[error("template compile error in {path}: {source}")]
    TemplateCompile {
        path: PathBuf,
        line: Option<usize>,
        #[source]
        source: minijinja::Error,
    },

    /// Template evaluation error.
    #[error("template render error in {path}: {source}")]
    TemplateRender {
        path: PathBuf,
        line: Option<usize>,
        #[source]
        source: minijinja::Error,
    },

    /// Creating an output directory or writing an output file failed.
    #[error("failed to write {path}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copying the static tree failed.
    #[error("failed to copy asset {path}: {source}")]
    AssetCopy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The build was cancelled between items.
    #[error("build cancelled")]
    Cancelled,

    /// The build ran past its deadline.
    #[error("build deadline exceeded after {}ms", .elapsed.as_millis())]
    DeadlineExceeded { elapsed: Duration },
}

/// Coarse classification of a [`BuildError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Content traversal.
    Discovery,
    /// Template parsing, including reading the template source.
    TemplateCompile,
    /// Template evaluation.
    TemplateRender,
    /// Output directory creation or file write.
    OutputWrite,
    /// Static tree copy.
    AssetCopy,
    /// Cancellation or deadline.
    Interrupted,
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

impl BuildError {
    /// Wrap a template syntax error for `path`.
    pub fn compile(path: impl Into<PathBuf>, source: minijinja::Error) -> Self {
        Self::TemplateCompile {
            path: path.into(),
            line: source.line(),
            source,
        }
    }

    /// Wrap a template evaluation error for `path`.
    pub fn render(path: impl Into<PathBuf>, source: minijinja::Error) -> Self {
        Self::TemplateRender {
            path: path.into(),
            line: source.line(),
            source,
        }
    }

    /// Coarse kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Discovery { .. } | Self::OutputCollision { .. } => ErrorKind::Discovery,
            Self::SourceRead { .. } | Self::TemplateCompile { .. } => ErrorKind::TemplateCompile,
            Self::TemplateRender { .. } => ErrorKind::TemplateRender,
            Self::OutputWrite { .. } => ErrorKind::OutputWrite,
            Self::AssetCopy { .. } => ErrorKind::AssetCopy,
            Self::Cancelled | Self::DeadlineExceeded { .. } => ErrorKind::Interrupted,
        }
    }

    /// Path of the file this error concerns, if any.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Discovery { path, .. }
            | Self::SourceRead { path, .. }
            | Self::TemplateCompile { path, .. }
            | Self::TemplateRender { path, .. }
            | Self::OutputWrite { path, .. }
            | Self::AssetCopy { path, .. } => Some(path),
            Self::OutputCollision { second, .. } => Some(second),
            Self::Cancelled | Self::DeadlineExceeded { .. } => None,
        }
    }

    /// Template line the error points at, if known.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::TemplateCompile { line, .. } | Self::TemplateRender { line, .. } => *line,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_discovery_error_names_path() {
        let err = BuildError::Discovery {
            path: PathBuf::from("content/private"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.kind(), ErrorKind::Discovery);
        assert_eq!(err.path(), Some(Path::new("content/private")));
        assert!(err.to_string().contains("content/private"));
    }

    #[test]
    fn test_compile_error_keeps_line() {
        let env = minijinja::Environment::new();
        let source_err = env
            .render_named_str("a/b.txt", "line one\n{% if %}", ())
            .unwrap_err();
        let err = BuildError::compile("content/a/b.txt", source_err);

        assert_eq!(err.kind(), ErrorKind::TemplateCompile);
        assert_eq!(err.line(), Some(2));
        assert!(err.to_string().contains("content/a/b.txt"));
    }

    #[test]
    fn test_source_read_is_compile_kind() {
        let err = BuildError::SourceRead {
            path: PathBuf::from("content/bin.dat"),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "not utf-8"),
        };
        assert_eq!(err.kind(), ErrorKind::TemplateCompile);
    }

    #[test]
    fn test_interrupted_errors_have_no_path() {
        assert_eq!(BuildError::Cancelled.kind(), ErrorKind::Interrupted);
        assert!(BuildError::Cancelled.path().is_none());

        let err = BuildError::DeadlineExceeded {
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(err.kind(), ErrorKind::Interrupted);
        assert!(err.to_string().contains("1500ms"));
    }
}
