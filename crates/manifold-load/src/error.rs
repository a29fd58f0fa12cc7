//! Error types for manifold-load

use std::path::PathBuf;

use manifold_core::{DuplicateResourceError, ManifestError, ResourceId};
use miette::Diagnostic;
use thiserror::Error;

/// Result type for loading operations
pub type Result<T> = std::result::Result<T, LoadError>;

/// Errors that can occur while loading a manifest tree
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum LoadError {
    /// A file or directory could not be read
    #[error("IO error at {}: {source}", path.display())]
    #[diagnostic(code(manifold::load::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested target is not below the load root
    #[error("{} is outside the load root {}", path.display(), root.display())]
    #[diagnostic(code(manifold::load::outside_root))]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// A manifest file failed to parse
    #[error("failed to parse {}", path.display())]
    #[diagnostic(code(manifold::load::manifest))]
    Manifest {
        path: PathBuf,
        #[source]
        #[diagnostic_source]
        source: ManifestError,
    },

    /// The same resource is defined in two files
    #[error(transparent)]
    #[diagnostic(transparent)]
    Duplicate(#[from] DuplicateResourceError),

    /// Invalid loader configuration
    #[error("invalid configuration: {message}")]
    #[diagnostic(code(manifold::load::config))]
    InvalidConfig { message: String },
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }

    /// The colliding id, for duplicates within one file or across files
    pub fn duplicate_id(&self) -> Option<&ResourceId> {
        match self {
            LoadError::Duplicate(dup) => Some(&dup.id),
            LoadError::Manifest { source, .. } => source.duplicate_id(),
            _ => None,
        }
    }

    /// Check if this is a missing file or directory
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

impl From<walkdir::Error> for LoadError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(PathBuf::from).unwrap_or_default();
        let message = err.to_string();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other(message));
        LoadError::Io { path, source }
    }
}
