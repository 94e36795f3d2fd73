use std::path::PathBuf;

use thiserror::Error;

/// Engine error taxonomy.
///
/// `NotFound` is fatal for the manifest itself but tolerated per entity
/// during collection loading; `PathTraversal` is always fatal and never
/// silently corrected; `Malformed` is tolerated per entity. Validation
/// findings are data, not errors (see `validate`).
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not found: {path}")]
    NotFound { path: PathBuf },

    #[error("path escapes workspace base: {reference}")]
    PathTraversal { reference: String },

    #[error("malformed document {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("i/o failure at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {path}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl WorkspaceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        WorkspaceError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        WorkspaceError::Malformed {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = WorkspaceError> = std::result::Result<T, E>;
