//! Error types for case directory operations.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LayoutError {
    /// The case or study directory could not be listed.
    #[error("failed to resolve case directory {path}: {source}")]
    Resolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("copy source does not exist: {path}")]
    MissingSource { path: PathBuf },

    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to change permissions of {path}: {source}")]
    Permissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write launcher {path}: {source}")]
    Launcher {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LayoutError {
    /// Whether the error came from copying package files into the case.
    #[must_use]
    pub fn is_copy_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingSource { .. } | Self::Copy { .. } | Self::Walk { .. } | Self::Remove { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;
