//! Error types for validation campaigns.

use std::path::PathBuf;

use casekit_layout::LayoutError;
use thiserror::Error;

use crate::mail::MailError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VnvError {
    /// Solver or comparison executable not found; checked before any case is touched.
    #[error("executable {path} not found")]
    MissingExecutable { path: PathBuf },

    #[error("failed to read parameter file {path}: {source}")]
    ParameterIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse parameter file {path}: {source}")]
    ParameterXml {
        path: PathBuf,
        #[source]
        source: quick_xml::de::DeError,
    },

    #[error("invalid parameter file {path}: {message}")]
    InvalidParameters { path: PathBuf, message: String },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("failed to send report mail: {0}")]
    Mail(#[from] MailError),
}

impl VnvError {
    /// Process exit code for a campaign that stopped with this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        1
    }
}

pub type Result<T> = std::result::Result<T, VnvError>;
