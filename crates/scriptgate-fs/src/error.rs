use scriptgate_core::path_validation::{PathError, Rejection};
use thiserror::Error;

/// Errors returned by file access, resolution and library setup.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("Cannot open file. File name is empty.")]
    EmptyPath,

    #[error("Cannot open file '{path}'. Absolute paths or access to the parent directory is prohibited.")]
    InvalidPath { path: String, reason: Rejection },

    #[error("Script file '{0}' not found")]
    FileNotFound(String),

    #[error("Cannot read file '{path}': {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot resolve module '{request}' from '{from}': {reason}")]
    ModuleResolutionFailed {
        request: String,
        from: String,
        reason: String,
    },

    #[error("Embedded library is already installed")]
    LibraryAlreadyInstalled,

    #[error("Cannot read library source '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    pub(crate) fn resolution(request: &str, from: &str, reason: impl Into<String>) -> Self {
        FsError::ModuleResolutionFailed {
            request: request.to_string(),
            from: from.to_string(),
            reason: reason.into(),
        }
    }

    /// The path this error is about, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            FsError::InvalidPath { path, .. }
            | FsError::ReadError { path, .. }
            | FsError::Io { path, .. }
            | FsError::FileNotFound(path) => Some(path.as_str()),
            FsError::ModuleResolutionFailed { request, .. } => Some(request.as_str()),
            FsError::EmptyPath | FsError::LibraryAlreadyInstalled => None,
        }
    }
}

impl From<PathError> for FsError {
    fn from(e: PathError) -> Self {
        match e {
            PathError::EmptyPath => FsError::EmptyPath,
            PathError::InvalidPath { path, reason } => FsError::InvalidPath { path, reason },
        }
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
