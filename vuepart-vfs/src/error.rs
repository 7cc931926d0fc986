//! VFS error types

use thiserror::Error;

/// Result type for VFS operations
pub type VfsResult<T> = Result<T, VfsError>;

/// Error type for VFS operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VfsError {
    /// File not found
    #[error("path not found: {path}")]
    NotFound { path: String },

    /// File exists but is not valid UTF-8
    #[error("file is not valid UTF-8: {path}")]
    InvalidUtf8 { path: String },

    /// Underlying IO failure
    #[error("IO error: {message}")]
    Io { message: String },
}

impl From<std::io::Error> for VfsError {
    fn from(err: std::io::Error) -> Self {
        VfsError::Io {
            message: err.to_string(),
        }
    }
}
