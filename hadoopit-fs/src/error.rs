//! Error types for filesystem operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FsError {
    #[error("Path not found: {path}")]
    NotFound { path: String },

    /// An exception reported by the remote filesystem.
    #[error("{exception}: {message}")]
    Remote { exception: String, message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    /// The request was refused before it reached the namespace.
    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid path '{0}': paths must be absolute")]
    InvalidPath(String),
}

impl FsError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn remote(exception: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            exception: exception.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type FsResult<T> = std::result::Result<T, FsError>;
