//! Error types for filesystem operations.
//!
//! Every variant renders a message that is safe to hand back to the client
//! verbatim. I/O failures include the operating system's own text.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::Encoding;

/// Result type for filesystem operations.
pub type FsResult<T> = Result<T, FsError>;

/// Errors that can occur during filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    /// An underlying filesystem call failed.
    #[error("Failed to {action} '{path}': {source}")]
    Io {
        /// What was being attempted ("read", "write", "delete", ...).
        action: &'static str,
        /// Path the call was made on.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The path resolves outside every allowed root.
    #[error("Access denied: path is outside the configured allowed directories")]
    AccessDenied,

    /// The path cannot be resolved.
    #[error("Invalid path '{path}': {message}")]
    InvalidPath {
        /// The offending path.
        path: PathBuf,
        /// Description of what's wrong.
        message: String,
    },

    /// The requested encoding name is not recognised.
    #[error("Unsupported encoding '{name}'. Expected one of: utf8, ascii, latin1, base64")]
    UnsupportedEncoding {
        /// Encoding name as given by the caller.
        name: String,
    },

    /// Content cannot be represented in the requested encoding.
    #[error("Content is not valid {encoding}: {message}")]
    InvalidContent {
        /// Encoding that was applied.
        encoding: Encoding,
        /// Description of what's wrong.
        message: String,
    },

    /// The file exceeds the configured read limit.
    #[error("File '{path}' is at least {size} bytes, which exceeds the {limit} byte read limit")]
    TooLarge {
        /// Path to the file.
        path: PathBuf,
        /// Bytes seen before giving up. Streams stop one past the limit.
        size: u64,
        /// Configured limit in bytes.
        limit: u64,
    },

    /// A directory was expected.
    #[error("Not a directory: '{path}'")]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },
}

impl FsError {
    /// Creates an I/O error for the given action and path.
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid content error.
    pub fn invalid_content(encoding: Encoding, message: impl Into<String>) -> Self {
        Self::InvalidContent {
            encoding,
            message: message.into(),
        }
    }

    /// Returns the underlying I/O error kind, if this is an I/O failure.
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}
