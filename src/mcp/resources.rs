//! `file://` resource resolution.
//!
//! Only the `file://` scheme is recognised. The scheme prefix is stripped and
//! the remainder is read as a path through the same guarded [`FileSystem`]
//! the tools use. Any other scheme is rejected before the filesystem is
//! touched. Resources are always decoded as UTF-8 to match their
//! `text/plain` label, whatever the configured default encoding is.

use serde::Serialize;
use thiserror::Error;

use crate::fs::{Encoding, FileSystem, FsError};

/// The only URI scheme the resolver accepts.
pub const FILE_SCHEME: &str = "file://";

/// Content type attached to every resolved resource.
pub const TEXT_MIME_TYPE: &str = "text/plain";

/// Errors raised while resolving a resource.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The URI does not use the `file://` scheme.
    #[error("Unsupported URI scheme: {uri}")]
    UnsupportedScheme {
        /// The rejected URI.
        uri: String,
    },

    /// The file behind the URI could not be read.
    #[error("Failed to read resource {uri}: {source}")]
    Read {
        /// The requested URI.
        uri: String,
        /// Underlying filesystem error.
        #[source]
        source: FsError,
    },
}

impl ResourceError {
    /// Returns `true` if the resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Read { source, .. } if source.io_kind() == Some(std::io::ErrorKind::NotFound)
        )
    }
}

/// Contents of a resolved resource, as returned by resources/read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    /// The URI that was resolved.
    pub uri: String,
    /// Always [`TEXT_MIME_TYPE`].
    pub mime_type: &'static str,
    /// File contents.
    pub text: String,
}

/// A URI template advertised by resources/templates/list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplate {
    /// RFC 6570 URI template.
    pub uri_template: &'static str,
    /// Short name.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Content type of resolved resources.
    pub mime_type: &'static str,
}

/// Returns the templates clients can use to address files.
#[must_use]
pub fn resource_templates() -> Vec<ResourceTemplate> {
    vec![ResourceTemplate {
        uri_template: "file:///{path}",
        name: "file",
        description: "Contents of a file inside the allowed directories",
        mime_type: TEXT_MIME_TYPE,
    }]
}

/// Strips the `file://` prefix, returning the path part.
///
/// # Errors
///
/// Returns [`ResourceError::UnsupportedScheme`] for any other scheme.
pub fn path_from_uri(uri: &str) -> Result<&str, ResourceError> {
    uri.strip_prefix(FILE_SCHEME)
        .ok_or_else(|| ResourceError::UnsupportedScheme {
            uri: uri.to_string(),
        })
}

/// Resolves a `file://` URI to the file's text contents.
///
/// # Errors
///
/// Returns an error if the scheme is not `file://` or the read fails.
pub fn resolve(fs: &FileSystem, uri: &str) -> Result<ResourceContents, ResourceError> {
    let path = path_from_uri(uri)?;

    let text = fs
        .read_file(path, Some(Encoding::Utf8))
        .map_err(|source| ResourceError::Read {
            uri: uri.to_string(),
            source,
        })?;

    Ok(ResourceContents {
        uri: uri.to_string(),
        mime_type: TEXT_MIME_TYPE,
        text,
    })
}
