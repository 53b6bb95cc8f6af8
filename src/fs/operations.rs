//! The filesystem operations exposed as tools.
//!
//! Each method is a direct call onto `std::fs` made on the location the path
//! guard hands back (see [`PathGuard::confine`]). Failures are returned as
//! [`FsError`] carrying the OS message and the caller's own path.

use std::fs::{File, Metadata};
use std::io::{self, Read};
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::encoding::Encoding;
use super::error::{FsError, FsResult};
use super::guard::PathGuard;
use crate::config::DEFAULT_MAX_READ_BYTES;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file (or anything that is not a directory or link).
    File,
    /// Directory.
    Directory,
    /// Symbolic link, not followed.
    Symlink,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    /// File name of the entry.
    pub name: String,
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// The listed directory joined with `name`.
    pub path: String,
}

/// Stat information for a single path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Size in bytes.
    pub size: u64,
    /// Whether the path is a regular file.
    pub is_file: bool,
    /// Whether the path is a directory.
    pub is_directory: bool,
    /// Whether the path itself is a symbolic link.
    pub is_symbolic_link: bool,
    /// Creation time, if the platform reports it.
    pub created: Option<String>,
    /// Last modification time.
    pub modified: Option<String>,
    /// Last access time.
    pub accessed: Option<String>,
    /// Permission bits as a three-digit octal string, e.g. `"644"`.
    pub permissions: String,
}

/// Filesystem access confined by a [`PathGuard`].
#[derive(Debug, Clone)]
pub struct FileSystem {
    guard: PathGuard,
    default_encoding: Encoding,
    max_read_bytes: u64,
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new(PathGuard::unrestricted())
    }
}

impl FileSystem {
    /// Creates a filesystem with UTF-8 as the default encoding.
    #[must_use]
    pub const fn new(guard: PathGuard) -> Self {
        Self {
            guard,
            default_encoding: Encoding::Utf8,
            max_read_bytes: DEFAULT_MAX_READ_BYTES,
        }
    }

    /// Sets the encoding used when a request names none.
    #[must_use]
    pub const fn with_default_encoding(mut self, encoding: Encoding) -> Self {
        self.default_encoding = encoding;
        self
    }

    /// Sets the largest file size a read will load.
    #[must_use]
    pub const fn with_max_read_bytes(mut self, limit: u64) -> Self {
        self.max_read_bytes = limit;
        self
    }

    /// Returns the path guard.
    #[must_use]
    pub const fn guard(&self) -> &PathGuard {
        &self.guard
    }

    /// Returns the default encoding.
    #[must_use]
    pub const fn default_encoding(&self) -> Encoding {
        self.default_encoding
    }

    /// Reads a file and decodes it as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is denied, the file is missing, too
    /// large or unreadable, or its bytes are invalid for the encoding.
    pub fn read_file(&self, path: &str, encoding: Option<Encoding>) -> FsResult<String> {
        let path = Path::new(path);
        let target = self.guard.confine(path)?;

        let file = File::open(&target).map_err(|e| FsError::io("read", path, e))?;
        let metadata = file.metadata().map_err(|e| FsError::io("read", path, e))?;
        if metadata.is_file() && metadata.len() > self.max_read_bytes {
            return Err(self.too_large(path, metadata.len()));
        }

        // FIFOs and devices report no length, so the read itself is capped
        let mut bytes = Vec::new();
        file.take(self.max_read_bytes.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|e| FsError::io("read", path, e))?;

        let read = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        if read > self.max_read_bytes {
            return Err(self.too_large(path, read));
        }

        encoding.unwrap_or(self.default_encoding).decode(&bytes)
    }

    fn too_large(&self, path: &Path, size: u64) -> FsError {
        FsError::TooLarge {
            path: path.to_path_buf(),
            size,
            limit: self.max_read_bytes,
        }
    }

    /// Encodes `content` and writes it to a file, replacing any existing file.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is denied, the content cannot be
    /// encoded, or the write fails.
    pub fn write_file(
        &self,
        path: &str,
        content: &str,
        encoding: Option<Encoding>,
    ) -> FsResult<usize> {
        let path = Path::new(path);
        let target = self.guard.confine(path)?;

        let bytes = encoding.unwrap_or(self.default_encoding).encode(content)?;
        std::fs::write(&target, &bytes).map_err(|e| FsError::io("write", path, e))?;
        Ok(bytes.len())
    }

    /// Lists the entries of a directory, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is denied, missing, or not a directory.
    pub fn list_directory(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        let dir = Path::new(path);
        let target = self.guard.confine(dir)?;

        let metadata = std::fs::metadata(&target).map_err(|e| FsError::io("list", dir, e))?;
        if !metadata.is_dir() {
            return Err(FsError::NotADirectory {
                path: dir.to_path_buf(),
            });
        }

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&target).map_err(|e| FsError::io("list", dir, e))? {
            let entry = entry.map_err(|e| FsError::io("list", dir, e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| FsError::io("list", dir.join(entry.file_name()), e))?;

            let kind = if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(DirEntry {
                path: dir.join(&name).to_string_lossy().into_owned(),
                name,
                kind,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Creates a directory.
    ///
    /// Without `recursive`, the parent must exist and the path must not.
    /// With `recursive`, missing parents are created and an existing
    /// directory is accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is denied or creation fails.
    pub fn create_directory(&self, path: &str, recursive: bool) -> FsResult<()> {
        let path = Path::new(path);
        let target = self.guard.confine(path)?;

        let result = if recursive {
            std::fs::create_dir_all(&target)
        } else {
            std::fs::create_dir(&target)
        };
        result.map_err(|e| FsError::io("create directory", path, e))
    }

    /// Deletes a file, symlink or directory.
    ///
    /// Directories must be empty unless `recursive` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is denied, missing, or removal fails.
    pub fn delete(&self, path: &str, recursive: bool) -> FsResult<()> {
        let path = Path::new(path);
        let target = self.guard.confine(path)?;

        let metadata =
            std::fs::symlink_metadata(&target).map_err(|e| FsError::io("delete", path, e))?;

        let result = if !metadata.is_dir() {
            std::fs::remove_file(&target)
        } else if recursive {
            std::fs::remove_dir_all(&target)
        } else {
            std::fs::remove_dir(&target)
        };
        result.map_err(|e| FsError::io("delete", path, e))
    }

    /// Returns stat information for a path, following symlinks.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is denied or does not exist.
    pub fn file_info(&self, path: &str) -> FsResult<FileInfo> {
        let path = Path::new(path);
        let target = self.guard.confine(path)?;

        let metadata = std::fs::metadata(&target).map_err(|e| FsError::io("stat", path, e))?;
        let is_symbolic_link = std::fs::symlink_metadata(&target)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);

        Ok(FileInfo {
            size: metadata.len(),
            is_file: metadata.is_file(),
            is_directory: metadata.is_dir(),
            is_symbolic_link,
            created: timestamp(metadata.created()),
            modified: timestamp(metadata.modified()),
            accessed: timestamp(metadata.accessed()),
            permissions: permission_bits(&metadata),
        })
    }
}

/// Formats a file time as RFC 3339 UTC with millisecond precision.
fn timestamp(time: io::Result<SystemTime>) -> Option<String> {
    time.ok()
        .map(|t| DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;

    format!("{:03o}", metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata) -> String {
    if metadata.permissions().readonly() {
        "444".to_string()
    } else {
        "666".to_string()
    }
}
