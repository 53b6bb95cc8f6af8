//! Filesystem access for the MCP tools.
//!
//! - [`FileSystem`] — the six operations, each a thin wrapper over `std::fs`
//! - [`PathGuard`] — confines every path to the configured roots
//! - [`Encoding`] — text encodings for file contents
//! - [`FsError`] — failures, rendered as client-facing messages

mod encoding;
mod error;
mod guard;
mod operations;

pub use encoding::Encoding;
pub use error::{FsError, FsResult};
pub use guard::PathGuard;
pub use operations::{DirEntry, EntryKind, FileInfo, FileSystem};
