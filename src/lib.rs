//! filesystem-mcp: MCP server exposing filesystem operations to AI assistants
//!
//! The server speaks JSON-RPC 2.0 over stdio and offers a small, fixed set of
//! tools that map directly onto native filesystem calls, plus a resolver for
//! `file://` resources.
//!
//! # Architecture
//!
//! - **Tools**: `read-file`, `write-file`, `list-directory`,
//!   `create-directory`, `delete-file`, `file-info`
//! - **Resources**: `file://` URIs resolved to `text/plain` contents
//! - **Path guard**: every path is checked against the configured roots
//!
//! Every tool outcome, success or failure, is returned in the same
//! content envelope. Nothing is cached or persisted by the server.
//!
//! # Modules
//!
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Configuration error types
//! - [`fs`] — Filesystem operations, encodings and the path guard
//! - [`mcp`] — MCP protocol implementation

pub mod config;
pub mod error;
pub mod fs;
pub mod mcp;
