//! Startup errors.
//!
//! Anything in here stops the server before it serves a single request.
//! Failures of individual tool calls are [`crate::fs::FsError`] instead and
//! travel back to the client inside the tool result.

use std::path::PathBuf;

use thiserror::Error;

/// Why the configuration could not be turned into a running server.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file exists but reading it failed.
    #[error("cannot read config file {path}")]
    ReadError {
        /// The config file.
        path: PathBuf,
        /// What the OS reported.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON or has unknown keys.
    #[error("config file {path} is malformed: {source}")]
    ParseError {
        /// The config file.
        path: PathBuf,
        /// Position and reason from `serde_json`.
        #[source]
        source: serde_json::Error,
    },

    /// A config file named on the command line does not exist.
    #[error("config file {path} not found")]
    NotFound {
        /// The path given on the command line.
        path: PathBuf,
    },

    /// A setting has a value the server cannot use.
    #[error("invalid setting: {message}")]
    ValidationError {
        /// Which setting, and what is wrong with it.
        message: String,
    },
}
