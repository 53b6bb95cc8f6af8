//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::fs::Encoding;

/// Default upper bound for a single read: 10 MiB.
pub const DEFAULT_MAX_READ_BYTES: u64 = 10 * 1024 * 1024;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Directories the server may touch. Empty means the working directory.
    #[serde(default)]
    pub allowed_paths: Vec<PathBuf>,

    /// Encoding applied when a request does not name one.
    #[serde(default = "default_encoding")]
    pub default_encoding: String,

    /// Largest file, in bytes, that `read-file` or a resource read will load.
    #[serde(default = "default_max_read_bytes")]
    pub max_read_bytes: u64,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            _schema: None,
            _comment: None,
            allowed_paths: Vec::new(),
            default_encoding: default_encoding(),
            max_read_bytes: default_max_read_bytes(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.encoding()?;

        if self.max_read_bytes == 0 {
            return Err(ConfigError::ValidationError {
                message: "max_read_bytes must be greater than zero".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            });
        }

        Ok(())
    }

    /// Returns the parsed default encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if `default_encoding` is not a supported encoding name.
    pub fn encoding(&self) -> Result<Encoding, ConfigError> {
        self.default_encoding
            .parse()
            .map_err(|e: crate::fs::FsError| ConfigError::ValidationError {
                message: e.to_string(),
            })
    }
}

fn default_encoding() -> String {
    "utf8".to_string()
}

const fn default_max_read_bytes() -> u64 {
    DEFAULT_MAX_READ_BYTES
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
