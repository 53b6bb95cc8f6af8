//! Tool definitions and dispatch.
//!
//! Each tool maps one-to-one onto a [`FileSystem`] operation. Every outcome,
//! including unknown tool names and malformed arguments, comes back as a
//! [`ToolCallResult`] so the client always sees the same envelope.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::fs::{Encoding, FileSystem, FsError};

/// A tool definition for tools/list response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Unique tool name.
    pub name: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the tool call resulted in an error.
    #[serde(skip_serializing_if = "is_false")]
    pub is_error: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires fn(&T) -> bool
const fn is_false(b: &bool) -> bool {
    !*b
}

impl ToolCallResult {
    /// Creates a successful text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Creates an error text result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Returns the text of the first content item.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|c| match c {
            ToolContent::Text { text } => text.as_str(),
        })
    }
}

/// Why a tool call failed.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool has this name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments did not match the tool's schema.
    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        /// Tool name.
        tool: &'static str,
        /// Deserialisation error.
        #[source]
        source: serde_json::Error,
    },

    /// The filesystem operation failed.
    #[error(transparent)]
    Fs(#[from] FsError),

    /// The result could not be rendered as JSON text.
    #[error("Failed to serialise result: {0}")]
    Serialise(#[source] serde_json::Error),
}

/// The fixed set of tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Read a file as text.
    ReadFile,
    /// Write text to a file.
    WriteFile,
    /// List a directory.
    ListDirectory,
    /// Create a directory.
    CreateDirectory,
    /// Delete a file or directory.
    DeleteFile,
    /// Stat a path.
    FileInfo,
}

impl Operation {
    /// All operations, in the order they are advertised.
    pub const ALL: [Self; 6] = [
        Self::ReadFile,
        Self::WriteFile,
        Self::ListDirectory,
        Self::CreateDirectory,
        Self::DeleteFile,
        Self::FileInfo,
    ];

    /// The advertised tool name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ReadFile => "read-file",
            Self::WriteFile => "write-file",
            Self::ListDirectory => "list-directory",
            Self::CreateDirectory => "create-directory",
            Self::DeleteFile => "delete-file",
            Self::FileInfo => "file-info",
        }
    }

    /// Looks up an operation by name. The snake_case spelling is accepted too.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let normalised = name.replace('_', "-");
        Self::ALL.into_iter().find(|op| op.name() == normalised)
    }

    /// Returns the tool definition advertised in tools/list.
    #[must_use]
    pub fn definition(self) -> ToolDefinition {
        let encoding = json!({
            "type": "string",
            "enum": Encoding::schema_names(),
            "description": "Content encoding (default: utf8). Use base64 for binary files."
        });
        let recursive = |what: &str| {
            json!({
                "type": "boolean",
                "description": format!("{what} (default: false)")
            })
        };

        let (description, input_schema) = match self {
            Self::ReadFile => (
                "Read the complete contents of a file as text.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": { "type": "string", "description": "Path to the file to read" },
                        "encoding": encoding
                    },
                    "required": ["path"]
                }),
            ),
            Self::WriteFile => (
                "Write text to a file, creating it or replacing its contents. \
                 The parent directory must already exist.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": { "type": "string", "description": "Path to the file to write" },
                        "content": { "type": "string", "description": "Content to write" },
                        "encoding": encoding
                    },
                    "required": ["path", "content"]
                }),
            ),
            Self::ListDirectory => (
                "List the entries of a directory. Each entry has a name, a type \
                 (file, directory or symlink) and a path.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": {
                            "type": "string",
                            "description": "Directory to list (default: current directory)"
                        }
                    }
                }),
            ),
            Self::CreateDirectory => (
                "Create a directory. Without recursive, the parent must exist \
                 and the directory must not.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": { "type": "string", "description": "Directory to create" },
                        "recursive": recursive("Create missing parent directories")
                    },
                    "required": ["path"]
                }),
            ),
            Self::DeleteFile => (
                "Delete a file or directory. Non-empty directories require recursive.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": { "type": "string", "description": "Path to delete" },
                        "recursive": recursive("Delete directory contents as well")
                    },
                    "required": ["path"]
                }),
            ),
            Self::FileInfo => (
                "Get size, type, timestamps and permission bits for a path.",
                json!({
                    "type": "object",
                    "properties": {
                        "path": { "type": "string", "description": "Path to inspect" }
                    },
                    "required": ["path"]
                }),
            ),
        };

        ToolDefinition {
            name: self.name().to_string(),
            description: Some(description.to_string()),
            input_schema,
        }
    }
}

/// Returns the definitions of every tool.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    Operation::ALL.into_iter().map(Operation::definition).collect()
}

#[derive(Debug, Deserialize)]
struct ReadFileArgs {
    path: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WriteFileArgs {
    path: String,
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListDirectoryArgs {
    #[serde(default = "current_dir")]
    path: String,
}

fn current_dir() -> String {
    ".".to_string()
}

#[derive(Debug, Deserialize)]
struct RecursivePathArgs {
    path: String,
    #[serde(default)]
    recursive: bool,
}

#[derive(Debug, Deserialize)]
struct PathArgs {
    path: String,
}

/// Dispatches tool calls onto a [`FileSystem`].
#[derive(Debug, Clone, Default)]
pub struct ToolDispatcher {
    fs: FileSystem,
}

impl ToolDispatcher {
    /// Creates a dispatcher over the given filesystem.
    #[must_use]
    pub const fn new(fs: FileSystem) -> Self {
        Self { fs }
    }

    /// Returns the underlying filesystem.
    #[must_use]
    pub const fn filesystem(&self) -> &FileSystem {
        &self.fs
    }

    /// Calls a tool by name and wraps the outcome in an envelope.
    #[must_use]
    pub fn call(&self, name: &str, arguments: &Value) -> ToolCallResult {
        tracing::debug!(tool = name, "Dispatching tool call");

        match self.execute(name, arguments) {
            Ok(text) => ToolCallResult::text(text),
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Tool call failed");
                ToolCallResult::error(e.to_string())
            }
        }
    }

    /// Runs a tool and returns its success text.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] for unknown tools, bad arguments or failed
    /// filesystem operations.
    pub fn execute(&self, name: &str, arguments: &Value) -> Result<String, ToolError> {
        let op = Operation::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        match op {
            Operation::ReadFile => {
                let args: ReadFileArgs = parse_args(op, arguments)?;
                let encoding = parse_encoding(args.encoding.as_deref())?;
                Ok(self.fs.read_file(&args.path, encoding)?)
            }
            Operation::WriteFile => {
                let args: WriteFileArgs = parse_args(op, arguments)?;
                let encoding = parse_encoding(args.encoding.as_deref())?;
                let written = self.fs.write_file(&args.path, &args.content, encoding)?;
                Ok(format!("Successfully wrote {written} bytes to {}", args.path))
            }
            Operation::ListDirectory => {
                let args: ListDirectoryArgs = parse_args(op, arguments)?;
                let entries = self.fs.list_directory(&args.path)?;
                serde_json::to_string_pretty(&entries).map_err(ToolError::Serialise)
            }
            Operation::CreateDirectory => {
                let args: RecursivePathArgs = parse_args(op, arguments)?;
                self.fs.create_directory(&args.path, args.recursive)?;
                Ok(format!("Successfully created directory {}", args.path))
            }
            Operation::DeleteFile => {
                let args: RecursivePathArgs = parse_args(op, arguments)?;
                self.fs.delete(&args.path, args.recursive)?;
                Ok(format!("Successfully deleted {}", args.path))
            }
            Operation::FileInfo => {
                let args: PathArgs = parse_args(op, arguments)?;
                let info = self.fs.file_info(&args.path)?;
                serde_json::to_string_pretty(&info).map_err(ToolError::Serialise)
            }
        }
    }
}

/// Deserialises tool arguments, treating absent arguments as `{}`.
fn parse_args<T: DeserializeOwned>(op: Operation, arguments: &Value) -> Result<T, ToolError> {
    let value = if arguments.is_null() {
        json!({})
    } else {
        arguments.clone()
    };

    serde_json::from_value(value).map_err(|source| ToolError::InvalidArguments {
        tool: op.name(),
        source,
    })
}

fn parse_encoding(name: Option<&str>) -> Result<Option<Encoding>, ToolError> {
    Ok(name.map(str::parse::<Encoding>).transpose()?)
}
