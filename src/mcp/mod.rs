//! Model Context Protocol (MCP) server implementation.
//!
//! This module implements the MCP specification for exposing filesystem
//! operations as tools, and files as resources, to AI assistants. The server
//! communicates over stdio transport using JSON-RPC 2.0 messages.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │   ┌─────────────┐    ┌─────────────┐    ┌────────────────┐   │
//! │   │  Transport  │───▶│   Server    │───▶│ Tools          │   │
//! │   │   (stdio)   │    │ (lifecycle) │    │ Resources      │   │
//! │   └─────────────┘    └─────────────┘    └────────────────┘   │
//! │                                                 │            │
//! │                                                 ▼            │
//! │                                    ┌──────────────────────┐  │
//! │                                    │ FileSystem + guard   │  │
//! │                                    └──────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, Reply, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
pub use tools::{Operation, ToolCallResult, ToolDispatcher};
pub use transport::{StdioTransport, Transport};
