//! Integration tests for MCP protocol handling.
//!
//! These tests verify the MCP server's JSON-RPC 2.0 protocol implementation,
//! including request/response handling, error responses, lifecycle
//! management and the line-delimited serve loop.

use filesystem_mcp::fs::FileSystem;
use filesystem_mcp::mcp::protocol::{parse_message, IncomingMessage, RequestId};
use filesystem_mcp::mcp::server::{McpServer, ServerState};
use filesystem_mcp::mcp::transport::Transport;
use serde_json::Value;
use tokio::io::BufReader;

const INITIALIZE: &str = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test-client","version":"1.0.0"}}}"#;
const INITIALIZED: &str = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;

/// Splits written transport output into parsed JSON messages.
fn written_messages(output: Vec<u8>) -> Vec<Value> {
    String::from_utf8(output)
        .expect("output is UTF-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line is one JSON message"))
        .collect()
}

// =============================================================================
// Protocol Parsing Tests
// =============================================================================

#[test]
fn test_parse_initialize_request() {
    let result = parse_message(INITIALIZE);
    assert!(result.is_ok());

    if let IncomingMessage::Request(req) = result.unwrap() {
        assert_eq!(req.method, "initialize");
        assert_eq!(req.id, RequestId::Number(1));
    } else {
        panic!("Expected Request");
    }
}

#[test]
fn test_parse_tools_call_request() {
    let json = r#"{
        "jsonrpc": "2.0",
        "id": "call-7",
        "method": "tools/call",
        "params": {"name": "read-file", "arguments": {"path": "README.md"}}
    }"#;

    let IncomingMessage::Request(req) = parse_message(json).unwrap() else {
        panic!("Expected Request");
    };
    assert_eq!(req.method, "tools/call");
    assert_eq!(req.id, RequestId::String("call-7".to_string()));
    assert_eq!(req.params.unwrap()["name"], "read-file");
}

#[test]
fn test_parse_notification() {
    let result = parse_message(INITIALIZED);

    if let IncomingMessage::Notification(notif) = result.unwrap() {
        assert_eq!(notif.method, "notifications/initialized");
    } else {
        panic!("Expected Notification");
    }
}

#[test]
fn test_parse_invalid_json() {
    assert!(parse_message("not valid json").is_err());
}

#[test]
fn test_parse_missing_jsonrpc_version() {
    let json = r#"{
        "id": 1,
        "method": "test"
    }"#;

    assert!(parse_message(json).is_err());
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_full_lifecycle_over_handle_line() {
    let mut server = McpServer::new(FileSystem::default());
    assert_eq!(server.state(), ServerState::AwaitingInit);

    let reply = server.handle_line(INITIALIZE).expect("initialize reply");
    assert!(!reply.is_error());
    assert_eq!(server.state(), ServerState::Initialising);

    assert!(server.handle_line(INITIALIZED).is_none());
    assert_eq!(server.state(), ServerState::Running);

    let reply = server
        .handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"resources/templates/list"}"#)
        .expect("templates reply");
    let value = serde_json::to_value(reply).unwrap();
    assert_eq!(
        value["result"]["resourceTemplates"][0]["uriTemplate"],
        "file:///{path}"
    );

    let reply = server
        .handle_line(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#)
        .expect("resources reply");
    let value = serde_json::to_value(reply).unwrap();
    assert_eq!(value["result"]["resources"], serde_json::json!([]));
}

#[test]
fn test_tool_call_before_initialized_notification_is_rejected() {
    let mut server = McpServer::new(FileSystem::default());
    server.handle_line(INITIALIZE);

    let reply = server
        .handle_line(
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"file-info","arguments":{"path":"."}}}"#,
        )
        .expect("error reply");
    assert!(reply.is_error());
}

// =============================================================================
// Serve Loop Tests
// =============================================================================

#[tokio::test]
async fn test_serve_answers_each_request_line() {
    let input = tokio_test::io::Builder::new()
        .read(format!("{INITIALIZE}\n").as_bytes())
        .read(format!("{INITIALIZED}\n").as_bytes())
        .read(b"\n")
        .read(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n")
        .read(b"garbage\n")
        .read(b"{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"ping\"}")
        .build();

    let mut transport = Transport::new(BufReader::new(input), Vec::new());
    let mut server = McpServer::new(FileSystem::default());

    server.serve(&mut transport).await.unwrap();
    assert_eq!(server.state(), ServerState::ShuttingDown);

    let (_, output) = transport.into_parts();
    let messages = written_messages(output);

    // initialize, tools/list, parse error, ping: the notification and blank line get no reply
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["id"], 1);
    assert_eq!(messages[1]["id"], 2);
    assert_eq!(messages[1]["result"]["tools"].as_array().unwrap().len(), 6);
    assert_eq!(messages[2]["error"]["code"], -32700);
    assert!(messages[2]["id"].is_null());
    assert_eq!(messages[3]["id"], 3);
}

#[tokio::test]
async fn test_serve_survives_line_that_is_not_utf8() {
    let input = tokio_test::io::Builder::new()
        .read(b"\xff\xfe garbage\n")
        .read(b"{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n")
        .build();

    let mut transport = Transport::new(BufReader::new(input), Vec::new());
    let mut server = McpServer::new(FileSystem::default());

    server.serve(&mut transport).await.unwrap();

    let (_, output) = transport.into_parts();
    let messages = written_messages(output);

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["error"]["code"], -32700);
    assert!(messages[0]["id"].is_null());
    assert_eq!(messages[1]["id"], 7);
    assert!(messages[1]["result"].is_object());
}

#[test]
fn test_serve_stops_at_eof_without_output() {
    let input = tokio_test::io::Builder::new().build();
    let mut transport = Transport::new(BufReader::new(input), Vec::new());
    let mut server = McpServer::new(FileSystem::default());

    tokio_test::block_on(server.serve(&mut transport)).unwrap();

    let (_, output) = transport.into_parts();
    assert!(output.is_empty());
    assert_eq!(server.state(), ServerState::ShuttingDown);
}
