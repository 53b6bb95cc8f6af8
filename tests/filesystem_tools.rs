//! End-to-end tests for the filesystem tools and the `file://` resolver.
//!
//! Every call goes through `tools/call` or `resources/read` on an initialised
//! server confined to a temporary directory, so these exercise argument
//! parsing, the path guard and the response envelope together.

use std::path::Path;

use filesystem_mcp::fs::{FileSystem, PathGuard};
use filesystem_mcp::mcp::server::McpServer;
use serde_json::{json, Value};
use tempfile::TempDir;

/// An initialised server session rooted at a temporary directory.
struct Session {
    dir: TempDir,
    server: McpServer,
    next_id: i64,
}

impl Session {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let fs = FileSystem::new(PathGuard::new(vec![dir.path().to_path_buf()]));
        let mut session = Self {
            dir,
            server: McpServer::new(fs),
            next_id: 0,
        };

        session.request(
            "initialize",
            json!({"protocolVersion": "2024-11-05", "capabilities": {}}),
        );
        session
            .server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#);
        session
    }

    /// Absolute path of `name` inside the session directory, as a string.
    fn path(&self, name: &str) -> String {
        self.dir.path().join(name).to_string_lossy().into_owned()
    }

    fn request(&mut self, method: &str, params: Value) -> Value {
        self.next_id += 1;
        let line = json!({
            "jsonrpc": "2.0",
            "id": self.next_id,
            "method": method,
            "params": params,
        })
        .to_string();

        let reply = self.server.handle_line(&line).expect("request gets a reply");
        serde_json::to_value(reply).unwrap()
    }

    /// Calls a tool, returning `(is_error, text)`.
    fn call(&mut self, tool: &str, arguments: Value) -> (bool, String) {
        let reply = self.request("tools/call", json!({"name": tool, "arguments": arguments}));
        let result = &reply["result"];
        assert!(result.is_object(), "tools/call must not fail at protocol level: {reply}");

        let text = result["content"][0]["text"].as_str().unwrap().to_string();
        (result["isError"] == json!(true), text)
    }

    fn call_ok(&mut self, tool: &str, arguments: Value) -> String {
        let (is_error, text) = self.call(tool, arguments);
        assert!(!is_error, "{tool} failed: {text}");
        text
    }
}

// =============================================================================
// read-file / write-file
// =============================================================================

#[test]
fn read_write_read_roundtrip() {
    let mut s = Session::new();
    let original = s.path("original.txt");
    let copy = s.path("copy.txt");
    std::fs::write(&original, "line one\nline two\n\u{1f980} unicode").unwrap();

    let content = s.call_ok("read-file", json!({"path": original}));
    s.call_ok("write-file", json!({"path": copy, "content": content}));
    let copied = s.call_ok("read-file", json!({"path": copy}));

    assert_eq!(copied, content);
    assert_eq!(copied, "line one\nline two\n\u{1f980} unicode");
}

#[test]
fn binary_roundtrip_through_base64() {
    let mut s = Session::new();
    let original = s.path("blob.bin");
    let copy = s.path("blob-copy.bin");
    let bytes: Vec<u8> = (0..=255).collect();
    std::fs::write(&original, &bytes).unwrap();

    let encoded = s.call_ok("read-file", json!({"path": original, "encoding": "base64"}));
    s.call_ok(
        "write-file",
        json!({"path": copy, "content": encoded, "encoding": "base64"}),
    );

    assert_eq!(std::fs::read(&copy).unwrap(), bytes);
}

#[test]
fn write_file_confirms_byte_count() {
    let mut s = Session::new();
    let target = s.path("out.txt");

    let text = s.call_ok("write-file", json!({"path": target, "content": "héllo"}));
    assert_eq!(text, format!("Successfully wrote 6 bytes to {target}"));
}

#[test]
fn write_file_requires_content() {
    let mut s = Session::new();
    let (is_error, text) = s.call("write-file", json!({"path": s.path("x.txt")}));
    assert!(is_error);
    assert!(text.contains("content"));
    assert!(!Path::new(&s.path("x.txt")).exists());
}

#[test]
fn read_missing_file_is_error_envelope() {
    let mut s = Session::new();
    let (is_error, text) = s.call("read-file", json!({"path": s.path("nope.txt")}));
    assert!(is_error);
    assert!(text.contains("nope.txt"));
}

#[test]
fn snake_case_tool_names_are_accepted() {
    let mut s = Session::new();
    let target = s.path("snake.txt");
    s.call_ok("write_file", json!({"path": target, "content": "ok"}));
    assert_eq!(s.call_ok("read_file", json!({"path": target})), "ok");
}

// =============================================================================
// create-directory / list-directory / delete-file
// =============================================================================

#[test]
fn create_directory_without_parent_fails_unless_recursive() {
    let mut s = Session::new();
    let nested = s.path("a/b/c");

    let (is_error, _) = s.call("create-directory", json!({"path": nested}));
    assert!(is_error);
    assert!(!Path::new(&nested).exists());

    let text = s.call_ok("create-directory", json!({"path": nested, "recursive": true}));
    assert_eq!(text, format!("Successfully created directory {nested}"));
    assert!(Path::new(&nested).is_dir());
}

#[test]
fn create_existing_directory_fails() {
    let mut s = Session::new();
    let dir = s.path("exists");
    s.call_ok("create-directory", json!({"path": dir}));

    let (is_error, _) = s.call("create-directory", json!({"path": dir}));
    assert!(is_error);
}

#[test]
fn list_directory_reports_entries() {
    let mut s = Session::new();
    s.call_ok("create-directory", json!({"path": s.path("sub")}));
    s.call_ok("write-file", json!({"path": s.path("file.txt"), "content": ""}));

    let listing = s.call_ok("list-directory", json!({"path": s.path("")}));
    let entries: Value = serde_json::from_str(&listing).unwrap();

    assert_eq!(
        entries,
        json!([
            {"name": "file.txt", "type": "file", "path": s.path("file.txt")},
            {"name": "sub", "type": "directory", "path": s.path("sub")},
        ])
    );
}

#[test]
fn list_directory_on_file_fails() {
    let mut s = Session::new();
    let file = s.path("plain.txt");
    s.call_ok("write-file", json!({"path": file, "content": "x"}));

    let (is_error, text) = s.call("list-directory", json!({"path": file}));
    assert!(is_error);
    assert!(text.contains("Not a directory"));
}

#[test]
fn delete_non_empty_directory_needs_recursive() {
    let mut s = Session::new();
    let dir = s.path("full");
    s.call_ok("create-directory", json!({"path": dir}));
    s.call_ok("write-file", json!({"path": s.path("full/inner.txt"), "content": "x"}));

    let (is_error, _) = s.call("delete-file", json!({"path": dir, "recursive": false}));
    assert!(is_error);
    s.call_ok("list-directory", json!({"path": dir}));

    let text = s.call_ok("delete-file", json!({"path": dir, "recursive": true}));
    assert_eq!(text, format!("Successfully deleted {dir}"));

    let (is_error, _) = s.call("list-directory", json!({"path": dir}));
    assert!(is_error, "deleted directory must no longer be listable");
}

#[test]
fn delete_single_file() {
    let mut s = Session::new();
    let file = s.path("gone.txt");
    s.call_ok("write-file", json!({"path": file, "content": "bye"}));
    s.call_ok("delete-file", json!({"path": file}));
    assert!(!Path::new(&file).exists());
}

// =============================================================================
// file-info
// =============================================================================

#[test]
fn file_info_on_fresh_file() {
    let mut s = Session::new();
    let file = s.path("sized.txt");
    let content = "exactly 23 bytes long..";
    s.call_ok("write-file", json!({"path": file, "content": content}));

    let info: Value = serde_json::from_str(&s.call_ok("file-info", json!({"path": file}))).unwrap();

    assert_eq!(info["isFile"], true);
    assert_eq!(info["isDirectory"], false);
    assert_eq!(info["size"], content.len());
    assert!(info["modified"].is_string());
    assert_eq!(info["permissions"].as_str().unwrap().len(), 3);
}

#[test]
fn file_info_on_directory() {
    let mut s = Session::new();
    let dir = s.path("d");
    s.call_ok("create-directory", json!({"path": dir}));

    let info: Value = serde_json::from_str(&s.call_ok("file-info", json!({"path": dir}))).unwrap();
    assert_eq!(info["isFile"], false);
    assert_eq!(info["isDirectory"], true);
}

#[test]
fn file_info_on_missing_path_fails() {
    let mut s = Session::new();
    let (is_error, _) = s.call("file-info", json!({"path": s.path("missing")}));
    assert!(is_error);
}

// =============================================================================
// Dispatch and sandboxing
// =============================================================================

#[test]
fn unknown_tool_returns_error_envelope_with_name() {
    let mut s = Session::new();
    let (is_error, text) = s.call("shred-disk", json!({}));
    assert!(is_error);
    assert!(text.contains("shred-disk"));
}

#[test]
fn paths_outside_root_are_denied() {
    let mut s = Session::new();
    let outside = tempfile::tempdir().unwrap();
    let target = outside.path().join("escape.txt");

    let (is_error, text) = s.call(
        "write-file",
        json!({"path": target.to_string_lossy(), "content": "x"}),
    );
    assert!(is_error);
    assert!(text.starts_with("Access denied"));
    assert!(!target.exists());

    let sneaky = format!("{}/../escape.txt", s.path(""));
    let (is_error, _) = s.call("write-file", json!({"path": sneaky, "content": "x"}));
    assert!(is_error);
}

// =============================================================================
// resources/read
// =============================================================================

#[test]
fn resource_read_returns_text_plain() {
    let mut s = Session::new();
    let file = s.path("res.txt");
    std::fs::write(&file, "resource body").unwrap();
    let uri = format!("file://{file}");

    let reply = s.request("resources/read", json!({"uri": uri}));
    let contents = &reply["result"]["contents"][0];
    assert_eq!(contents["uri"], uri);
    assert_eq!(contents["mimeType"], "text/plain");
    assert_eq!(contents["text"], "resource body");
}

#[test]
fn resource_read_rejects_other_schemes() {
    let mut s = Session::new();
    let reply = s.request("resources/read", json!({"uri": "ftp://host/file.txt"}));

    assert_eq!(reply["error"]["code"], -32602);
    assert_eq!(
        reply["error"]["message"],
        "Unsupported URI scheme: ftp://host/file.txt"
    );
}

#[test]
fn resource_read_missing_file_is_not_found() {
    let mut s = Session::new();
    let uri = format!("file://{}", s.path("absent.txt"));
    let reply = s.request("resources/read", json!({"uri": uri}));

    assert_eq!(reply["error"]["code"], -32002);
    assert!(reply["error"]["message"]
        .as_str()
        .unwrap()
        .contains("absent.txt"));
}
