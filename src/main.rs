//! filesystem-mcp: MCP server exposing filesystem operations to AI assistants
//!
//! Serves the `read-file`, `write-file`, `list-directory`, `create-directory`,
//! `delete-file` and `file-info` tools, plus `file://` resources, over stdio.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use filesystem_mcp::config;
use filesystem_mcp::fs::{FileSystem, PathGuard};
use filesystem_mcp::mcp::server::McpServer;

/// MCP server exposing sandboxed filesystem operations.
///
/// Provides file read/write, directory listing and stat tools, and resolves
/// `file://` resources, confined to the allowed directories.
#[derive(Parser, Debug)]
#[command(name = "filesystem-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Allow access to this directory (repeatable; adds to the config file)
    #[arg(short, long = "allow", value_name = "DIR")]
    allow: Vec<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN,
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries protocol messages only.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Entry point for the filesystem-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting filesystem-mcp server"
    );

    let mut allowed_paths = cfg.allowed_paths.clone();
    allowed_paths.extend(args.allow);
    if allowed_paths.is_empty() {
        allowed_paths.push(PathBuf::from("."));
    }

    info!(
        allowed_paths = ?allowed_paths,
        "Allowed paths configured"
    );

    let encoding = match cfg.encoding() {
        Ok(encoding) => encoding,
        Err(e) => {
            error!(error = %e, "Invalid default encoding");
            return ExitCode::FAILURE;
        }
    };

    let fs = FileSystem::new(PathGuard::new(allowed_paths))
        .with_default_encoding(encoding)
        .with_max_read_bytes(cfg.max_read_bytes);

    let mut server = McpServer::new(fs);

    info!("MCP server ready, waiting for client connection...");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(server.run()) {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
