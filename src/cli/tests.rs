//! Unit tests for CLI commands

use crate::cli::commands::run;
use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use clap::Parser;
use std::io::Write;

fn request_file(raw: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(raw.as_bytes()).unwrap();
    file
}

#[test]
fn test_resolve_command_parses() {
    let cli = Cli::try_parse_from(["ctrlrouter", "resolve", "--path", "/User/Register"]).unwrap();
    match cli.command {
        Commands::Resolve { path } => assert_eq!(path, "/User/Register"),
        _ => panic!("Expected Resolve command"),
    }
}

#[test]
fn test_global_config_flag() {
    let cli = Cli::try_parse_from([
        "ctrlrouter",
        "dispatch",
        "--request",
        "req.txt",
        "--config",
        "app.yaml",
    ])
    .unwrap();
    assert_eq!(cli.config.unwrap().to_string_lossy(), "app.yaml");
}

#[test]
fn test_unknown_command_fails() {
    assert!(Cli::try_parse_from(["ctrlrouter", "serve"]).is_err());
}

#[test]
fn test_resolve_output() {
    let mut out = Vec::new();
    run(
        &Commands::Resolve {
            path: "/user/register".into(),
        },
        &AppConfig::default(),
        &mut out,
    )
    .unwrap();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["type_name"], "UserController");
    assert_eq!(v["handler"], "User");
    assert_eq!(v["action"], "Register");
}

#[test]
fn test_parse_output() {
    let file = request_file("GET /a/b?x=1 HTTP/1.1\r\nHost: h\r\n\r\n");
    let mut out = Vec::new();
    run(
        &Commands::Parse {
            request: file.path().to_path_buf(),
        },
        &AppConfig::default(),
        &mut out,
    )
    .unwrap();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["path"], "/a/b");
    assert_eq!(v["query"]["x"], "1");
}

#[test]
fn test_parse_rejects_malformed_request() {
    let file = request_file("GET / HTTP/1.1\r\n\r\n");
    let result = run(
        &Commands::Parse {
            request: file.path().to_path_buf(),
        },
        &AppConfig::default(),
        &mut Vec::new(),
    );
    assert!(result.unwrap_err().to_string().contains("missing Host"));
}

#[test]
fn test_dispatch_writes_wire_response() {
    let file = request_file("GET / HTTP/1.1\r\nHost: h\r\n\r\n");
    let mut out = Vec::new();
    run(
        &Commands::Dispatch {
            request: file.path().to_path_buf(),
        },
        &AppConfig::default(),
        &mut out,
    )
    .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("Set-Cookie: CTRL_SESSION="));
}
