use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::dispatcher::Dispatcher;
use crate::echo::{describe_request, echo_registry};
use crate::logging::init_logging;
use crate::router::{RouteDescriptor, RouteResolver};
use crate::server::request::parse_request_bytes;

/// Command-line interface for ctrlrouter
#[derive(Parser)]
#[command(name = "ctrlrouter")]
#[command(about = "HTTP request parser and controller router", long_about = None)]
pub struct Cli {
    /// YAML configuration file (CTRL_* environment variables override it)
    #[arg(short, long, global = true, env = "CTRL_CONFIG")]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Parse a raw HTTP request and print it as JSON
    Parse {
        /// File holding the raw request, or `-` for stdin
        #[arg(short, long)]
        request: PathBuf,
    },
    /// Resolve a path to its handler and action
    Resolve {
        /// Request path (e.g. /User/Register)
        #[arg(short, long)]
        path: String,
    },
    /// Dispatch a raw HTTP request through the echo application
    Dispatch {
        /// File holding the raw request, or `-` for stdin
        #[arg(short, long)]
        request: PathBuf,
    },
}

/// Route descriptor plus the type name handed to the handler factory.
#[derive(Serialize)]
struct ResolvedRoute<'a> {
    #[serde(flatten)]
    route: &'a RouteDescriptor,
    type_name: String,
}

fn read_request(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read request from stdin")?;
        return Ok(buf);
    }
    std::fs::read(path).with_context(|| format!("Failed to read request file {}", path.display()))
}

/// Parse arguments and run the selected command.
///
/// # Errors
///
/// Returns an error for unreadable input, invalid configuration, a malformed
/// request given to `parse`, or an unresolvable path given to `resolve`.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    init_logging(&config.logging)?;
    run(&cli.command, &config, &mut io::stdout().lock())
}

pub(crate) fn run<W: Write>(command: &Commands, config: &AppConfig, out: &mut W) -> Result<()> {
    match command {
        Commands::Parse { request } => {
            let raw = read_request(request)?;
            let parsed = parse_request_bytes(&raw)?;
            serde_json::to_writer_pretty(&mut *out, &describe_request(&parsed))?;
            writeln!(out)?;
        }
        Commands::Resolve { path } => {
            let route = RouteResolver::new(&config.routing).resolve(path)?;
            let resolved = ResolvedRoute {
                type_name: config.routing.type_name(&route.handler),
                route: &route,
            };
            serde_json::to_writer_pretty(&mut *out, &resolved)?;
            writeln!(out)?;
        }
        Commands::Dispatch { request } => {
            let raw = read_request(request)?;
            let dispatcher = Dispatcher::from_config(echo_registry(), config);
            out.write_all(&dispatcher.handle_raw(&raw))?;
        }
    }
    out.flush()?;
    Ok(())
}
