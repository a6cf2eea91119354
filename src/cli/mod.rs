//! # CLI Module
//!
//! Command-line access to the parser, the router and the echo application.
//!
//! ## Commands
//!
//! ### `parse`
//!
//! Parse a raw request and print it as JSON:
//!
//! ```bash
//! ctrlrouter parse --request request.txt
//! ```
//!
//! ### `resolve`
//!
//! Show which handler and action a path resolves to:
//!
//! ```bash
//! ctrlrouter resolve --path /User/Register
//! ```
//!
//! ### `dispatch`
//!
//! Run a raw request through the built-in echo application and write the
//! wire response to stdout:
//!
//! ```bash
//! ctrlrouter dispatch --request request.txt --config config.yaml
//! ```
//!
//! `--request -` reads the request from stdin.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, Cli, Commands};
